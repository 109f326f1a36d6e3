use std::collections::BTreeMap;
use std::io::{Cursor, Read, Seek};

use factsheet_model::{Cell, CellCoord, CellValue, SheetGrid, StyleTable};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::path::resolve_target;
use crate::shared_strings::parse_shared_strings_xml;
use crate::styles::CellStyles;
use crate::ReadError;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const WORKBOOK_RELS_PART: &str = "xl/_rels/workbook.xml.rels";
const REL_TYPE_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_TYPE_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";

/// A parsed workbook: every sheet name in document order and the grid of the
/// last sheet, which is the one fact sheets keep their publishable table on.
#[derive(Clone, Debug)]
pub struct LoadedWorkbook {
    pub sheet_names: Vec<String>,
    pub grid: SheetGrid,
}

/// Read a workbook from in-memory bytes.
pub fn load_from_bytes(bytes: &[u8]) -> Result<LoadedWorkbook, ReadError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let workbook_xml = read_zip_part_required(&mut archive, WORKBOOK_PART)?;
    let workbook_rels = read_zip_part_required(&mut archive, WORKBOOK_RELS_PART)?;

    let rels = parse_relationships(&workbook_rels)?;
    let sheets = parse_workbook_sheets(&workbook_xml, &rels.id_to_target)?;
    let last = sheets.last().ok_or(ReadError::NoSheets)?;

    let styles_part_name = rels
        .styles_target
        .as_deref()
        .map(|target| resolve_target(WORKBOOK_PART, target))
        .unwrap_or_else(|| "xl/styles.xml".to_string());
    let styles_bytes = read_zip_part_optional(&mut archive, &styles_part_name)?;
    let mut style_table = StyleTable::new();
    let styles = CellStyles::parse_or_default(styles_bytes.as_deref(), &mut style_table)?;

    let shared_strings_part_name = rels
        .shared_strings_target
        .as_deref()
        .map(|target| resolve_target(WORKBOOK_PART, target))
        .unwrap_or_else(|| "xl/sharedStrings.xml".to_string());
    let shared_strings = match read_zip_part_optional(&mut archive, &shared_strings_part_name)? {
        Some(bytes) => parse_shared_strings_xml(&bytes)?,
        None => Vec::new(),
    };

    let sheet_xml = read_zip_part_optional(&mut archive, &last.path)?
        .ok_or_else(|| ReadError::MissingPart(last.path.clone()))?;
    let grid = parse_worksheet(&sheet_xml, &last.name, &shared_strings, &styles, style_table)?;

    Ok(LoadedWorkbook {
        sheet_names: sheets.into_iter().map(|s| s.name).collect(),
        grid,
    })
}

fn read_zip_part_required<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, ReadError> {
    read_zip_part_optional(archive, name)?.ok_or_else(|| ReadError::MissingPart(name.to_string()))
}

fn read_zip_part_optional<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Option<Vec<u8>>, ReadError> {
    match archive.by_name(name) {
        Ok(mut file) => {
            if file.is_dir() {
                return Ok(None);
            }
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)?;
            Ok(Some(buf))
        }
        Err(zip::result::ZipError::FileNotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

struct Relationships {
    id_to_target: BTreeMap<String, String>,
    styles_target: Option<String>,
    shared_strings_target: Option<String>,
}

fn parse_relationships(bytes: &[u8]) -> Result<Relationships, ReadError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    let mut id_to_target = BTreeMap::new();
    let mut styles_target = None;
    let mut shared_strings_target = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e)
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                let mut rel_type = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    match attr.key.as_ref() {
                        b"Id" => id = Some(attr.unescape_value()?.into_owned()),
                        b"Target" => target = Some(attr.unescape_value()?.into_owned()),
                        b"Type" => rel_type = Some(attr.unescape_value()?.into_owned()),
                        _ => {}
                    }
                }
                let (Some(id), Some(target)) = (id, target) else {
                    continue;
                };
                match rel_type.as_deref() {
                    Some(REL_TYPE_STYLES) => styles_target = Some(target.clone()),
                    Some(REL_TYPE_SHARED_STRINGS) => shared_strings_target = Some(target.clone()),
                    _ => {}
                }
                id_to_target.insert(id, target);
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(Relationships {
        id_to_target,
        styles_target,
        shared_strings_target,
    })
}

struct ParsedSheet {
    name: String,
    path: String,
}

fn parse_workbook_sheets(
    workbook_xml: &[u8],
    rels: &BTreeMap<String, String>,
) -> Result<Vec<ParsedSheet>, ReadError> {
    let mut reader = Reader::from_reader(workbook_xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut sheets = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == b"sheet" => {
                let mut name = None;
                let mut r_id = None;
                for attr in e.attributes() {
                    let attr = attr?;
                    let key = attr.key.as_ref();
                    if key == b"name" {
                        name = Some(attr.unescape_value()?.into_owned());
                    } else if key == b"id" || key.ends_with(b":id") {
                        r_id = Some(attr.unescape_value()?.into_owned());
                    }
                }
                let name = name.unwrap_or_else(|| "Sheet".to_string());
                let Some(target) = r_id.as_deref().and_then(|id| rels.get(id)) else {
                    log::warn!("sheet {name:?} has no resolvable relationship target");
                    continue;
                };
                sheets.push(ParsedSheet {
                    name,
                    path: resolve_target(WORKBOOK_PART, target),
                });
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(sheets)
}

/// Attributes of a `<c>` element.
struct CellAttrs {
    coord: CellCoord,
    value_type: Option<String>,
    style_id: u32,
}

fn parse_cell_attrs(
    e: &quick_xml::events::BytesStart<'_>,
    styles: &CellStyles,
) -> Result<CellAttrs, ReadError> {
    let mut coord = None;
    let mut value_type = None;
    let mut style_id = 0u32;

    for attr in e.attributes() {
        let attr = attr?;
        match attr.key.as_ref() {
            b"r" => {
                let a1 = attr.unescape_value()?.into_owned();
                coord =
                    Some(CellCoord::from_a1(&a1).map_err(|_| ReadError::InvalidCellRef(a1))?);
            }
            b"t" => value_type = Some(attr.unescape_value()?.into_owned()),
            b"s" => {
                let xf_index = attr.unescape_value()?.into_owned().parse().unwrap_or(0);
                style_id = styles.style_id_for_xf(xf_index);
            }
            _ => {}
        }
    }

    let coord = coord.ok_or_else(|| ReadError::InvalidCellRef("<missing r>".to_string()))?;
    Ok(CellAttrs {
        coord,
        value_type,
        style_id,
    })
}

/// Resolve a committed cell's raw text into a typed value.
fn resolve_cell_value(
    coord: CellCoord,
    value_type: Option<&str>,
    value_text: Option<String>,
    inline_text: Option<String>,
    shared_strings: &[String],
) -> Result<CellValue, ReadError> {
    match value_type {
        Some("s") => {
            let raw = value_text.unwrap_or_default();
            let text = raw
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|index| shared_strings.get(index))
                .ok_or_else(|| ReadError::InvalidSharedString {
                    coord: coord.to_a1(),
                    reference: raw.clone(),
                })?;
            Ok(CellValue::Text(text.clone()))
        }
        Some("inlineStr") => Ok(match inline_text {
            Some(text) => CellValue::Text(text),
            None => CellValue::Empty,
        }),
        Some("str") => Ok(match value_text {
            Some(text) => CellValue::Text(text),
            None => CellValue::Empty,
        }),
        Some("b") => Ok(match value_text.as_deref().map(str::trim) {
            Some("1") => CellValue::Bool(true),
            Some(_) => CellValue::Bool(false),
            None => CellValue::Empty,
        }),
        // Error literals are kept as text: they must never look numeric.
        Some("e") => Ok(match value_text {
            Some(text) => CellValue::Text(text),
            None => CellValue::Empty,
        }),
        _ => match value_text {
            None => Ok(CellValue::Empty),
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Ok(CellValue::Empty);
                }
                trimmed
                    .parse::<f64>()
                    .map(CellValue::Number)
                    .map_err(|_| ReadError::InvalidNumber {
                        coord: coord.to_a1(),
                        value: raw,
                    })
            }
        },
    }
}

fn parse_worksheet(
    xml: &[u8],
    sheet_name: &str,
    shared_strings: &[String],
    styles: &CellStyles,
    style_table: StyleTable,
) -> Result<SheetGrid, ReadError> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();

    let mut grid = WorksheetCells::default();
    let mut in_sheet_data = false;
    let mut current: Option<CellAttrs> = None;
    let mut current_value_text: Option<String> = None;
    let mut current_inline_text: Option<String> = None;
    let mut in_v = false;
    let mut in_is_t = false;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = true,
            Event::End(e) if e.local_name().as_ref() == b"sheetData" => in_sheet_data = false,

            // A self-closing cell has no value but may carry formatting.
            Event::Empty(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                let attrs = parse_cell_attrs(&e, styles)?;
                grid.commit(
                    attrs.coord,
                    Cell::with_style(CellValue::Empty, attrs.style_id),
                );
            }

            Event::Start(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                current = Some(parse_cell_attrs(&e, styles)?);
                current_value_text = None;
                current_inline_text = None;
                in_v = false;
                in_is_t = false;
            }
            Event::End(e) if in_sheet_data && e.local_name().as_ref() == b"c" => {
                if let Some(attrs) = current.take() {
                    let value = resolve_cell_value(
                        attrs.coord,
                        attrs.value_type.as_deref(),
                        current_value_text.take(),
                        current_inline_text.take(),
                        shared_strings,
                    )?;
                    grid.commit(attrs.coord, Cell::with_style(value, attrs.style_id));
                }
            }

            Event::Start(e) if in_sheet_data && current.is_some() => {
                match e.local_name().as_ref() {
                    b"v" => in_v = true,
                    b"t" => in_is_t = true,
                    // Cached formula text is irrelevant here; skip the subtree
                    // so its text never bleeds into the value.
                    b"f" => {
                        reader.read_to_end_into(e.name(), &mut Vec::new())?;
                    }
                    _ => {}
                }
            }
            Event::End(e) if in_sheet_data => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"t" => in_is_t = false,
                _ => {}
            },

            Event::Text(t) if in_sheet_data && in_v => {
                let text = t.unescape()?.into_owned();
                match &mut current_value_text {
                    Some(existing) => existing.push_str(&text),
                    None => current_value_text = Some(text),
                }
            }
            Event::Text(t) if in_sheet_data && in_is_t => {
                let text = t.unescape()?.into_owned();
                match &mut current_inline_text {
                    Some(existing) => existing.push_str(&text),
                    None => current_inline_text = Some(text),
                }
            }

            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(SheetGrid::from_rows(sheet_name, grid.into_rows(), style_table)?)
}

/// Sparse cell accumulator for one worksheet, tracking the grid bounds.
#[derive(Default)]
struct WorksheetCells {
    cells: BTreeMap<(u32, u32), Cell>,
    max_row: u32,
    max_col: u32,
}

impl WorksheetCells {
    fn commit(&mut self, coord: CellCoord, cell: Cell) {
        self.max_row = self.max_row.max(coord.row);
        self.max_col = self.max_col.max(coord.col);
        self.cells.insert((coord.row, coord.col), cell);
    }

    /// Materialize the rectangle: every row padded to the widest column.
    fn into_rows(self) -> Vec<Vec<Cell>> {
        let mut rows = Vec::with_capacity(self.max_row as usize);
        for r in 1..=self.max_row {
            let mut row = Vec::with_capacity(self.max_col as usize);
            for c in 1..=self.max_col {
                row.push(self.cells.get(&(r, c)).cloned().unwrap_or_default());
            }
            rows.push(row);
        }
        rows
    }
}
