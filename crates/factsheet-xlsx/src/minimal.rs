//! Minimal XLSX writer for test fixtures.
//!
//! This is a targeted serializer: it produces just enough of a SpreadsheetML
//! package (workbook, relationships, styles, shared strings, worksheets) to
//! exercise the loader and everything downstream of it, without binary
//! fixtures checked into the repository. It is not a general-purpose writer.

use std::collections::BTreeMap;
use std::io::{Cursor, Write};

use quick_xml::escape::escape;
use thiserror::Error;
use zip::write::SimpleFileOptions;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One style slot referenced by [`FixtureCell::style`].
#[derive(Clone, Debug, Default)]
pub struct FixtureStyle {
    /// 8-digit ARGB hex, e.g. `FFCCFFCC`.
    pub fill: Option<String>,
    pub bold: bool,
    pub border_top: bool,
    pub border_bottom: bool,
    pub number_format: Option<String>,
}

impl FixtureStyle {
    pub fn filled(argb: &str) -> Self {
        Self {
            fill: Some(argb.to_string()),
            ..Self::default()
        }
    }

    pub fn bold_filled(argb: &str) -> Self {
        Self {
            fill: Some(argb.to_string()),
            bold: true,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug)]
pub enum FixtureValue {
    Text(String),
    Number(f64),
    Empty,
}

#[derive(Clone, Debug)]
pub struct FixtureCell {
    pub row: u32,
    pub col: u32,
    pub value: FixtureValue,
    /// Index into the style slice passed to [`write_fixture_xlsx`].
    pub style: Option<usize>,
}

/// One worksheet's content.
#[derive(Clone, Debug)]
pub struct FixtureSheet {
    pub name: String,
    pub cells: Vec<FixtureCell>,
}

impl FixtureSheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: Vec::new(),
        }
    }

    pub fn text(&mut self, row: u32, col: u32, text: impl Into<String>) -> &mut Self {
        self.cell(row, col, FixtureValue::Text(text.into()), None)
    }

    pub fn number(&mut self, row: u32, col: u32, value: f64) -> &mut Self {
        self.cell(row, col, FixtureValue::Number(value), None)
    }

    pub fn styled_text(
        &mut self,
        row: u32,
        col: u32,
        text: impl Into<String>,
        style: usize,
    ) -> &mut Self {
        self.cell(row, col, FixtureValue::Text(text.into()), Some(style))
    }

    pub fn styled_number(&mut self, row: u32, col: u32, value: f64, style: usize) -> &mut Self {
        self.cell(row, col, FixtureValue::Number(value), Some(style))
    }

    /// A valueless cell that still carries formatting.
    pub fn styled_blank(&mut self, row: u32, col: u32, style: usize) -> &mut Self {
        self.cell(row, col, FixtureValue::Empty, Some(style))
    }

    fn cell(
        &mut self,
        row: u32,
        col: u32,
        value: FixtureValue,
        style: Option<usize>,
    ) -> &mut Self {
        self.cells.push(FixtureCell {
            row,
            col,
            value,
            style,
        });
        self
    }
}

/// Assemble a complete XLSX package.
///
/// Style indices in cells refer to `styles`; the writer prepends the default
/// format, so fixture index `i` becomes `cellXfs` entry `i + 1`.
pub fn write_fixture_xlsx(
    sheets: &[FixtureSheet],
    styles: &[FixtureStyle],
) -> Result<Vec<u8>, FixtureError> {
    let mut shared: Vec<String> = Vec::new();
    let mut shared_index: BTreeMap<String, usize> = BTreeMap::new();
    for sheet in sheets {
        for cell in &sheet.cells {
            if let FixtureValue::Text(text) = &cell.value {
                if !shared_index.contains_key(text) {
                    shared_index.insert(text.clone(), shared.len());
                    shared.push(text.clone());
                }
            }
        }
    }

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(sheets.len()).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(root_rels_xml().as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook_xml(sheets).as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(workbook_rels_xml(sheets.len()).as_bytes())?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(styles_xml(styles).as_bytes())?;

        zip.start_file("xl/sharedStrings.xml", options)?;
        zip.write_all(shared_strings_xml(&shared).as_bytes())?;

        for (idx, sheet) in sheets.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", idx + 1), options)?;
            zip.write_all(worksheet_xml(sheet, &shared_index).as_bytes())?;
        }

        zip.finish()?;
    }
    Ok(buffer.into_inner())
}

fn content_types_xml(sheet_count: usize) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>
  <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>
"#,
    );
    for i in 1..=sheet_count {
        out.push_str(&format!(
            "  <Override PartName=\"/xl/worksheets/sheet{i}.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>\n"
        ));
    }
    out.push_str("</Types>\n");
    out
}

fn root_rels_xml() -> String {
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>
"#
    .to_owned()
}

fn workbook_xml(sheets: &[FixtureSheet]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"
          xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
"#,
    );
    for (idx, sheet) in sheets.iter().enumerate() {
        let n = idx + 1;
        out.push_str(&format!(
            "    <sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>\n",
            escape(sheet.name.as_str())
        ));
    }
    out.push_str("  </sheets>\n</workbook>\n");
    out
}

fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
"#,
    );
    for i in 1..=sheet_count {
        out.push_str(&format!(
            "  <Relationship Id=\"rId{i}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet{i}.xml\"/>\n"
        ));
    }
    out.push_str(&format!(
        "  <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\n",
        sheet_count + 1
    ));
    out.push_str(&format!(
        "  <Relationship Id=\"rId{}\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings\" Target=\"sharedStrings.xml\"/>\n",
        sheet_count + 2
    ));
    out.push_str("</Relationships>\n");
    out
}

fn styles_xml(styles: &[FixtureStyle]) -> String {
    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
"#,
    );

    // Custom number formats: one id per style that declares a format.
    let num_fmt_ids: Vec<Option<u16>> = {
        let mut next = 164u16;
        styles
            .iter()
            .map(|s| {
                s.number_format.as_ref().map(|_| {
                    let id = next;
                    next += 1;
                    id
                })
            })
            .collect()
    };
    let custom: Vec<(u16, &str)> = styles
        .iter()
        .zip(&num_fmt_ids)
        .filter_map(|(s, id)| Some(((*id)?, s.number_format.as_deref()?)))
        .collect();
    if !custom.is_empty() {
        out.push_str(&format!("  <numFmts count=\"{}\">\n", custom.len()));
        for (id, code) in &custom {
            out.push_str(&format!(
                "    <numFmt numFmtId=\"{id}\" formatCode=\"{}\"/>\n",
                escape(*code)
            ));
        }
        out.push_str("  </numFmts>\n");
    }

    // Fonts: default plus one per style.
    out.push_str(&format!("  <fonts count=\"{}\">\n", styles.len() + 1));
    out.push_str("    <font><sz val=\"11\"/><name val=\"Calibri\"/></font>\n");
    for style in styles {
        if style.bold {
            out.push_str("    <font><b/><sz val=\"11\"/><name val=\"Calibri\"/></font>\n");
        } else {
            out.push_str("    <font><sz val=\"11\"/><name val=\"Calibri\"/></font>\n");
        }
    }
    out.push_str("  </fonts>\n");

    // Fills: the two mandatory defaults plus one per style.
    out.push_str(&format!("  <fills count=\"{}\">\n", styles.len() + 2));
    out.push_str("    <fill><patternFill patternType=\"none\"/></fill>\n");
    out.push_str("    <fill><patternFill patternType=\"gray125\"/></fill>\n");
    for style in styles {
        match &style.fill {
            Some(argb) => out.push_str(&format!(
                "    <fill><patternFill patternType=\"solid\"><fgColor rgb=\"{argb}\"/><bgColor indexed=\"64\"/></patternFill></fill>\n"
            )),
            None => out.push_str("    <fill><patternFill patternType=\"none\"/></fill>\n"),
        }
    }
    out.push_str("  </fills>\n");

    // Borders: default plus one per style.
    out.push_str(&format!("  <borders count=\"{}\">\n", styles.len() + 1));
    out.push_str("    <border><left/><right/><top/><bottom/><diagonal/></border>\n");
    for style in styles {
        let top = if style.border_top {
            "<top style=\"thin\"/>"
        } else {
            "<top/>"
        };
        let bottom = if style.border_bottom {
            "<bottom style=\"thin\"/>"
        } else {
            "<bottom/>"
        };
        out.push_str(&format!(
            "    <border><left/><right/>{top}{bottom}<diagonal/></border>\n"
        ));
    }
    out.push_str("  </borders>\n");

    out.push_str(
        "  <cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>\n",
    );

    // cellXfs: default entry, then fixture style i at xf index i + 1.
    out.push_str(&format!("  <cellXfs count=\"{}\">\n", styles.len() + 1));
    out.push_str("    <xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/>\n");
    for (i, style) in styles.iter().enumerate() {
        let num_fmt_id = num_fmt_ids[i].unwrap_or(0);
        let font_id = i + 1;
        let fill_id = if style.fill.is_some() { i + 2 } else { 0 };
        let border_id = i + 1;
        out.push_str(&format!(
            "    <xf numFmtId=\"{num_fmt_id}\" fontId=\"{font_id}\" fillId=\"{fill_id}\" borderId=\"{border_id}\" xfId=\"0\"/>\n"
        ));
    }
    out.push_str("  </cellXfs>\n");

    out.push_str(
        "  <cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>\n",
    );
    out.push_str("</styleSheet>\n");
    out
}

fn shared_strings_xml(shared: &[String]) -> String {
    let mut out = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{0}\" uniqueCount=\"{0}\">\n",
        shared.len()
    );
    for text in shared {
        out.push_str(&format!(
            "  <si><t xml:space=\"preserve\">{}</t></si>\n",
            escape(text.as_str())
        ));
    }
    out.push_str("</sst>\n");
    out
}

fn worksheet_xml(sheet: &FixtureSheet, shared_index: &BTreeMap<String, usize>) -> String {
    let mut by_row: BTreeMap<u32, Vec<&FixtureCell>> = BTreeMap::new();
    for cell in &sheet.cells {
        by_row.entry(cell.row).or_default().push(cell);
    }

    let mut out = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
"#,
    );
    for (row, mut cells) in by_row {
        cells.sort_by_key(|c| c.col);
        out.push_str(&format!("    <row r=\"{row}\">\n"));
        for cell in cells {
            let a1 = factsheet_model::CellCoord::new(cell.row, cell.col).to_a1();
            let s_attr = match cell.style {
                Some(idx) => format!(" s=\"{}\"", idx + 1),
                None => String::new(),
            };
            match &cell.value {
                FixtureValue::Text(text) => {
                    let index = shared_index[text];
                    out.push_str(&format!(
                        "      <c r=\"{a1}\"{s_attr} t=\"s\"><v>{index}</v></c>\n"
                    ));
                }
                FixtureValue::Number(value) => {
                    out.push_str(&format!("      <c r=\"{a1}\"{s_attr}><v>{value}</v></c>\n"));
                }
                FixtureValue::Empty => {
                    out.push_str(&format!("      <c r=\"{a1}\"{s_attr}/>\n"));
                }
            }
        }
        out.push_str("    </row>\n");
    }
    out.push_str("  </sheetData>\n</worksheet>\n");
    out
}
