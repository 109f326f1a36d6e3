//! `styles.xml` parsing.
//!
//! XLSX stores cell formats as integer indices into `cellXfs`; each `xf`
//! record references fonts/fills/borders/numFmts by index. Worksheet cells
//! carry only the `xf` index, so this module resolves every `xf` into a
//! [`CellStyle`] once, interns it, and maps `xf` index → `style_id`. After
//! load, the grid never touches raw style indirection again.

use std::collections::HashMap;

use factsheet_model::{CellStyle, Color, StyleTable};
use quick_xml::events::attributes::AttrError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StylesError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] AttrError),
    #[error("styles.xml root is not <styleSheet>")]
    InvalidRoot,
}

/// Resolved `cellXfs` table: maps worksheet `c/@s` indices to style ids.
#[derive(Debug, Clone, Default)]
pub(crate) struct CellStyles {
    xf_style_ids: Vec<u32>,
}

#[derive(Default)]
struct FontRecord {
    bold: bool,
}

#[derive(Default)]
struct BorderRecord {
    top: bool,
    bottom: bool,
}

impl CellStyles {
    pub(crate) fn parse(bytes: &[u8], table: &mut StyleTable) -> Result<Self, StylesError> {
        let mut reader = Reader::from_reader(bytes);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        let mut saw_root = false;
        let mut in_fonts = false;
        let mut in_fills = false;
        let mut in_borders = false;
        let mut in_cell_xfs = false;
        let mut in_num_fmts = false;
        let mut in_pattern_fill = false;
        let mut pattern_type = String::new();

        let mut fonts: Vec<FontRecord> = Vec::new();
        let mut fills: Vec<Option<Color>> = Vec::new();
        let mut borders: Vec<BorderRecord> = Vec::new();
        let mut num_fmts: HashMap<u16, String> = HashMap::new();
        let mut xf_style_ids: Vec<u32> = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => {
                    match e.local_name().as_ref() {
                        b"styleSheet" => saw_root = true,
                        b"fonts" => in_fonts = true,
                        b"fills" => in_fills = true,
                        b"borders" => in_borders = true,
                        b"cellXfs" => in_cell_xfs = true,
                        b"numFmts" => in_num_fmts = true,
                        b"font" if in_fonts => fonts.push(FontRecord::default()),
                        b"b" if in_fonts => {
                            if let Some(font) = fonts.last_mut() {
                                font.bold = parse_flag_element(&e)?;
                            }
                        }
                        b"fill" if in_fills => {
                            fills.push(None);
                            pattern_type.clear();
                        }
                        b"patternFill" if in_fills => {
                            in_pattern_fill = true;
                            pattern_type = attr_string(&e, b"patternType")?.unwrap_or_default();
                        }
                        b"fgColor" if in_fills && in_pattern_fill => {
                            if pattern_type != "none" {
                                if let Some(fill) = fills.last_mut() {
                                    *fill = parse_color(&e)?;
                                }
                            }
                        }
                        b"border" if in_borders => borders.push(BorderRecord::default()),
                        b"top" if in_borders => {
                            if let Some(border) = borders.last_mut() {
                                border.top = has_border_style(&e)?;
                            }
                        }
                        b"bottom" if in_borders => {
                            if let Some(border) = borders.last_mut() {
                                border.bottom = has_border_style(&e)?;
                            }
                        }
                        b"numFmt" if in_num_fmts => {
                            let id = attr_string(&e, b"numFmtId")?.and_then(|v| v.parse::<u16>().ok());
                            let code = attr_string(&e, b"formatCode")?;
                            if let (Some(id), Some(code)) = (id, code) {
                                num_fmts.insert(id, code);
                            }
                        }
                        b"xf" if in_cell_xfs => {
                            let style =
                                parse_xf(&e, &fonts, &fills, &borders, &num_fmts)?;
                            xf_style_ids.push(table.intern(style));
                        }
                        _ => {}
                    }
                }
                Event::End(e) => match e.local_name().as_ref() {
                    b"fonts" => in_fonts = false,
                    b"fills" => in_fills = false,
                    b"borders" => in_borders = false,
                    b"cellXfs" => in_cell_xfs = false,
                    b"numFmts" => in_num_fmts = false,
                    b"patternFill" => in_pattern_fill = false,
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if !saw_root {
            return Err(StylesError::InvalidRoot);
        }

        if xf_style_ids.is_empty() {
            // Minimal fallback: at least one default xf.
            xf_style_ids.push(table.intern(CellStyle::default()));
        }

        Ok(Self { xf_style_ids })
    }

    /// Parse `styles.xml` when present; a package without one gets a single
    /// default format, which is what a blank workbook means.
    pub(crate) fn parse_or_default(
        bytes: Option<&[u8]>,
        table: &mut StyleTable,
    ) -> Result<Self, StylesError> {
        match bytes {
            Some(bytes) => Self::parse(bytes, table),
            None => Ok(Self {
                xf_style_ids: vec![table.intern(CellStyle::default())],
            }),
        }
    }

    pub(crate) fn style_id_for_xf(&self, xf_index: u32) -> u32 {
        self.xf_style_ids
            .get(xf_index as usize)
            .copied()
            .unwrap_or(0)
    }
}

fn parse_xf(
    xf: &BytesStart<'_>,
    fonts: &[FontRecord],
    fills: &[Option<Color>],
    borders: &[BorderRecord],
    num_fmts: &HashMap<u16, String>,
) -> Result<CellStyle, StylesError> {
    let font_id = attr_index(xf, b"fontId")?;
    let fill_id = attr_index(xf, b"fillId")?;
    let border_id = attr_index(xf, b"borderId")?;
    let num_fmt_id = attr_string(xf, b"numFmtId")?
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(0);

    let bold = fonts.get(font_id).map(|f| f.bold).unwrap_or(false);
    let fill = fills.get(fill_id).copied().flatten();
    let (border_top, border_bottom) = borders
        .get(border_id)
        .map(|b| (b.top, b.bottom))
        .unwrap_or((false, false));

    let number_format = if num_fmt_id == 0 {
        None
    } else if let Some(code) = num_fmts.get(&num_fmt_id) {
        Some(code.clone())
    } else if let Some(code) = builtin_number_format(num_fmt_id) {
        Some(code.to_string())
    } else {
        log::warn!("unknown numFmtId {num_fmt_id} in cellXfs");
        None
    };

    Ok(CellStyle {
        fill,
        bold,
        border_top,
        border_bottom,
        number_format,
    })
}

fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, StylesError> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn attr_index(e: &BytesStart<'_>, key: &[u8]) -> Result<usize, StylesError> {
    Ok(attr_string(e, key)?
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0))
}

/// Boolean flag elements like `<b/>` default to true; `val="0"` disables.
fn parse_flag_element(e: &BytesStart<'_>) -> Result<bool, StylesError> {
    Ok(match attr_string(e, b"val")? {
        None => true,
        Some(v) => !(v == "0" || v.eq_ignore_ascii_case("false")),
    })
}

/// A border edge counts as present when it declares any style other than none.
fn has_border_style(e: &BytesStart<'_>) -> Result<bool, StylesError> {
    Ok(matches!(attr_string(e, b"style")?, Some(s) if s != "none"))
}

fn parse_color(e: &BytesStart<'_>) -> Result<Option<Color>, StylesError> {
    if let Some(rgb) = attr_string(e, b"rgb")? {
        return Ok(Color::from_argb_hex(&rgb));
    }
    if let Some(theme) = attr_string(e, b"theme")?.and_then(|v| v.parse::<u16>().ok()) {
        let tint = attr_string(e, b"tint")?
            .and_then(|v| v.parse::<f64>().ok())
            .map(|v| (v.clamp(-1.0, 1.0) * 1000.0).round() as i16);
        return Ok(Some(Color::Theme { theme, tint }));
    }
    if let Some(indexed) = attr_string(e, b"indexed")?.and_then(|v| v.parse::<u16>().ok()) {
        return Ok(Some(Color::Indexed { indexed }));
    }
    Ok(None)
}

/// Standard SpreadsheetML built-in number formats (the subset with stable
/// codes). Ids 164+ are always custom and come from `<numFmts>`.
fn builtin_number_format(id: u16) -> Option<&'static str> {
    Some(match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}
