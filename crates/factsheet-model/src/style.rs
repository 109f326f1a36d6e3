use core::fmt;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A canonical, comparable cell color key.
///
/// Loader-specific color representations are normalized into this enum once at
/// load time so equality checks never depend on how a particular producer spelt
/// the color. ARGB values compare as plain integers; theme and indexed colors
/// keep distinct key forms and therefore never compare equal to an ARGB value.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Color {
    /// Fully resolved ARGB color.
    Argb { argb: u32 },
    /// Theme palette slot, with an optional tint in 1/1000 units.
    Theme { theme: u16, tint: Option<i16> },
    /// Legacy indexed palette color.
    Indexed { indexed: u16 },
}

impl Color {
    pub const fn new_argb(argb: u32) -> Self {
        Color::Argb { argb }
    }

    /// Parse a 6- or 8-digit hex string (optionally `#`-prefixed) into an ARGB
    /// color. 6-digit values are treated as fully opaque.
    pub fn from_argb_hex(value: &str) -> Option<Self> {
        let hex = value.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() == 8 {
            u32::from_str_radix(hex, 16).ok().map(Self::new_argb)
        } else if hex.len() == 6 {
            u32::from_str_radix(hex, 16)
                .ok()
                .map(|rgb| Self::new_argb(0xFF00_0000 | rgb))
        } else {
            None
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Argb { argb } => write!(f, "{argb:08X}"),
            Color::Theme { theme, tint: None } => write!(f, "theme:{theme}"),
            Color::Theme {
                theme,
                tint: Some(tint),
            } => write!(f, "theme:{theme}:{tint}"),
            Color::Indexed { indexed } => write!(f, "indexed:{indexed}"),
        }
    }
}

/// Formatting attributes of a single cell, resolved once at load time.
///
/// Only the attributes the labeling algorithm reads are modeled: background
/// fill, font weight, top/bottom border presence and the number format string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct CellStyle {
    /// Background fill key, if the cell has a pattern fill with a foreground
    /// color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub border_top: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub border_bottom: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_format: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Deduplicated table of cell styles.
///
/// Cells store a `style_id` referencing this table. Style `0` is always the
/// default (empty) style.
#[derive(Clone, Debug, Serialize)]
pub struct StyleTable {
    pub styles: Vec<CellStyle>,
    #[serde(skip)]
    index: HashMap<CellStyle, u32>,
}

impl Default for StyleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleTable {
    pub fn new() -> Self {
        let mut table = Self {
            styles: vec![CellStyle::default()],
            index: HashMap::new(),
        };
        table.rebuild_index();
        table
    }

    /// Insert (or reuse) a style, returning its ID.
    pub fn intern(&mut self, style: CellStyle) -> u32 {
        if let Some(id) = self.index.get(&style) {
            return *id;
        }
        let id = self.styles.len() as u32;
        self.styles.push(style.clone());
        self.index.insert(style, id);
        id
    }

    /// Get a style by id.
    pub fn get(&self, style_id: u32) -> Option<&CellStyle> {
        self.styles.get(style_id as usize)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    fn rebuild_index(&mut self) {
        self.index.clear();
        for (i, style) in self.styles.iter().cloned().enumerate() {
            self.index.insert(style, i as u32);
        }
    }
}

impl<'de> Deserialize<'de> for StyleTable {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            styles: Vec<CellStyle>,
        }

        let mut helper = Helper::deserialize(deserializer)?;
        if helper.styles.is_empty() {
            helper.styles.push(CellStyle::default());
        }

        let mut table = StyleTable {
            styles: helper.styles,
            index: HashMap::new(),
        };
        table.rebuild_index();
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn argb_hex_parsing() {
        assert_eq!(
            Color::from_argb_hex("FFCCFFCC"),
            Some(Color::new_argb(0xFFCCFFCC))
        );
        assert_eq!(
            Color::from_argb_hex("#ccffcc"),
            Some(Color::new_argb(0xFFCCFFCC))
        );
        assert_eq!(Color::from_argb_hex("nope"), None);
    }

    #[test]
    fn canonical_keys_are_distinct() {
        let argb = Color::new_argb(0xFFCCFFCC);
        let theme = Color::Theme {
            theme: 4,
            tint: Some(-250),
        };
        let indexed = Color::Indexed { indexed: 64 };
        assert_ne!(argb, theme);
        assert_ne!(argb, indexed);
        assert_eq!(argb.to_string(), "FFCCFFCC");
        assert_eq!(theme.to_string(), "theme:4:-250");
        assert_eq!(indexed.to_string(), "indexed:64");
    }

    #[test]
    fn style_table_interns_duplicates() {
        let mut table = StyleTable::new();
        let bold = CellStyle {
            bold: true,
            ..CellStyle::default()
        };
        let a = table.intern(bold.clone());
        let b = table.intern(bold);
        assert_eq!(a, b);
        assert_eq!(table.len(), 2);
        assert_eq!(table.intern(CellStyle::default()), 0);
    }
}
