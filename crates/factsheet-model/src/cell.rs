use serde::{Deserialize, Serialize};

use crate::CellValue;

/// A single cell record: content plus a reference into the grid's style table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The cell's literal value.
    #[serde(default)]
    pub value: CellValue,

    /// Index into the grid style table.
    #[serde(default)]
    pub style_id: u32,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            value: CellValue::Empty,
            style_id: 0,
        }
    }
}

impl Cell {
    /// Create a new cell with the given value and the default style.
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    /// Create a new cell with the given value and style id.
    pub fn with_style(value: CellValue, style_id: u32) -> Self {
        Self { value, style_id }
    }

    /// Returns true if the cell carries any content.
    ///
    /// A cell may be valueless and still carry formatting; color predicates
    /// must treat such cells as "not matching", which is why this check exists
    /// separately from the style.
    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}
