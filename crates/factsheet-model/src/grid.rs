use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Cell, CellCoord, CellStyle, CellValue, Color, StyleTable};

/// Errors produced while assembling a [`SheetGrid`].
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("row {row} has {len} cells, expected {expected}")]
    RaggedRow { row: u32, len: usize, expected: usize },
    #[error("cell at {coord} references unknown style id {style_id}")]
    UnknownStyle { coord: CellCoord, style_id: u32 },
}

/// An immutable rectangular view of one sheet's cells.
///
/// Every row has identical length, and rows/columns are addressed by the
/// 1-based indices of the source document. Out-of-range lookups return `None`
/// rather than panicking so scan loops can probe freely.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<Cell>>,
    styles: StyleTable,
}

impl SheetGrid {
    /// Build a grid from pre-assembled rows.
    ///
    /// Fails if the rows are not rectangular or reference a style id outside
    /// `styles`; padding short rows is the loader's job, not this type's.
    pub fn from_rows(
        name: impl Into<String>,
        rows: Vec<Vec<Cell>>,
        styles: StyleTable,
    ) -> Result<Self, GridError> {
        let expected = rows.first().map(Vec::len).unwrap_or(0);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != expected {
                return Err(GridError::RaggedRow {
                    row: i as u32 + 1,
                    len: row.len(),
                    expected,
                });
            }
            for (j, cell) in row.iter().enumerate() {
                if styles.get(cell.style_id).is_none() {
                    return Err(GridError::UnknownStyle {
                        coord: CellCoord::new(i as u32 + 1, j as u32 + 1),
                        style_id: cell.style_id,
                    });
                }
            }
        }
        Ok(Self {
            name: name.into(),
            rows,
            styles,
        })
    }

    /// The sheet's name as recorded in the source document.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of rows.
    pub fn n_rows(&self) -> u32 {
        self.rows.len() as u32
    }

    /// Number of columns (identical for every row).
    pub fn n_cols(&self) -> u32 {
        self.rows.first().map(Vec::len).unwrap_or(0) as u32
    }

    /// Look up a cell by 1-based coordinates.
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        if row == 0 || col == 0 {
            return None;
        }
        self.rows
            .get(row as usize - 1)
            .and_then(|r| r.get(col as usize - 1))
    }

    /// The cell's value, or [`CellValue::Empty`] outside the grid.
    pub fn value(&self, row: u32, col: u32) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.cell(row, col).map(|c| &c.value).unwrap_or(&EMPTY)
    }

    /// Whether the cell exists and carries a value.
    pub fn has_value(&self, row: u32, col: u32) -> bool {
        self.cell(row, col).is_some_and(Cell::has_value)
    }

    /// The cell's resolved style. Out-of-grid cells report the default style.
    pub fn style(&self, row: u32, col: u32) -> &CellStyle {
        let id = self.cell(row, col).map(|c| c.style_id).unwrap_or(0);
        self.styles
            .get(id)
            .or_else(|| self.styles.get(0))
            .expect("style table always holds the default style")
    }

    /// The cell's background fill key, if any.
    pub fn fill(&self, row: u32, col: u32) -> Option<Color> {
        self.style(row, col).fill
    }

    /// The style table backing this grid.
    pub fn styles(&self) -> &StyleTable {
        &self.styles
    }

    /// Iterate all cells in row-major order (top-to-bottom, left-to-right).
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellCoord, &Cell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter().enumerate().map(move |(c, cell)| {
                (CellCoord::new(r as u32 + 1, c as u32 + 1), cell)
            })
        })
    }
}

/// Incremental constructor for [`SheetGrid`], used by the loader and by tests.
///
/// Cells may be set in any order; unset positions become empty default-styled
/// cells and every row is padded to the widest row on `finish`.
#[derive(Debug, Default)]
pub struct GridBuilder {
    name: String,
    cells: BTreeMap<(u32, u32), Cell>,
    styles: StyleTable,
    max_row: u32,
    max_col: u32,
}

impl GridBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Intern a style for later use with [`GridBuilder::set_with_style_id`].
    pub fn intern_style(&mut self, style: CellStyle) -> u32 {
        self.styles.intern(style)
    }

    /// Place a value with the default style.
    pub fn set(&mut self, row: u32, col: u32, value: impl Into<CellValue>) -> &mut Self {
        self.set_cell(row, col, Cell::new(value.into()))
    }

    /// Place a value with an explicit style, interning it on the fly.
    pub fn set_styled(
        &mut self,
        row: u32,
        col: u32,
        value: impl Into<CellValue>,
        style: CellStyle,
    ) -> &mut Self {
        let style_id = self.styles.intern(style);
        self.set_cell(row, col, Cell::with_style(value.into(), style_id))
    }

    /// Place a value referencing a style id previously returned by
    /// [`GridBuilder::intern_style`].
    pub fn set_with_style_id(
        &mut self,
        row: u32,
        col: u32,
        value: impl Into<CellValue>,
        style_id: u32,
    ) -> &mut Self {
        self.set_cell(row, col, Cell::with_style(value.into(), style_id))
    }

    /// Extend the grid's bounds without placing content, so trailing empty
    /// rows/columns survive into the finished rectangle.
    pub fn reserve(&mut self, row: u32, col: u32) -> &mut Self {
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self
    }

    fn set_cell(&mut self, row: u32, col: u32, cell: Cell) -> &mut Self {
        assert!(row > 0 && col > 0, "grid coordinates are 1-indexed");
        self.reserve(row, col);
        self.cells.insert((row, col), cell);
        self
    }

    /// Assemble the rectangular grid.
    pub fn finish(self) -> SheetGrid {
        let mut rows = Vec::with_capacity(self.max_row as usize);
        for r in 1..=self.max_row {
            let mut row = Vec::with_capacity(self.max_col as usize);
            for c in 1..=self.max_col {
                row.push(self.cells.get(&(r, c)).cloned().unwrap_or_default());
            }
            rows.push(row);
        }
        SheetGrid::from_rows(self.name, rows, self.styles)
            .expect("builder output is rectangular by construction")
    }
}
