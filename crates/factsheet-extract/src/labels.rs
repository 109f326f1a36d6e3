use factsheet_model::{CellCoord, CellValue, SheetGrid};

use crate::runs::{find_marker_block, find_run};
use crate::{ExtractError, ExtractOptions};

/// The three inferred labels of one data cell (the area label comes from the
/// document, not from cell position).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub table: String,
    pub row: String,
    pub column: String,
}

/// Resolves the semantic labels of numeric cells in one grid.
pub struct LabelResolver<'a> {
    grid: &'a SheetGrid,
    options: &'a ExtractOptions,
}

impl<'a> LabelResolver<'a> {
    pub fn new(grid: &'a SheetGrid, options: &'a ExtractOptions) -> Self {
        Self { grid, options }
    }

    /// Infer all labels for the data cell at `(row, col)`.
    pub fn resolve(&self, row: u32, col: u32) -> Result<Labels, ExtractError> {
        Ok(Labels {
            table: self.table_label(row, col)?,
            row: self.row_label(row, col)?,
            column: self.column_label(row, col)?,
        })
    }

    /// Row category: the bold-matched color run around the description-column
    /// anchor one row above the data cell.
    pub fn row_label(&self, row: u32, col: u32) -> Result<String, ExtractError> {
        let coord = CellCoord::new(row, col);
        let desc_col = self.options.description_column(col);
        if row < 2 {
            return Err(ExtractError::AnchorAboveGrid { coord });
        }
        let anchor_row = row - 1;

        // The anchor must look like a label cell; a number here means the
        // layout is not the one we understand.
        match self.grid.value(anchor_row, desc_col) {
            CellValue::Empty | CellValue::Text(_) => {}
            CellValue::Number(_) | CellValue::Bool(_) => {
                return Err(ExtractError::NonTextAnchor {
                    coord: CellCoord::new(anchor_row, desc_col),
                });
            }
        }
        let anchor_bold = self.grid.style(anchor_row, desc_col).bold;

        let run = find_run(self.grid, desc_col, anchor_row)?;
        let mut tokens: Vec<&str> = Vec::new();
        for r in run.rows() {
            if self.grid.style(r, desc_col).bold != anchor_bold {
                continue;
            }
            if let Some(text) = self.grid.value(r, desc_col).as_text() {
                tokens.extend(text.split_whitespace());
            }
        }

        let label = tokens.join(" ").replace('\u{2267}', ">=");
        if label.is_empty() {
            return Err(ExtractError::EmptyLabel { what: "row", coord });
        }
        Ok(label)
    }

    /// Table label: the marker block nearest above the data cell in its
    /// description column.
    pub fn table_label(&self, row: u32, col: u32) -> Result<String, ExtractError> {
        let desc_col = self.options.description_column(col);
        let block = find_marker_block(self.grid, desc_col, row, self.options.marker_fill)?;

        let parts: Vec<&str> = block
            .rows()
            .filter_map(|r| self.grid.value(r, desc_col).as_text())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect();

        let label = parts.join(" ");
        if label.is_empty() {
            return Err(ExtractError::EmptyLabel {
                what: "table",
                coord: CellCoord::new(row, col),
            });
        }
        Ok(label)
    }

    /// Column label: the marker block above the data cell in its own column,
    /// narrowed to the innermost border-delimited header sub-group, plus the
    /// number-format qualifier.
    pub fn column_label(&self, row: u32, col: u32) -> Result<String, ExtractError> {
        let block = find_marker_block(self.grid, col, row, self.options.marker_fill)?;

        let mut cells: Vec<(u32, &str)> = block
            .rows()
            .filter_map(|r| self.grid.value(r, col).as_text().map(|t| (r, t)))
            .collect();

        // Stacked header levels are separated by ruled lines. Repeatedly drop
        // everything above the first border-delimited adjacent pair until no
        // ruled line remains, keeping only the innermost sub-group.
        while cells.len() > 1 {
            let split = (1..cells.len()).find(|&i| {
                self.grid.style(cells[i - 1].0, col).border_bottom
                    || self.grid.style(cells[i].0, col).border_top
            });
            match split {
                Some(i) => {
                    cells.drain(..i);
                }
                None => break,
            }
        }

        let parts: Vec<&str> = cells
            .iter()
            .map(|(_, t)| t.trim())
            .filter(|t| !t.is_empty())
            .collect();

        let mut label = parts.join(" ");
        if label.is_empty() {
            return Err(ExtractError::EmptyLabel {
                what: "column",
                coord: CellCoord::new(row, col),
            });
        }

        let number_format = self.grid.style(row, col).number_format.as_deref();
        if number_format.is_some_and(|fmt| fmt.contains('(')) {
            label.push_str(&self.options.parenthesized_format_suffix);
        }
        Ok(label)
    }
}
