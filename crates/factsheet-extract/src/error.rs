use factsheet_model::CellCoord;

/// Structural failures that abort extraction for the current document.
///
/// Each variant marks a violated layout assumption. Continuing past any of
/// them would emit records with meaningless labels, so there is deliberately
/// no best-effort mode: the caller decides whether to skip the document or
/// halt the run. Benign situations (a valueless cell probed by a color
/// predicate) are not errors and never reach this type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    /// Numeric data may never appear in the grid's final row.
    #[error("numeric data in the final row at {coord}")]
    NumericInLastRow { coord: CellCoord },

    /// Numeric data outside the permitted data columns.
    #[error("numeric data in unexpected column at {coord}")]
    ForbiddenColumn { coord: CellCoord },

    /// The description-column anchor cell must hold text or nothing.
    #[error("expected text or empty cell in description anchor at {coord}")]
    NonTextAnchor { coord: CellCoord },

    /// The data cell sits too close to the top of the grid to have an anchor.
    #[error("description anchor above the grid for data at {coord}")]
    AnchorAboveGrid { coord: CellCoord },

    /// No row above the anchor has a value and a different fill, so the run's
    /// upper boundary is undefined.
    #[error("unterminated color run above row {row} in column {col}")]
    RunStartNotFound { row: u32, col: u32 },

    /// No row below the anchor fails the fill predicate, so the run's lower
    /// boundary is undefined.
    #[error("unterminated color run below row {row} in column {col}")]
    RunEndNotFound { row: u32, col: u32 },

    /// No usable marker block exists above the target row.
    #[error("no marker block above row {row} in column {col}")]
    MarkerBlockNotFound { row: u32, col: u32 },

    /// A label came out empty, which would violate the record invariant.
    #[error("empty {what} label for data at {coord}")]
    EmptyLabel {
        what: &'static str,
        coord: CellCoord,
    },
}
