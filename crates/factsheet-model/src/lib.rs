//! `factsheet-model` defines the in-memory data structures shared by the
//! fact-sheet pipeline.
//!
//! The crate is intentionally self-contained so it can be reused by:
//! - the `.xlsx` loader (`factsheet-xlsx`)
//! - the extraction core (`factsheet-extract`)
//! - the SQLite sink and the cross-document checker
//!
//! Coordinates are 1-indexed throughout, matching the source document's own
//! row/column numbering, and a loaded grid is immutable and rectangular.

mod cell;
mod coord;
mod grid;
mod record;
mod style;
mod value;

pub use cell::Cell;
pub use coord::{col_to_name, name_to_col, A1ParseError, CellCoord};
pub use grid::{GridBuilder, GridError, SheetGrid};
pub use record::{AreaCode, AreaCodeError, LabelRecord};
pub use style::{CellStyle, Color, StyleTable};
pub use value::CellValue;
