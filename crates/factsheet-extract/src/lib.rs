//! Extraction core for constituency fact sheets.
//!
//! A fact sheet carries no schema; every numeric observation is labeled purely
//! through formatting cues. This crate reconstructs those labels:
//!
//! - `runs`: locate contiguous same-colored vertical runs and the
//!   marker-colored header blocks that delimit tables and column groups.
//! - `labels`: compose run/block lookups into the table, row and column
//!   labels of one data cell.
//! - `extract`: scan a grid, enforce the layout's structural invariants and
//!   emit one [`factsheet_model::LabelRecord`] per qualifying numeric cell.
//!
//! The layout assumptions are strict on purpose: when a document deviates, the
//! document fails as a whole rather than yielding silently mislabeled data.

mod error;
mod extract;
mod labels;
mod options;
mod runs;

pub use error::ExtractError;
pub use extract::extract_records;
pub use labels::{LabelResolver, Labels};
pub use options::{ExtractOptions, MARKER_FILL};
pub use runs::{find_marker_block, find_run, ColorRun, MarkerBlock};
