//! SQLite-backed sink for extracted records.
//!
//! Records are keyed by the composite `(area, category, statistics,
//! qualifier)`; a duplicate key within one load indicates an extraction bug
//! and surfaces as [`StorageError::DuplicateKey`] rather than an overwrite.

mod schema;
mod sink;

pub use sink::{RecordSink, StorageError};
