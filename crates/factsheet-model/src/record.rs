use core::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Area identifier derived once per document from its filename stem.
///
/// The stem is used verbatim; `Z34.xlsx` yields `Z34`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AreaCode(String);

#[derive(Debug, thiserror::Error)]
#[error("cannot derive an area code from path {path:?}")]
pub struct AreaCodeError {
    pub path: std::path::PathBuf,
}

impl AreaCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Derive the area code from a document path.
    pub fn from_path(path: &Path) -> Result<Self, AreaCodeError> {
        path.file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .map(|s| Self(s.to_string()))
            .ok_or_else(|| AreaCodeError {
                path: path.to_path_buf(),
            })
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AreaCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One fully labeled numeric observation.
///
/// Invariant: all four labels are non-empty and `value` is the unmodified
/// numeric content of the source cell. The sink keys records by
/// `(area, table, row, column)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelRecord {
    /// Geographic area (the document's [`AreaCode`]).
    pub area: String,
    /// Table label, e.g. `Ethnicity`.
    pub table: String,
    /// Row category label, e.g. `White`.
    pub row: String,
    /// Column category label, e.g. `Male`.
    pub column: String,
    /// The observation itself.
    pub value: f64,
}

impl LabelRecord {
    /// Whether every label field is populated.
    pub fn is_complete(&self) -> bool {
        !self.area.is_empty()
            && !self.table.is_empty()
            && !self.row.is_empty()
            && !self.column.is_empty()
    }
}
