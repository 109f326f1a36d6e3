//! XLSX import for fact-sheet documents.
//!
//! Only the parts the extraction pipeline needs are read: workbook metadata
//! (to pick the **last** sheet by position), `styles.xml` (resolved into
//! per-cell [`factsheet_model::CellStyle`] values), shared strings, and the
//! selected worksheet itself, which is materialized as a rectangular
//! [`factsheet_model::SheetGrid`].
//!
//! Document conventions (sheet count, sheet naming) are deliberately *not*
//! validated here; that is the checker's job.

pub mod minimal;
mod path;
mod read;
mod shared_strings;
mod styles;

use std::fs::File;
use std::io::Read as _;
use std::path::Path;

use factsheet_model::{AreaCode, AreaCodeError, GridError, SheetGrid};
use quick_xml::events::attributes::AttrError;
use thiserror::Error;

pub use read::{load_from_bytes, LoadedWorkbook};
pub use shared_strings::SharedStringsError;
pub use styles::StylesError;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("xml attribute error: {0}")]
    XmlAttr(#[from] AttrError),
    #[error("utf-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("sharedStrings.xml parse error: {0}")]
    SharedStrings(#[from] SharedStringsError),
    #[error(transparent)]
    Styles(#[from] StylesError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    AreaCode(#[from] AreaCodeError),
    #[error("missing required part: {0}")]
    MissingPart(String),
    #[error("invalid cell reference: {0}")]
    InvalidCellRef(String),
    #[error("invalid numeric value {value:?} at {coord}")]
    InvalidNumber { coord: String, value: String },
    #[error("invalid shared string reference {reference:?} at {coord}")]
    InvalidSharedString { coord: String, reference: String },
    #[error("workbook has no sheets")]
    NoSheets,
}

/// A loaded fact-sheet document: the area code derived from the filename stem,
/// the ordered sheet names, and the last sheet's grid.
#[derive(Clone, Debug)]
pub struct Document {
    pub area: AreaCode,
    pub sheet_names: Vec<String>,
    pub grid: SheetGrid,
}

/// Load a document from disk.
///
/// The filename stem becomes the document's [`AreaCode`] verbatim.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Document, ReadError> {
    let path = path.as_ref();
    let area = AreaCode::from_path(path)?;
    let mut file = File::open(path)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes)?;

    let workbook = load_from_bytes(&bytes)?;
    Ok(Document {
        area,
        sheet_names: workbook.sheet_names,
        grid: workbook.grid,
    })
}
