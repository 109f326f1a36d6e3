use core::fmt;

use serde::{Deserialize, Serialize};

/// A reference to a single cell within a sheet.
///
/// Rows and columns are **1-indexed** to match the source document:
/// - `row = 1` is the sheet's first row
/// - `col = 1` is column `A`
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    /// 1-indexed row.
    pub row: u32,
    /// 1-indexed column.
    pub col: u32,
}

impl CellCoord {
    /// Construct a new [`CellCoord`].
    #[inline]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Convert to Excel A1 notation (e.g. `A1`, `BC32`).
    pub fn to_a1(self) -> String {
        format!("{}{}", col_to_name(self.col), self.row)
    }

    /// Parse an Excel A1-style reference (e.g. `A1`, `$B$2`).
    pub fn from_a1(a1: &str) -> Result<Self, A1ParseError> {
        let s = a1.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        // Accept optional `$` markers.
        let mut idx = 0usize;
        let bytes = s.as_bytes();
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let col_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_alphabetic() {
            idx += 1;
        }

        if idx == col_start {
            return Err(A1ParseError::MissingColumn);
        }

        let col_str = &s[col_start..idx];
        if bytes.get(idx) == Some(&b'$') {
            idx += 1;
        }

        let row_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }

        if idx == row_start {
            return Err(A1ParseError::MissingRow);
        }
        if idx != bytes.len() {
            return Err(A1ParseError::TrailingCharacters);
        }

        let col = name_to_col(col_str)?;
        let row: u32 = s[row_start..idx]
            .parse()
            .map_err(|_| A1ParseError::InvalidRow)?;
        if row == 0 {
            return Err(A1ParseError::InvalidRow);
        }

        Ok(Self { row, col })
    }
}

impl fmt::Display for CellCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1())
    }
}

/// Errors that can occur when parsing an A1 cell reference.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum A1ParseError {
    #[error("empty A1 reference")]
    Empty,
    #[error("missing column in A1 reference")]
    MissingColumn,
    #[error("missing row in A1 reference")]
    MissingRow,
    #[error("invalid column in A1 reference")]
    InvalidColumn,
    #[error("invalid row in A1 reference")]
    InvalidRow,
    #[error("trailing characters in A1 reference")]
    TrailingCharacters,
}

/// Convert a 1-based column index to its A1 letters (`1` → `A`, `28` → `AB`).
pub fn col_to_name(col: u32) -> String {
    let mut n = col;
    let mut out = Vec::<u8>::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).expect("column letters are always valid UTF-8")
}

/// Parse A1 column letters into a 1-based column index.
pub fn name_to_col(s: &str) -> Result<u32, A1ParseError> {
    let mut col: u32 = 0;
    for b in s.bytes() {
        if !b.is_ascii_alphabetic() {
            return Err(A1ParseError::InvalidColumn);
        }
        let v = (b.to_ascii_uppercase() - b'A') as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(v))
            .ok_or(A1ParseError::InvalidColumn)?;
    }
    if col == 0 {
        return Err(A1ParseError::InvalidColumn);
    }
    Ok(col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a1_roundtrip() {
        let c = CellCoord::new(1, 1);
        assert_eq!(c.to_a1(), "A1");
        assert_eq!(CellCoord::from_a1("A1").unwrap(), c);
        assert_eq!(CellCoord::from_a1("$A$1").unwrap(), c);

        let c2 = CellCoord::new(32, 55); // BC32
        assert_eq!(c2.to_a1(), "BC32");
        assert_eq!(CellCoord::from_a1("bc32").unwrap(), c2);
    }

    #[test]
    fn column_letters() {
        assert_eq!(col_to_name(3), "C");
        assert_eq!(col_to_name(8), "H");
        assert_eq!(col_to_name(14), "N");
        assert_eq!(col_to_name(27), "AA");
        assert_eq!(name_to_col("N").unwrap(), 14);
        assert_eq!(name_to_col("aa").unwrap(), 27);
    }

    #[test]
    fn rejects_malformed_references() {
        assert_eq!(CellCoord::from_a1(""), Err(A1ParseError::Empty));
        assert_eq!(CellCoord::from_a1("12"), Err(A1ParseError::MissingColumn));
        assert_eq!(CellCoord::from_a1("B"), Err(A1ParseError::MissingRow));
        assert_eq!(CellCoord::from_a1("B0"), Err(A1ParseError::InvalidRow));
        assert_eq!(
            CellCoord::from_a1("B1x"),
            Err(A1ParseError::TrailingCharacters)
        );
    }

    #[test]
    fn coords_order_row_major() {
        let mut coords = vec![
            CellCoord::new(2, 1),
            CellCoord::new(1, 3),
            CellCoord::new(1, 1),
        ];
        coords.sort();
        assert_eq!(coords[0], CellCoord::new(1, 1));
        assert_eq!(coords[1], CellCoord::new(1, 3));
        assert_eq!(coords[2], CellCoord::new(2, 1));
    }
}
