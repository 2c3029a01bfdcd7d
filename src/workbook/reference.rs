use crate::error::TablefindError;
use regex::Regex;
use std::fmt::Display;
use thiserror::Error;

/// Largest row number of a worksheet.
pub const MAX_ROW: u32 = 1_048_576;
/// Largest column number of a worksheet (column `XFD`).
pub const MAX_COLUMN: u32 = 16_384;

/// Errors related to Excel-style cell references.
#[derive(Error, Debug)]
pub enum ReferenceError {
    #[error("Invalid cell reference format '{0}'")]
    FormatError(String),

    #[error("Cell reference '{0}' is outside of the worksheet grid")]
    OutOfBounds(String),
}

/// An Excel-style cell reference such as `A1` or `XFD1048576`.
/// Both coordinates are 1-based.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellReference {
    pub column: u32,
    pub row: u32,
}

impl CellReference {
    /// The top-left cell of a worksheet.
    pub const ORIGIN: CellReference = CellReference { column: 1, row: 1 };

    /// Creates a reference, checking it lies within the worksheet grid.
    pub fn new(column: u32, row: u32) -> Result<Self, TablefindError> {
        if column == 0 || column > MAX_COLUMN || row == 0 || row > MAX_ROW {
            Err(ReferenceError::OutOfBounds(format!("{}{}", column_name(column), row)))?
        }
        Ok(CellReference { column, row })
    }

    /// Returns the column letters of this reference (e.g. "A", "AB").
    pub fn column_name(&self) -> String {
        column_name(self.column)
    }
}

impl Display for CellReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.column_name(), self.row)
    }
}

impl TryFrom<&str> for CellReference {
    type Error = TablefindError;

    /// Parses an Excel-style cell reference (e.g., "A1", "c12"), case-insensitively.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let pattern = Regex::new(r"^([A-Z]{1,3})([1-9]\d{0,6})$").expect("Hardcode regex pattern");
        let value = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .ok_or_else(|| ReferenceError::FormatError(value.to_owned()))?;
        let column = column_number(&captures[1]);
        let row = captures[2]
            .parse::<u32>()
            .map_err(|_| ReferenceError::FormatError(value.to_owned()))?;
        CellReference::new(column, row)
    }
}

/// Converts a 1-based column number to its letters (1 = "A", 27 = "AA").
pub fn column_name(column: u32) -> String {
    let mut column = column;
    let mut name = String::new();
    while column > 0 {
        column -= 1;
        let digit = char::from_u32(65 + column % 26).expect("Hardcode letters");
        column /= 26;
        name.insert(0, digit)
    }
    name
}

/// Converts column letters to a 1-based column number ("A" = 1, "AA" = 27).
fn column_number(name: &str) -> u32 {
    name.bytes()
        .fold(0, |number, letter| number * 26 + u32::from(letter - b'A' + 1))
}
