//! # Table Records
//!
//! Normalized tables as produced by the extraction stage: identity (source document, page,
//! title), header cells, data rows and optional style descriptors on every level.
//! Records are immutable once loaded and are shared between placements through `Arc`.
pub mod source;
pub mod style;

use serde::Deserialize;
use serde::Serialize;

pub use style::StyleInfo;

/// Bounding box of an element on the source page, in page coordinates.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
}

/// A header cell of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableHeader {
    pub text: String,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub style: Option<StyleInfo>,
}

/// A data cell of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    pub text: String,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub style: Option<StyleInfo>,
}

/// A data row. Rows may be wider or narrower than the header row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
    #[serde(default)]
    pub bbox: Option<BoundingBox>,
    #[serde(default)]
    pub style: Option<StyleInfo>,
}

/// An extracted table.
///
/// Identified by `(source_document, page_number, title)`; the identity is not required to be
/// unique and duplicates are carried through unchanged.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRecord {
    pub source_document: String,
    pub page_number: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub headers: Vec<TableHeader>,
    #[serde(default)]
    pub rows: Vec<TableRow>,
    #[serde(default)]
    pub style: Option<StyleInfo>,
}

impl TableRecord {
    /// Number of columns the table occupies: the widest of the header row and every data row.
    pub fn width(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.len())
            .fold(self.headers.len(), usize::max)
    }

    /// Number of rows the table occupies: one header row plus the data rows.
    pub fn height(&self) -> usize {
        1 + self.rows.len()
    }

    /// Short description of the table handed to the classification oracle.
    pub fn summary(&self) -> TableSummary {
        TableSummary {
            title: self.title.to_owned(),
            source_document: self.source_document.to_owned(),
            page_number: self.page_number,
            column_count: self.width(),
            row_count: self.rows.len(),
        }
    }
}

/// Identity and dimensions of a table, without its content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub title: String,
    pub source_document: String,
    pub page_number: u32,
    pub column_count: usize,
    pub row_count: usize,
}
