//! # Workbook Structure
//!
//! The description of one output document: ordered sheets, each holding ordered table
//! placements. A structure is created provisionally by the grouping step (every placement
//! anchored at `A1`) and finalized by the placement engine, which returns a new value with
//! resolved anchors.
pub mod reference;

use crate::error::TablefindError;
use crate::table::StyleInfo;
use crate::table::TableRecord;
use reference::CellReference;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Maximum length of a sheet name accepted by spreadsheet applications.
pub const MAX_SHEET_NAME_LENGTH: usize = 31;

/// User preferences steering the workbook structure.
///
/// Only `preferred_sheet_names` is interpreted; every other key is carried through opaquely
/// and forwarded to the classification oracle.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub preferred_sheet_names: Vec<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Whether the placements of a structure have been laid out.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum LayoutState {
    /// Every placement is still anchored at `A1`
    #[default]
    Provisional,
    /// Placements carry their final, non-overlapping anchors
    Finalized,
}

/// A table bound to an anchor cell on a sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct TablePlacement {
    /// The placed table, shared read-only
    pub table: Arc<TableRecord>,
    /// Top-left cell (header row)
    pub start: CellReference,
    /// Bottom-right cell implied by the table dimensions
    pub end: CellReference,
}

impl TablePlacement {
    /// Anchors `table` at `start`, deriving the end cell from its dimensions.
    /// A table without any column still occupies the anchor column.
    pub fn new(table: Arc<TableRecord>, start: CellReference) -> Result<Self, TablefindError> {
        let width = table.width().max(1) as u64;
        let height = table.height() as u64;
        let end_column = u64::from(start.column) + width - 1;
        let end_row = u64::from(start.row) + height - 1;
        let end = CellReference::new(
            u32::try_from(end_column).unwrap_or(u32::MAX),
            u32::try_from(end_row).unwrap_or(u32::MAX),
        )?;
        Ok(TablePlacement { table, start, end })
    }

    /// Number of rows covered, header row included.
    pub fn height(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns covered.
    pub fn width(&self) -> u32 {
        self.end.column - self.start.column + 1
    }

    /// The covered cell range, e.g. `A6:C11`.
    pub fn range(&self) -> String {
        format!("{}:{}", self.start, self.end)
    }
}

/// A named sheet and the tables placed on it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sheet {
    pub name: String,
    pub placements: Vec<TablePlacement>,
    /// Sheet-wide default style, the weakest level of the style cascade
    pub style: Option<StyleInfo>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Sheet {
            name: name.to_owned(),
            placements: Vec::new(),
            style: None,
        }
    }
}

/// The full set of sheets and placements describing one output document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WorkbookStructure {
    pub sheets: Vec<Sheet>,
    pub preferences: UserPreferences,
    pub state: LayoutState,
}

impl WorkbookStructure {
    /// Total number of placements across all sheets.
    pub fn table_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.placements.len()).sum()
    }

    pub fn is_finalized(&self) -> bool {
        self.state == LayoutState::Finalized
    }
}

/// Key under which spreadsheet applications compare sheet names: Unicode lowercase.
pub fn sheet_name_key(name: &str) -> String {
    name.to_lowercase()
}

/// Checks a sheet name against the rules spreadsheet applications enforce.
/// Returns the violated rule, if any.
pub fn sheet_name_violation(name: &str) -> Option<&'static str> {
    if name.trim().is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_SHEET_NAME_LENGTH {
        Some("name is longer than 31 characters")
    } else if name.chars().any(char::is_control) {
        Some("name contains a control character")
    } else if name.contains(['[', ']', ':', '*', '?', '/', '\\']) {
        Some("name contains one of [ ] : * ? / \\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("name starts or ends with an apostrophe")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::tests::table;

    #[test]
    fn placement_end_cell_follows_dimensions() {
        let placement = TablePlacement::new(
            Arc::new(table("Sales", 3, 5)),
            CellReference::try_from("A6").unwrap(),
        )
        .unwrap();

        assert_eq!(placement.end.to_string(), "C11");
        assert_eq!(placement.height(), 6);
        assert_eq!(placement.width(), 3);
        assert_eq!(placement.range(), "A6:C11");
    }

    #[test]
    fn empty_table_occupies_its_anchor() {
        let placement =
            TablePlacement::new(Arc::new(TableRecord::default()), CellReference::ORIGIN).unwrap();

        assert_eq!(placement.range(), "A1:A1");
    }

    #[test]
    fn placement_beyond_last_row_is_rejected() {
        let start = CellReference::new(1, reference::MAX_ROW).unwrap();

        assert!(TablePlacement::new(Arc::new(table("Tall", 1, 1)), start).is_err());
    }

    #[test]
    fn preferences_keep_unknown_keys() {
        let preferences: UserPreferences = serde_json::from_str(
            r#"{"preferred_sheet_names": ["Financial"], "currency": "EUR"}"#,
        )
        .unwrap();

        assert_eq!(preferences.preferred_sheet_names, vec!["Financial"]);
        assert_eq!(preferences.extra["currency"], "EUR");
        assert_eq!(
            serde_json::to_value(&preferences).unwrap()["currency"],
            "EUR"
        );
    }

    #[test]
    fn validate_sheet_names() {
        assert_eq!(sheet_name_violation("Financial"), None);
        assert!(sheet_name_violation("").is_some());
        assert!(sheet_name_violation("Q1/Q2").is_some());
        assert!(sheet_name_violation("'quoted'").is_some());
        assert!(sheet_name_violation(&"x".repeat(32)).is_some());
        assert_eq!(sheet_name_violation(&"x".repeat(31)), None);
        assert!(sheet_name_violation("Fin\u{1}ance").is_some());
        assert!(sheet_name_violation("Tab\there").is_some());
        assert_eq!(sheet_name_violation("Ärger"), None);
        assert_eq!(sheet_name_key("Ärger"), sheet_name_key("äRGER"));
    }
}
