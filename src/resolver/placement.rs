//! Table placement: assigns every table a non-overlapping anchor on its sheet.
//!
//! Tables of a sheet are stacked vertically in column `A`, in the order the grouping step
//! produced, separated by [`TABLE_SPACING`] blank rows. Overlap is judged on row ranges only.

use crate::error::TablefindError;
use crate::workbook::reference::CellReference;
use crate::workbook::reference::MAX_COLUMN;
use crate::workbook::reference::MAX_ROW;
use crate::workbook::LayoutState;
use crate::workbook::Sheet;
use crate::workbook::TablePlacement;
use crate::workbook::WorkbookStructure;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Blank rows left between two stacked tables.
pub const TABLE_SPACING: u32 = 2;

/// Errors raised when a layout cannot be represented on a worksheet.
#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Table '{title}' on sheet '{sheet}' would end at row {row}, past row 1048576")]
    RowLimitExceeded { sheet: String, title: String, row: u64 },

    #[error("Table '{title}' on sheet '{sheet}' is {width} columns wide, over 16384")]
    ColumnLimitExceeded { sheet: String, title: String, width: usize },
}

/// Lays out every sheet of a provisional structure and returns the finalized structure.
/// The input is left untouched.
pub fn layout(workbook: &WorkbookStructure) -> Result<WorkbookStructure, TablefindError> {
    let sheets = workbook
        .sheets
        .iter()
        .map(layout_sheet)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(WorkbookStructure {
        sheets,
        preferences: workbook.preferences.clone(),
        state: LayoutState::Finalized,
    })
}

/// Stacks the placements of one sheet, one linear pass, never reordering.
fn layout_sheet(sheet: &Sheet) -> Result<Sheet, TablefindError> {
    let mut current_row = 1u64;
    let mut placements = Vec::<TablePlacement>::with_capacity(sheet.placements.len());
    for placement in &sheet.placements {
        let table = &placement.table;
        let height = table.height() as u64;
        let end_row = current_row + height - 1;
        if end_row > u64::from(MAX_ROW) {
            Err(LayoutError::RowLimitExceeded {
                sheet: sheet.name.to_owned(),
                title: table.title.to_owned(),
                row: end_row,
            })?
        }
        if table.width() > MAX_COLUMN as usize {
            Err(LayoutError::ColumnLimitExceeded {
                sheet: sheet.name.to_owned(),
                title: table.title.to_owned(),
                width: table.width(),
            })?
        }
        let start = CellReference::new(1, current_row as u32)?;
        let placed = TablePlacement::new(Arc::clone(table), start)?;
        debug!(sheet = %sheet.name, title = %table.title, range = %placed.range(), "placed table");
        current_row += height + u64::from(TABLE_SPACING);
        placements.push(placed);
    }
    Ok(Sheet {
        name: sheet.name.to_owned(),
        placements,
        style: sheet.style.clone(),
    })
}
