//! Sheet grouping: partitions tables into named sheets.
//!
//! The default strategy is a deterministic round-robin over a bounded number of sheets.
//! Oracle advice enters only through the [`OracleHints`] decorator, which may rename
//! automatically named sheets but never changes how many sheets exist or which table goes where.

use crate::error::TablefindError;
use crate::table::TableRecord;
use crate::workbook::reference::CellReference;
use crate::workbook::sheet_name_key;
use crate::workbook::sheet_name_violation;
use crate::workbook::LayoutState;
use crate::workbook::Sheet;
use crate::workbook::TablePlacement;
use crate::workbook::UserPreferences;
use crate::workbook::WorkbookStructure;
use regex::Regex;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Upper bound on the number of automatically created sheets.
pub const MAX_AUTOMATIC_SHEETS: usize = 3;

/// Errors related to sheet grouping.
#[derive(Error, Debug)]
pub enum GroupingError {
    #[error("Invalid sheet name '{name}': {reason}")]
    InvalidSheetName { name: String, reason: &'static str },

    #[error("Duplicate sheet name '{0}'")]
    DuplicateSheetName(String),
}

/// Strategy turning tables and preferences into a provisional workbook structure.
pub trait GroupingStrategy {
    /// Partitions `tables` into sheets. Every placement of the result is anchored at `A1`.
    fn group(
        &self,
        tables: &[Arc<TableRecord>],
        preferences: &UserPreferences,
    ) -> Result<WorkbookStructure, TablefindError>;
}

/// Deterministic default grouping.
///
/// 1. Preferred sheet names, when given, fix the sheets (names verbatim, in order).
/// 2. Otherwise `min(table count, 3)` sheets named `Sheet1`, `Sheet2`, ...
/// 3. Table `i` goes to sheet `i mod sheet count`, keeping relative order within a sheet.
#[derive(Debug, Default, Clone, Copy)]
pub struct RoundRobinGrouping;

impl RoundRobinGrouping {
    /// Sheet names dictated by the preferences, or the automatic ones.
    fn sheet_names(
        table_count: usize,
        preferences: &UserPreferences,
    ) -> Result<Vec<String>, TablefindError> {
        if preferences.preferred_sheet_names.is_empty() {
            let count = table_count.min(MAX_AUTOMATIC_SHEETS);
            return Ok((1..=count).map(|index| format!("Sheet{}", index)).collect());
        }
        let mut seen = HashSet::<String>::new();
        for name in &preferences.preferred_sheet_names {
            if let Some(reason) = sheet_name_violation(name) {
                Err(GroupingError::InvalidSheetName {
                    name: name.to_owned(),
                    reason,
                })?
            }
            if !seen.insert(sheet_name_key(name)) {
                Err(GroupingError::DuplicateSheetName(name.to_owned()))?
            }
        }
        Ok(preferences.preferred_sheet_names.clone())
    }
}

impl GroupingStrategy for RoundRobinGrouping {
    fn group(
        &self,
        tables: &[Arc<TableRecord>],
        preferences: &UserPreferences,
    ) -> Result<WorkbookStructure, TablefindError> {
        let mut sheets = Self::sheet_names(tables.len(), preferences)?
            .iter()
            .map(|name| Sheet::new(name))
            .collect::<Vec<_>>();
        if !sheets.is_empty() {
            let count = sheets.len();
            for (index, table) in tables.iter().enumerate() {
                let sheet = &mut sheets[index % count];
                debug!(title = %table.title, sheet = %sheet.name, "assigned table");
                sheet
                    .placements
                    .push(TablePlacement::new(Arc::clone(table), CellReference::ORIGIN)?);
            }
        }
        Ok(WorkbookStructure {
            sheets,
            preferences: preferences.clone(),
            state: LayoutState::Provisional,
        })
    }
}

/// Decorator applying oracle naming hints on top of another strategy.
///
/// Hints are `Sheet: <name>` lines of the advice, applied in order to the sheets of the inner
/// result. They are ignored entirely when the user chose sheet names, and individually when a
/// name is invalid or collides with another sheet.
pub struct OracleHints<S: GroupingStrategy> {
    inner: S,
    advice: Option<String>,
}

impl<S: GroupingStrategy> OracleHints<S> {
    pub fn new(inner: S, advice: Option<String>) -> Self {
        OracleHints { inner, advice }
    }

    /// Extracts suggested sheet names from free-form advice, in order of appearance.
    pub fn suggested_names(advice: &str) -> Vec<String> {
        let pattern = Regex::new(
            r"(?im)^[\s>*#-]*(?:\d+[.)]\s*)?\**sheet(?:\s*\d+)?\s*(?:name)?\**\s*:\s*(.+?)\s*$",
        )
        .expect("Hardcode regex pattern");
        pattern
            .captures_iter(advice)
            .map(|captures| {
                captures[1]
                    .trim_matches(|character: char| matches!(character, '"' | '`' | '*'))
                    .trim()
                    .to_owned()
            })
            .filter(|name| sheet_name_violation(name).is_none())
            .collect()
    }
}

impl<S: GroupingStrategy> GroupingStrategy for OracleHints<S> {
    fn group(
        &self,
        tables: &[Arc<TableRecord>],
        preferences: &UserPreferences,
    ) -> Result<WorkbookStructure, TablefindError> {
        let mut workbook = self.inner.group(tables, preferences)?;
        let advice = match &self.advice {
            Some(advice) if preferences.preferred_sheet_names.is_empty() => advice,
            _ => return Ok(workbook),
        };

        for (index, name) in Self::suggested_names(advice)
            .into_iter()
            .take(workbook.sheets.len())
            .enumerate()
        {
            let key = sheet_name_key(&name);
            let taken = workbook
                .sheets
                .iter()
                .enumerate()
                .any(|(other, sheet)| other != index && sheet_name_key(&sheet.name) == key);
            if taken {
                debug!(%name, "ignored colliding sheet name hint");
                continue;
            }
            debug!(
                from = %workbook.sheets[index].name,
                to = %name,
                "renamed sheet from oracle hint"
            );
            workbook.sheets[index].name = name;
        }
        Ok(workbook)
    }
}
