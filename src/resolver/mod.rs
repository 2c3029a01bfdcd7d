//! # Workbook Structure Resolver
//!
//! Resolution runs strictly in sequence: the classification oracle is consulted first (the only
//! step that may suspend), then tables are grouped into sheets and finally laid out.
//! Oracle failures of any kind fall back to the deterministic grouping.
pub mod grouping;
pub mod oracle;
pub mod placement;

use crate::error::TablefindError;
use crate::table::TableRecord;
use crate::table::TableSummary;
use crate::workbook::UserPreferences;
use crate::workbook::WorkbookStructure;
use grouping::GroupingStrategy;
use grouping::OracleHints;
use grouping::RoundRobinGrouping;
use oracle::ClassificationOracle;
use oracle::OracleError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing::warn;

/// Default upper bound for one oracle call.
pub const DEFAULT_ORACLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Consults the oracle within `timeout`, turning every failure into `None`.
/// An empty table set never reaches the oracle.
pub async fn consult_oracle(
    oracle: &dyn ClassificationOracle,
    summaries: &[TableSummary],
    preferences: &UserPreferences,
    timeout: Duration,
) -> Option<String> {
    if summaries.is_empty() {
        return None;
    }
    let result = tokio::time::timeout(timeout, oracle.classify(summaries, preferences))
        .await
        .unwrap_or(Err(OracleError::Timeout(timeout)));
    match result {
        Ok(advice) => {
            info!(length = advice.len(), "received classification advice");
            Some(advice)
        }
        Err(OracleError::Disabled) => None,
        Err(error) => {
            warn!(%error, "falling back to default sheet grouping");
            None
        }
    }
}

/// Resolves the finalized workbook structure for `tables`.
///
/// # Arguments
/// * `tables` - Extracted tables, in input order
/// * `preferences` - User preferences, carried into the result
/// * `oracle` - Advisory service consulted for sheet naming hints
/// * `timeout` - Upper bound for the oracle call
///
/// # Errors
/// Invalid preferred sheet names and layouts exceeding the worksheet grid.
pub async fn resolve_sheets(
    tables: Vec<TableRecord>,
    preferences: UserPreferences,
    oracle: &dyn ClassificationOracle,
    timeout: Duration,
) -> Result<WorkbookStructure, TablefindError> {
    let tables = tables.into_iter().map(Arc::new).collect::<Vec<_>>();
    let summaries = tables.iter().map(|table| table.summary()).collect::<Vec<_>>();
    let advice = consult_oracle(oracle, &summaries, &preferences, timeout).await;

    let provisional = OracleHints::new(RoundRobinGrouping, advice).group(&tables, &preferences)?;
    let workbook = placement::layout(&provisional)?;
    info!(
        sheets = workbook.sheets.len(),
        tables = workbook.table_count(),
        "resolved workbook structure"
    );
    Ok(workbook)
}
