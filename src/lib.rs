//! # tablefind
//!
//! Turns tables extracted from documents into a single Excel workbook.
//!
//! The library resolves the workbook structure for a set of extracted tables: how many sheets
//! exist, what they are called, which table goes on which sheet and where each table is
//! anchored. The resolved structure is then rendered into an `.xlsx` file.
//!
//! ## Pipeline
//!
//! 1. [`table::source`] loads table dumps produced by the extraction stage
//! 2. [`resolver::resolve_sheets`] consults an optional classification oracle, groups the
//!    tables into sheets and lays them out
//! 3. [`assembler::assemble`] writes the finalized structure as an Office Open XML workbook
//!
//! ## Sheet resolution
//!
//! - **Preferred names**: when the user names sheets, exactly those sheets are created and
//!   tables are distributed over them round-robin
//! - **Automatic names**: otherwise up to three sheets `Sheet1..Sheet3` are created; oracle
//!   advice may rename them but never changes the assignment
//! - **Placement**: tables of a sheet are stacked in column `A`, two blank rows apart
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use tablefind::resolver::oracle::DisabledOracle;
//! use tablefind::resolver::{resolve_sheets, DEFAULT_ORACLE_TIMEOUT};
//!
//! # async fn run() -> Result<(), tablefind::TablefindError> {
//! let tables = tablefind::table::source::load_tables(Path::new("tables.json"))?;
//! let workbook =
//!     resolve_sheets(tables, Default::default(), &DisabledOracle, DEFAULT_ORACLE_TIMEOUT).await?;
//! tablefind::assembler::assemble(&workbook, Path::new("output.xlsx"))?;
//! # Ok(())
//! # }
//! ```
pub mod assembler;
pub mod config;
pub mod error;
mod helpers;
pub mod resolver;
pub mod table;
pub mod workbook;

pub use error::TablefindError;
pub use table::TableRecord;
pub use workbook::UserPreferences;
pub use workbook::WorkbookStructure;
