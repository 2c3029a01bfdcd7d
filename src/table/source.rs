//! Loading of extracted tables.
//!
//! Extraction itself happens upstream; this module reads the JSON or YAML dumps it produces.

use crate::error::ResultMessage;
use crate::error::TablefindError;
use crate::table::TableRecord;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Errors related to table input files.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Unsupported input format '{0}', expected a .json, .yaml or .yml table dump")]
    UnsupportedFormat(String),

    #[error("Input pattern '{0}' matches no file")]
    NoMatchingInput(String),
}

/// A dump contains either a single table or a list of tables.
#[derive(Deserialize)]
#[serde(untagged)]
enum TableDump {
    Many(Vec<TableRecord>),
    One(Box<TableRecord>),
}

impl From<TableDump> for Vec<TableRecord> {
    fn from(dump: TableDump) -> Self {
        match dump {
            TableDump::Many(tables) => tables,
            TableDump::One(table) => vec![*table],
        }
    }
}

/// Loads every table stored in an extraction dump, preserving their order.
pub fn load_tables(path: &Path) -> Result<Vec<TableRecord>, TablefindError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.to_ascii_lowercase());
    let read = || -> Result<Vec<TableRecord>, TablefindError> {
        let yaml = match extension.as_deref() {
            Some("json") => false,
            Some("yaml") | Some("yml") => true,
            _ => Err(SourceError::UnsupportedFormat(path.display().to_string()))?,
        };
        let reader = BufReader::new(File::open(path)?);
        let dump: TableDump = if yaml {
            serde_yaml::from_reader(reader)?
        } else {
            serde_json::from_reader(reader)?
        };
        Ok(dump.into())
    };
    let tables = read().with_prefix(&format!("Load tables from '{}'", path.display()))?;
    debug!(path = %path.display(), count = tables.len(), "loaded tables");
    Ok(tables)
}

/// Expands glob patterns into input paths. Arguments without glob metacharacters are kept as
/// they are, so a missing literal file is reported when it is opened.
pub fn expand_inputs<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>, TablefindError> {
    let mut paths = Vec::<PathBuf>::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !pattern.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(pattern));
            continue;
        }
        let mut matched = glob::glob(pattern)?
            .filter_map(|entry| entry.ok())
            .collect::<Vec<_>>();
        if matched.is_empty() {
            Err(SourceError::NoMatchingInput(pattern.to_owned()))?;
        }
        matched.sort();
        paths.append(&mut matched);
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_single_json_table() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("table.json");
        fs::write(
            &path,
            r#"{"source_document": "a.pdf", "page_number": 1, "title": "Sales Data"}"#,
        )
        .unwrap();

        let tables = load_tables(&path).unwrap();

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].title, "Sales Data");
        assert!(tables[0].headers.is_empty());
    }

    #[test]
    fn load_yaml_table_list_in_order() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("tables.yml");
        fs::write(
            &path,
            "- source_document: a.pdf\n  page_number: 1\n  title: First\n\
             - source_document: a.pdf\n  page_number: 2\n  title: Second\n  \
             headers:\n    - text: Name\n  rows:\n    - cells:\n        - text: Ada\n",
        )
        .unwrap();

        let tables = load_tables(&path).unwrap();

        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].title, "First");
        assert_eq!(tables[1].rows[0].cells[0].text, "Ada");
    }

    #[test]
    fn reject_unknown_extension() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("scan.pdf");
        fs::write(&path, b"%PDF-1.7").unwrap();

        let error = load_tables(&path).unwrap_err();

        assert!(error.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn unknown_extension_is_reported_before_opening() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("scan.pdf");

        let error = load_tables(&path).unwrap_err();

        assert!(!path.exists());
        assert!(error.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn expand_glob_patterns() {
        let directory = tempfile::tempdir().unwrap();
        fs::write(directory.path().join("b.json"), "[]").unwrap();
        fs::write(directory.path().join("a.json"), "[]").unwrap();
        let pattern = directory.path().join("*.json").display().to_string();

        let paths = expand_inputs(&[pattern.as_str(), "literal.json"]).unwrap();

        assert_eq!(paths.len(), 3);
        assert!(paths[0].ends_with("a.json"));
        assert!(paths[1].ends_with("b.json"));
        assert_eq!(paths[2], PathBuf::from("literal.json"));
    }

    #[test]
    fn empty_glob_is_an_error() {
        let directory = tempfile::tempdir().unwrap();
        let pattern = directory.path().join("*.yaml").display().to_string();

        assert!(matches!(
            expand_inputs(&[pattern]),
            Err(TablefindError::SourceError(SourceError::NoMatchingInput(_)))
        ));
    }
}
