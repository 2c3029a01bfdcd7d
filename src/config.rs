//! # Configuration
//!
//! The YAML configuration (`tablefind.yaml` by default) describes what the extraction stage
//! looks for, and optionally how to reach the classification oracle and which preferences
//! to apply to the workbook. It is loaded and validated before any resolution work starts.

use crate::error::ResultMessage;
use crate::error::TablefindError;
use crate::resolver::DEFAULT_ORACLE_TIMEOUT;
use crate::workbook::UserPreferences;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors related to the configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid configuration value '{name}': {message}")]
    InvalidValue { name: String, message: String },
}

/// Kind of value a configured field holds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Date,
    Currency,
    List,
    Text,
    Table,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "type")]
    pub kind: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub format: Option<String>,
    pub hints: Vec<String>,
}

/// Which metadata is attached to extracted tables.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TableMetadata {
    pub extract_extra_keys: bool,
    pub include_filename: bool,
    pub include_page_number: bool,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TableConfig {
    pub name: String,
    pub description: String,
    pub metadata: TableMetadata,
    pub fields: BTreeMap<String, FieldConfig>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GenericExtractionMetadata {
    #[serde(flatten)]
    pub table: TableMetadata,
    /// Maximum number of fields extracted per table, at least 1
    #[serde(default = "default_max_fields")]
    pub max_fields: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GenericExtraction {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub instructions: String,
    pub metadata: GenericExtractionMetadata,
}

/// Connection settings of an OpenAI-compatible classification oracle.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct OracleConfig {
    pub endpoint: String,
    pub model: String,
    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl OracleConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Root of the configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DocumentExtractionConfig {
    pub global_instructions: String,
    pub generic_extraction: GenericExtraction,
    pub tables: BTreeMap<String, TableConfig>,
    #[serde(default)]
    pub oracle: Option<OracleConfig>,
    #[serde(default)]
    pub preferences: UserPreferences,
}

fn default_max_fields() -> usize {
    20
}

fn default_enabled() -> bool {
    true
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_owned()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_ORACLE_TIMEOUT.as_secs()
}

impl DocumentExtractionConfig {
    /// Parses and validates a configuration document.
    pub fn parse(content: &str) -> Result<Self, TablefindError> {
        let config: DocumentExtractionConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Retrieves the configuration of a named table.
    pub fn table_config(&self, name: &str) -> Option<&TableConfig> {
        self.tables.get(name)
    }

    pub fn is_generic_extraction_enabled(&self) -> bool {
        self.generic_extraction.enabled
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.generic_extraction.metadata.max_fields < 1 {
            return Err(invalid("generic_extraction.metadata.max_fields", "must be at least 1"));
        }
        if let Some(oracle) = &self.oracle {
            Url::parse(&oracle.endpoint)
                .map_err(|error| invalid("oracle.endpoint", &error.to_string()))?;
            if oracle.model.trim().is_empty() {
                return Err(invalid("oracle.model", "must not be empty"));
            }
            if oracle.timeout_secs < 1 {
                return Err(invalid("oracle.timeout_secs", "must be at least 1"));
            }
        }
        Ok(())
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_owned(),
        message: message.to_owned(),
    }
}

/// Loads the configuration file; relative paths are resolved against the working directory.
pub fn load_config(path: &Path) -> Result<DocumentExtractionConfig, TablefindError> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    if !path.exists() {
        Err(ConfigError::FileNotFound(path.display().to_string()))?
    }
    let content = std::fs::read_to_string(&path)?;
    DocumentExtractionConfig::parse(&content)
        .with_prefix(&format!("Error parsing configuration '{}'", path.display()))
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("tablefind.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
global_instructions: Extract every financial table.
generic_extraction:
  instructions: Extract any other table.
  metadata:
    include_filename: true
tables:
  invoice_summary:
    name: Invoice Summary
    description: Totals per invoice
    metadata:
      include_page_number: true
    fields:
      total:
        type: currency
        required: true
        hints: ["Total", "Amount due"]
      issued:
        type: date
        format: "%Y-%m-%d"
        hints: []
"#;

    #[test]
    fn parse_configuration() {
        let config = DocumentExtractionConfig::parse(CONFIG).unwrap();

        assert!(config.is_generic_extraction_enabled());
        assert_eq!(config.generic_extraction.metadata.max_fields, 20);
        assert!(config.generic_extraction.metadata.table.include_filename);
        let invoice = config.table_config("invoice_summary").unwrap();
        assert_eq!(invoice.fields["total"].kind, FieldType::Currency);
        assert!(invoice.fields["total"].required);
        assert!(!invoice.fields["issued"].required);
        assert!(config.table_config("payroll").is_none());
        assert!(config.oracle.is_none());
        assert!(config.preferences.preferred_sheet_names.is_empty());
    }

    #[test]
    fn parse_oracle_and_preferences() {
        let content = format!(
            "{CONFIG}{}",
            r#"
oracle:
  endpoint: https://api.openai.com/v1/chat/completions
  model: gpt-4o-mini
preferences:
  preferred_sheet_names: [Financial, HR]
  currency: EUR
"#
        );

        let config = DocumentExtractionConfig::parse(&content).unwrap();

        let oracle = config.oracle.unwrap();
        assert_eq!(oracle.api_key_env, "OPENAI_API_KEY");
        assert_eq!(oracle.timeout(), Duration::from_secs(30));
        assert_eq!(config.preferences.preferred_sheet_names, vec!["Financial", "HR"]);
        assert_eq!(config.preferences.extra["currency"], "EUR");
    }

    #[test]
    fn reject_invalid_values() {
        let zero_fields = CONFIG.replace("include_filename: true", "max_fields: 0");
        assert!(matches!(
            DocumentExtractionConfig::parse(&zero_fields),
            Err(TablefindError::ConfigError(ConfigError::InvalidValue { .. }))
        ));

        let bad_endpoint = format!("{CONFIG}oracle:\n  endpoint: not a url\n  model: m\n");
        assert!(matches!(
            DocumentExtractionConfig::parse(&bad_endpoint),
            Err(TablefindError::ConfigError(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn reject_schema_violations() {
        let unknown_type = CONFIG.replace("type: currency", "type: money");

        assert!(matches!(
            DocumentExtractionConfig::parse(&unknown_type),
            Err(TablefindError::YamlError(_))
        ));
    }

    #[test]
    fn missing_file_is_reported() {
        let directory = tempfile::tempdir().unwrap();

        let error = load_config(&directory.path().join("tablefind.yaml")).unwrap_err();

        assert!(matches!(error, TablefindError::ConfigError(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn load_configuration_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("tablefind.yaml");
        std::fs::write(&path, CONFIG).unwrap();

        let config = load_config(&path).unwrap();

        assert_eq!(config.global_instructions, "Extract every financial table.");
    }
}
