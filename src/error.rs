use thiserror::Error;

/// Main error type for tablefind.
/// Aggregates errors from the standard library, dependencies and internal modules.
#[derive(Error, Debug)]
pub enum TablefindError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    #[error("{0}")]
    PersistError(#[from] tempfile::PersistError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Domain module errors
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    SourceError(#[from] crate::table::source::SourceError),

    #[error("{0}")]
    ReferenceError(#[from] crate::workbook::reference::ReferenceError),

    #[error("{0}")]
    GroupingError(#[from] crate::resolver::grouping::GroupingError),

    #[error("{0}")]
    LayoutError(#[from] crate::resolver::placement::LayoutError),

    #[error("{0}")]
    AssemblerError(#[from] crate::assembler::AssemblerError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, TablefindError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| TablefindError::WithContextError(format!("{}: {}", message, e)))
    }
}
