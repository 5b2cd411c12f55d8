//! Resource Ingest Library
//!
//! A Rust library for loading community resource listings (businesses, programs,
//! services) from CSV files into a remote resource directory API.
//!
//! This library provides tools for:
//! - Validating CSV headers against the resource schema and allowed extra columns
//! - Normalizing rows into typed [`ResourceRecord`]s with closed vocabularies
//! - Checking category/subcategory tokens against a live vocabulary snapshot
//! - Parsing many files concurrently with per-file error attribution
//! - Uploading records with rollback-id tracking and reversing an upload later
//! - Probing the reachability of links embedded in a CSV column

pub mod config;
pub mod constants;
pub mod text;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod link_checker;
        pub mod progress;
        pub mod resource_parser;
        pub mod rollback;
        pub mod uploader;
        pub mod vocabulary;
    }
    pub mod adapters {
        pub mod filesystem;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{GradeRange, ResourceRecord, Row, RowLocation};
pub use app::services::vocabulary::VocabularySnapshot;
pub use config::Config;

use text::{bulleted_list, count, missing_path_list, quoted_list};

/// Result type alias for resource ingestion
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for resource ingestion operations
///
/// Row-level variants (`MissingRequiredField`, `InvalidEnumValue`,
/// `UnknownCategory`, `UnknownSubcategory`, `InvalidGradeFormat`) are raised on
/// the first problem and abort the file. Header, path, upload and rollback
/// variants are aggregates built after scanning the whole collection.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV reading error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Required columns absent (or blank) in a row
    #[error(
        "{location}: at least 1 required field was not found:\n{}",
        quoted_list(.fields, "is a required field")
    )]
    MissingRequiredField {
        location: RowLocation,
        fields: Vec<String>,
    },

    /// Header names outside the schema and the allowed extras
    #[error(
        "Unable to parse {file} due to invalid fields:\n{}",
        quoted_list(.fields, "is not a valid field")
    )]
    InvalidColumns { file: String, fields: Vec<String> },

    /// Enum field holds a value outside its vocabulary
    #[error("{location}: \"{value}\" is not a valid {vocabulary} for field \"{field}\"")]
    InvalidEnumValue {
        location: RowLocation,
        field: String,
        value: String,
        vocabulary: &'static str,
    },

    /// Category token missing from the vocabulary snapshot
    #[error("{location}: \"{value}\" is not a valid category")]
    UnknownCategory { location: RowLocation, value: String },

    /// Subcategory token missing from the vocabulary snapshot
    #[error("{location}: \"{value}\" is not a valid subcategory")]
    UnknownSubcategory { location: RowLocation, value: String },

    /// Grade range column could not be decomposed
    #[error("{location}: invalid grade range \"{value}\": {reason}")]
    InvalidGradeFormat {
        location: RowLocation,
        value: String,
        reason: String,
    },

    /// One or more input paths do not exist
    #[error("Some paths were not found:\n{}", missing_path_list(.paths))]
    PathNotFound { paths: Vec<String> },

    /// Some records failed to upload
    #[error("Failed to upload {} resources:\n{}", count(.messages), bulleted_list(.messages))]
    ResourceUpload { messages: Vec<String> },

    /// Some rollback deletions failed
    #[error("Failed to roll back {} resources:\n{}", count(.messages), bulleted_list(.messages))]
    Rollback { messages: Vec<String> },

    /// HTTP transport failure
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// Vocabulary endpoint returned something unusable
    #[error("Vocabulary error: {message}")]
    Vocabulary { message: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an HTTP error with context
    pub fn http(message: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Http {
            message: message.into(),
            source,
        }
    }

    /// Create a vocabulary error
    pub fn vocabulary(message: impl Into<String>) -> Self {
        Self::Vocabulary {
            message: message.into(),
        }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }

    /// Individual messages carried by this error, one per reported problem
    ///
    /// Aggregate variants expand into one line per item; everything else is a
    /// single line. Used to build the bulleted error log shown to the user.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::MissingRequiredField { location, fields } => fields
                .iter()
                .map(|f| format!("{location}: \"{f}\" is a required field"))
                .collect(),
            Self::InvalidColumns { file, fields } => fields
                .iter()
                .map(|f| format!("{file}: \"{f}\" is not a valid field"))
                .collect(),
            Self::PathNotFound { paths } => paths
                .iter()
                .map(|p| format!("Path \"{p}\" does not exist"))
                .collect(),
            Self::ResourceUpload { messages } | Self::Rollback { messages } => messages.clone(),
            other => vec![other.to_string()],
        }
    }

    /// One-line description of the error
    ///
    /// Aggregate variants are reduced to a headline since their items are
    /// shown separately as the error log.
    pub fn summary(&self) -> String {
        match self {
            Self::MissingRequiredField { location, fields } => format!(
                "{location}: {} required field(s) not found",
                fields.len()
            ),
            Self::InvalidColumns { file, fields } => format!(
                "Unable to parse {file} due to {} invalid field(s)",
                fields.len()
            ),
            Self::PathNotFound { paths } => format!("{} path(s) not found", paths.len()),
            Self::ResourceUpload { messages } => {
                format!("Failed to upload {} resources", messages.len())
            }
            Self::Rollback { messages } => {
                format!("Failed to roll back {} resources", messages.len())
            }
            other => other.to_string(),
        }
    }

    /// Whether this error describes invalid input data rather than a system failure
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. }
                | Self::InvalidColumns { .. }
                | Self::InvalidEnumValue { .. }
                | Self::UnknownCategory { .. }
                | Self::UnknownSubcategory { .. }
                | Self::InvalidGradeFormat { .. }
        )
    }
}

// Automatic conversions from common error types
impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Http {
            message: "HTTP request failed".to_string(),
            source: error,
        }
    }
}
