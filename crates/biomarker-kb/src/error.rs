//! Error types for the biomarker conversion library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for conversion operations.
///
/// Every variant here is fatal for the run. Problems that only degrade the
/// output (unknown tags, enrichment misses) are reported as
/// [`ConversionWarning`](crate::report::ConversionWarning)s instead.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the CSV library.
    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A TSV header that is not part of the row schema.
    #[error("Invalid header '{0}' in the TSV file")]
    UnexpectedHeader(String),

    /// A row schema column absent from the TSV header.
    #[error("Missing header '{0}' in the TSV file")]
    MissingHeader(String),

    /// A column that appears more than once in the TSV header.
    #[error("Duplicate header '{0}' in the TSV file")]
    DuplicateHeader(String),

    /// A document entry that could not be read as a biomarker record.
    #[error("Invalid biomarker entry at index {index}: {message}")]
    InvalidEntry { index: usize, message: String },

    /// A required value is missing from a document entry or table row.
    #[error("Missing required field '{field}' at {location}")]
    MissingField { location: Location, field: String },

    /// A value that should be a `namespace:accession` identifier is not.
    #[error("Invalid identifier '{value}' in field '{field}' at {location}")]
    InvalidIdentifier {
        location: Location,
        field: String,
        value: String,
    },

    /// Source/target combination that this library cannot convert.
    #[error("Unsupported conversion: {0}")]
    UnsupportedConversion(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A metadata lookup failed. Never fatal for a conversion run.
    #[error("Metadata lookup failed for '{key}': {message}")]
    Lookup { key: String, message: String },

    /// Error loading or saving the metadata cache.
    #[error("Cache persistence error: {0}")]
    Persistence(String),
}

/// Where in the input a schema error was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    /// 0-based index into the document array.
    Entry(usize),
    /// 0-based index of a component within a document entry.
    Component { entry: usize, component: usize },
    /// 1-based data row number in the TSV file (the header is row 0).
    Row(usize),
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Location::Entry(index) => write!(f, "entry {}", index),
            Location::Component { entry, component } => {
                write!(f, "entry {}, component {}", entry, component)
            }
            Location::Row(row) => write!(f, "row {}", row),
        }
    }
}

impl ConversionError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConversionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Shorthand for a missing required field.
    pub fn missing(location: Location, field: impl Into<String>) -> Self {
        ConversionError::MissingField {
            location,
            field: field.into(),
        }
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, ConversionError>;
