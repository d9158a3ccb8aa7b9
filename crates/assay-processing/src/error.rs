//! Error types for the assay processing library.
//!
//! Data-quality conditions (missing grades, negative values, bad depth
//! ordering) are never errors; they are counted in a
//! [`QualityReport`](crate::quality::QualityReport). Errors cover API misuse,
//! malformed input and numerically meaningless results.
//!
//! Errors are serializable so a reporting layer can forward them as
//! `{ code, message }` objects.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

use crate::config::ConfigValidationError;

/// The main error type for assay loading, cleaning and analysis.
#[derive(Error, Debug)]
pub enum AssayError {
    /// Source content could not be parsed as a table.
    #[error("Malformed assay data: {0}")]
    Format(String),

    /// Column was not found in the table.
    #[error("Column '{0}' not found in assay table")]
    ColumnNotFound(String),

    /// Unsupported strategy, method or format name, or an out-of-domain argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The requested quantity has no meaningful value for this data
    /// (zero variance, no overlapping observations, zero total weight).
    #[error("Result undefined: {0}")]
    Undefined(String),

    /// Invalid analysis configuration.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigValidationError),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Spreadsheet container error.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<AssayError>,
    },
}

impl AssayError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AssayError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for consumers that render errors.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Format(_) => "FORMAT_ERROR",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Undefined(_) => "UNDEFINED",
            Self::Config(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::Zip(_) => "ZIP_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a numerically undefined result rather than a failure.
    pub fn is_undefined(&self) -> bool {
        match self {
            Self::Undefined(_) => true,
            Self::WithContext { source, .. } => source.is_undefined(),
            _ => false,
        }
    }

    /// Check if this error was caused by caller misuse (bad column, name or argument).
    pub fn is_usage_error(&self) -> bool {
        match self {
            Self::ColumnNotFound(_) | Self::InvalidArgument(_) | Self::Config(_) => true,
            Self::WithContext { source, .. } => source.is_usage_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for AssayError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AssayError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for assay operations.
pub type Result<T> = std::result::Result<T, AssayError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| AssayError::Polars(e).with_context(context))
    }
}
