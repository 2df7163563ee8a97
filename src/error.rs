//! Custom error types for the catalog ETL pipeline.
//!
//! This module provides the pipeline-wide error taxonomy using `thiserror`.
//! Every stage boundary converts foreseeable failures into one of these
//! variants; nothing inside a stage is allowed to escape uncaught.
//!
//! Errors are serializable (code + message) so run reports can embed them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the ETL pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file missing, unreadable, or undecodable under both encodings.
    #[error("Input error: {0}")]
    Input(String),

    /// Required columns absent from the extracted table.
    #[error("Missing required columns: {0:?}")]
    MissingColumns(Vec<String>),

    /// Extracted table contained no rows.
    #[error("Dataset is empty")]
    EmptyDataset,

    /// A transformation pass failed.
    #[error("Failed to transform data: {0}")]
    Transform(String),

    /// Database error during load.
    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Post-load row count did not match the input.
    #[error("Load verification failed: expected {expected} rows, found {actual}")]
    LoadVerification { expected: usize, actual: usize },

    /// Chart or report generation failed.
    #[error("Failed to generate report: {0}")]
    Report(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// HTTP request error (API extraction variant).
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        PipelineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for reports and exit-path handling.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Input(_) => "INPUT_ERROR",
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::Transform(_) => "TRANSFORM_FAILED",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::LoadVerification { .. } => "LOAD_VERIFICATION_FAILED",
            Self::Report(_) => "REPORT_FAILED",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Http(_) => "HTTP_REQUEST_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check whether this error came from the reporting stage.
    ///
    /// Reporting errors are non-fatal by default; the orchestrator logs and
    /// skips them unless configured to treat reports as required.
    pub fn is_report_error(&self) -> bool {
        match self {
            Self::Report(_) => true,
            Self::WithContext { source, .. } => source.is_report_error(),
            _ => false,
        }
    }
}

/// Serialize implementation so errors can be embedded in JSON run reports.
impl Serialize for PipelineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("PipelineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

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
        self.map_err(|e| PipelineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            PipelineError::Input("no such file".to_string()).error_code(),
            "INPUT_ERROR"
        );
        assert_eq!(PipelineError::EmptyDataset.error_code(), "EMPTY_DATASET");
        assert_eq!(
            PipelineError::MissingColumns(vec!["rating".to_string()]).error_code(),
            "MISSING_COLUMNS"
        );
    }

    #[test]
    fn test_is_report_error() {
        assert!(PipelineError::Report("empty aggregate".to_string()).is_report_error());
        assert!(
            PipelineError::Report("charts".to_string())
                .with_context("While rendering")
                .is_report_error()
        );
        assert!(!PipelineError::EmptyDataset.is_report_error());
    }

    #[test]
    fn test_error_serialization() {
        let error = PipelineError::MissingColumns(vec!["duration".to_string()]);
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("MISSING_COLUMNS"));
        assert!(json.contains("duration"));
    }

    #[test]
    fn test_with_context_preserves_code() {
        let error = PipelineError::EmptyDataset.with_context("During extraction");
        assert!(error.to_string().contains("During extraction"));
        assert_eq!(error.error_code(), "EMPTY_DATASET");
    }
}
