//! Custom error types for the listings processing pipeline.
//!
//! This module provides the error hierarchy using `thiserror` so that every
//! stage of the pipeline reports failures with a stable code and context.
//!
//! Errors are serializable, allowing them to be emitted as part of the
//! machine-readable CLI output.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the listings pipeline.
#[derive(Error, Debug)]
pub enum ProcessingError {
    /// One or more required input columns are absent.
    #[error("Input is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Column was not found in the dataset.
    #[error("Column '{0}' not found in dataset")]
    ColumnNotFound(String),

    /// A listing date could not be parsed.
    #[error("Invalid listing date '{value}' at row {row}")]
    InvalidDate { row: usize, value: String },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No valid values found in a column for computation.
    #[error("No valid values found in column '{0}'")]
    NoValidValues(String),

    /// Imputation failed.
    #[error("Failed to impute missing values in column '{column}': {reason}")]
    ImputationFailed { column: String, reason: String },

    /// Missing values survived every fill pass.
    #[error("Column '{column}' still has {count} missing values after cleaning")]
    UnresolvedMissing { column: String, count: usize },

    /// Locality or price sanitation failed.
    #[error("Failed to sanitize values: {0}")]
    SanitizationFailed(String),

    /// Derived column computation failed.
    #[error("Failed to derive columns: {0}")]
    DerivationFailed(String),

    /// Statistics or segment analysis failed.
    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    /// Report generation failed.
    #[error("Failed to generate report: {0}")]
    ReportGenerationFailed(String),

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
        source: Box<ProcessingError>,
    },
}

impl ProcessingError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ProcessingError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumns(_) => "MISSING_COLUMNS",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidDate { .. } => "INVALID_DATE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NoValidValues(_) => "NO_VALID_VALUES",
            Self::ImputationFailed { .. } => "IMPUTATION_FAILED",
            Self::UnresolvedMissing { .. } => "UNRESOLVED_MISSING",
            Self::SanitizationFailed(_) => "SANITIZATION_FAILED",
            Self::DerivationFailed(_) => "DERIVATION_FAILED",
            Self::AnalysisFailed(_) => "ANALYSIS_FAILED",
            Self::ReportGenerationFailed(_) => "REPORT_GENERATION_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Recover a typed error carried by an `anyhow::Error`, or wrap its message.
    pub(crate) fn from_anyhow(
        err: anyhow::Error,
        wrap: impl FnOnce(String) -> ProcessingError,
    ) -> Self {
        match err.downcast::<ProcessingError>() {
            Ok(typed) => typed,
            Err(other) => wrap(format!("{:#}", other)),
        }
    }

    /// Check if this error comes from the input data rather than the environment.
    pub fn is_data_error(&self) -> bool {
        match self {
            Self::MissingColumns(_)
            | Self::ColumnNotFound(_)
            | Self::InvalidDate { .. }
            | Self::NoValidValues(_)
            | Self::UnresolvedMissing { .. } => true,
            Self::WithContext { source, .. } => source.is_data_error(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for ProcessingError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("ProcessingError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ProcessingError>;

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
        self.map_err(|e| ProcessingError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        assert_eq!(
            ProcessingError::ColumnNotFound("rooms".to_string()).error_code(),
            "COLUMN_NOT_FOUND"
        );
        assert_eq!(
            ProcessingError::UnresolvedMissing {
                column: "living_area".to_string(),
                count: 3
            }
            .error_code(),
            "UNRESOLVED_MISSING"
        );
    }

    #[test]
    fn test_missing_columns_message() {
        let error = ProcessingError::MissingColumns(vec![
            "rooms".to_string(),
            "floor".to_string(),
        ]);
        assert_eq!(
            error.to_string(),
            "Input is missing required columns: rooms, floor"
        );
    }

    #[test]
    fn test_is_data_error() {
        assert!(ProcessingError::NoValidValues("floors_total".to_string()).is_data_error());
        assert!(!ProcessingError::InvalidConfig("bad".to_string()).is_data_error());
        assert!(
            ProcessingError::InvalidDate {
                row: 2,
                value: "yesterday".to_string()
            }
            .with_context("Loading")
            .is_data_error()
        );
    }

    #[test]
    fn test_error_serialization() {
        let error = ProcessingError::ColumnNotFound("kitchen_area".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("COLUMN_NOT_FOUND"));
        assert!(json.contains("kitchen_area"));
    }

    #[test]
    fn test_from_anyhow_keeps_typed_errors() {
        let typed = anyhow::Error::new(ProcessingError::NoValidValues("floors_total".to_string()));
        let err = ProcessingError::from_anyhow(typed, ProcessingError::AnalysisFailed);
        assert_eq!(err.error_code(), "NO_VALID_VALUES");

        let plain = anyhow::anyhow!("division by zero");
        let err = ProcessingError::from_anyhow(plain, ProcessingError::AnalysisFailed);
        assert_eq!(err.error_code(), "ANALYSIS_FAILED");
        assert!(err.to_string().contains("division by zero"));
    }

    #[test]
    fn test_with_context() {
        let error =
            ProcessingError::ColumnNotFound("rooms".to_string()).with_context("During imputation");
        assert!(error.to_string().contains("During imputation"));
        assert_eq!(error.error_code(), "COLUMN_NOT_FOUND");
    }
}
