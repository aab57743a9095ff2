//! Audit error types.

use thiserror::Error;

/// Errors from audit parsing and export.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Stored or requested action is not recognised.
    #[error("Unknown audit action: {0}")]
    UnknownAction(String),

    /// Stored or requested entity type is not recognised.
    #[error("Unknown entity type: {0}")]
    UnknownEntityType(String),

    /// Requested export format is not supported.
    #[error("Unknown export format: {0}")]
    UnknownFormat(String),

    /// CSV writer failed.
    #[error("CSV export failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON export failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Export buffer could not be finalized.
    #[error("Export failed: {0}")]
    Export(String),
}

impl AuditError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "UNKNOWN_AUDIT_ACTION",
            Self::UnknownEntityType(_) => "UNKNOWN_ENTITY_TYPE",
            Self::UnknownFormat(_) => "UNKNOWN_EXPORT_FORMAT",
            Self::Csv(_) | Self::Json(_) | Self::Export(_) => "EXPORT_FAILED",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::UnknownAction(_) | Self::UnknownEntityType(_) | Self::UnknownFormat(_) => 400,
            Self::Csv(_) | Self::Json(_) | Self::Export(_) => 500,
        }
    }
}
