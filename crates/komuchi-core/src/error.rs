//! Error types module
//!
//! This module provides the core error types used throughout the Komuchi application.
//! All errors are unified under the `AppError` enum which can represent database,
//! storage, validation, and other domain-specific errors.

use std::io;

use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like resource limits
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// This trait allows errors to self-describe their HTTP response characteristics
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Client-facing error name serialized in the `error` field (e.g. "Validation Error")
    fn error_name(&self) -> &'static str;

    /// Machine-readable error code (e.g., "VALIDATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("JSON parsing error: {}", err))
    }
}

impl From<uuid::Error> for AppError {
    fn from(err: uuid::Error) -> Self {
        AppError::Validation(format!("UUID parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_name, error_code, recoverable, sensitive, log_level).
/// Reduces duplication in ErrorMetadata impl; client_message stays per-variant for dynamic content.
fn app_error_static_metadata(
    err: &AppError,
) -> (u16, &'static str, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (
            500,
            "Internal Server Error",
            "DATABASE_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Storage(_) => (
            500,
            "Internal Server Error",
            "STORAGE_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Cache(_) => (
            500,
            "Internal Server Error",
            "CACHE_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Provider(_) => (
            502,
            "Bad Gateway",
            "PROVIDER_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::Validation(_) => (
            400,
            "Validation Error",
            "VALIDATION_ERROR",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidFileType(_) => (
            400,
            "Invalid File Type",
            "INVALID_FILE_TYPE",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::InvalidState(_) => (
            400,
            "Invalid State",
            "INVALID_STATE",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::NotFound(_) => (
            404,
            "Not Found",
            "NOT_FOUND",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::Unauthorized(_) => (
            401,
            "Unauthorized",
            "UNAUTHORIZED",
            false,
            false,
            LogLevel::Debug,
        ),
        AppError::RateLimited(_) => (
            429,
            "Too Many Requests",
            "RATE_LIMITED",
            true,
            false,
            LogLevel::Warn,
        ),
        AppError::Config(_) => (
            500,
            "Internal Server Error",
            "CONFIG_ERROR",
            false,
            true,
            LogLevel::Error,
        ),
        AppError::Internal(_) => (
            500,
            "Internal Server Error",
            "INTERNAL_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
        AppError::InternalWithSource { .. } => (
            500,
            "Internal Server Error",
            "INTERNAL_ERROR",
            true,
            true,
            LogLevel::Error,
        ),
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::Cache(_) => "Cache",
            AppError::Provider(_) => "Provider",
            AppError::Validation(_) => "Validation",
            AppError::InvalidFileType(_) => "InvalidFileType",
            AppError::InvalidState(_) => "InvalidState",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::RateLimited(_) => "RateLimited",
            AppError::Config(_) => "Config",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_name(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).2
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).4
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).5
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access storage".to_string(),
            AppError::Cache(_) => "Failed to access cache".to_string(),
            AppError::Provider(_) => "Upstream provider request failed".to_string(),
            AppError::Validation(ref msg) => msg.clone(),
            AppError::InvalidFileType(ref msg) => msg.clone(),
            AppError::InvalidState(ref msg) => msg.clone(),
            AppError::NotFound(ref msg) => msg.clone(),
            AppError::Unauthorized(ref msg) => msg.clone(),
            AppError::RateLimited(ref msg) => msg.clone(),
            AppError::Config(_) => "Internal server error".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            AppError::InternalWithSource { .. } => "Internal server error".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_database() {
        let err = AppError::from(sqlx::Error::PoolClosed);
        assert_eq!(err.http_status_code(), 500);
        assert_eq!(err.error_name(), "Internal Server Error");
        assert_eq!(err.error_code(), "DATABASE_ERROR");
        assert!(err.is_recoverable());
        assert_eq!(err.client_message(), "Failed to access database");
        assert!(err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_validation() {
        let err = AppError::Validation("title is required".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_name(), "Validation Error");
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "title is required");
        assert!(!err.is_sensitive());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_invalid_file_type() {
        let err = AppError::InvalidFileType("mime type invalid/type is not supported".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_name(), "Invalid File Type");
        assert_eq!(err.error_code(), "INVALID_FILE_TYPE");
    }

    #[test]
    fn test_error_metadata_invalid_state() {
        let err = AppError::InvalidState("recording is not pending".to_string());
        assert_eq!(err.http_status_code(), 400);
        assert_eq!(err.error_name(), "Invalid State");
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_error_metadata_not_found() {
        let err = AppError::NotFound("Recording not found".to_string());
        assert_eq!(err.http_status_code(), 404);
        assert_eq!(err.error_name(), "Not Found");
        assert!(!err.is_recoverable());
        assert_eq!(err.client_message(), "Recording not found");
        assert!(!err.is_sensitive());
    }

    #[test]
    fn test_error_metadata_unauthorized() {
        let err = AppError::Unauthorized("Unauthorized".to_string());
        assert_eq!(err.http_status_code(), 401);
        assert_eq!(err.error_name(), "Unauthorized");
        assert_eq!(err.client_message(), "Unauthorized");
    }

    #[test]
    fn test_error_metadata_rate_limited() {
        let err = AppError::RateLimited("Rate limit exceeded".to_string());
        assert_eq!(err.http_status_code(), 429);
        assert_eq!(err.error_name(), "Too Many Requests");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
    }

    #[test]
    fn test_internal_hides_detail_from_client() {
        let err = AppError::Internal("connection pool exhausted at 10.0.0.3".to_string());
        assert_eq!(err.client_message(), "Internal server error");
        assert!(err.is_sensitive());
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let source = anyhow::anyhow!("root cause").context("middle layer");
        let err = AppError::InternalWithSource {
            message: "outer".to_string(),
            source,
        };
        let details = err.detailed_message();
        assert!(details.contains("Caused by:"));
        assert!(details.contains("root cause"));
    }
}
