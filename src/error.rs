//! Error types for batchconv
//!
//! This module provides error handling for the library, including:
//! - Batch-level errors that fail a whole request (validation, assembly, ...)
//! - Per-item errors that are captured into a single item's result
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

use crate::types::FailedItem;

/// Result type alias for batchconv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batchconv
///
/// Every variant is fatal to the request it occurs in. Failures that only affect a
/// single item of a batch are represented by [`ItemError`] instead and never
/// unwind the orchestrator.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_items")
        key: Option<String>,
    },

    /// Missing or invalid batch parameters
    #[error("invalid request: {0}")]
    Validation(String),

    /// Request used a verb other than POST
    #[error("method {0} not allowed")]
    MethodNotAllowed(String),

    /// Request body exceeds the configured cap
    #[error("payload too large: limit is {limit} bytes")]
    PayloadTooLarge {
        /// Configured maximum request size in bytes
        limit: u64,
        /// Size reported or observed for the request, if known
        actual: Option<u64>,
    },

    /// Output format is not part of the supported catalog
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The only item of a single-item batch failed
    #[error("item {index} ({name}) failed: {source}")]
    Item {
        /// Position of the item in the batch
        index: usize,
        /// Original file name of the item
        name: String,
        /// The per-item failure
        #[source]
        source: ItemError,
    },

    /// Every item of a multi-item batch failed
    #[error("all {} items in the batch failed", failures.len())]
    BatchFailed {
        /// One record per failed item, in ascending index order
        failures: Vec<FailedItem>,
    },

    /// Archive construction failed
    #[error("failed to assemble archive: {0}")]
    Assembly(String),

    /// The request was cancelled (client disconnect or shutdown)
    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// The request exceeded its overall time budget
    #[error("request timed out after {0:?}")]
    RequestTimedOut(Duration),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Failure of a single batch item
///
/// Captured into that item's [`ConversionResult`](crate::types::ConversionResult);
/// sibling items are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ItemError {
    /// Input extension unknown, or identical to the requested output format
    #[error("unsupported format: {reason}")]
    UnsupportedFormat {
        /// Why the item was rejected
        reason: String,
    },

    /// The external converter failed
    #[error("conversion failed: {0}")]
    Conversion(#[from] ConversionError),

    /// Staging or reading temporary storage failed
    #[error("I/O error: {0}")]
    Io(String),
}

/// Failure reported by a [`Converter`](crate::converter::Converter)
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// No converter binary is available
    #[error("converter not available: {0}")]
    ToolMissing(String),

    /// The converter process could not be started
    #[error("failed to execute {tool}: {reason}")]
    Spawn {
        /// Binary that was invoked
        tool: String,
        /// OS-level reason
        reason: String,
    },

    /// The converter exited unsuccessfully
    #[error("converter exited with status {code:?}: {stderr}")]
    ExitStatus {
        /// Exit code, `None` when terminated by a signal
        code: Option<i32>,
        /// Trimmed standard error output
        stderr: String,
    },

    /// The converter exited successfully but produced no output file
    #[error("converter produced no output at {0}")]
    MissingOutput(PathBuf),

    /// The conversion exceeded the per-task timeout
    #[error("conversion timed out after {0:?}")]
    TimedOut(Duration),

    /// Failure reported by a non-process converter
    #[error("{0}")]
    Failed(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "payload_too_large",
///     "message": "payload too large: limit is 2147483648 bytes",
///     "details": {
///       "limit_bytes": 2147483648
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "validation_error", "unsupported_format")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for ItemError {
    fn status_code(&self) -> u16 {
        match self {
            ItemError::UnsupportedFormat { .. } => 400,
            ItemError::Conversion(_) => 500,
            ItemError::Io(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            ItemError::UnsupportedFormat { .. } => "unsupported_format",
            ItemError::Conversion(ConversionError::TimedOut(_)) => "conversion_timeout",
            ItemError::Conversion(_) => "conversion_failed",
            ItemError::Io(_) => "io_error",
        }
    }
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::Validation(_) => 400,
            Error::UnsupportedFormat(_) => 400,

            // 405 / 413 - Intake rejections
            Error::MethodNotAllowed(_) => 405,
            Error::PayloadTooLarge { .. } => 413,

            // Per-item failures keep the status of the underlying item error
            Error::Item { source, .. } => source.status_code(),
            Error::BatchFailed { failures } => {
                if !failures.is_empty()
                    && failures.iter().all(|f| f.code == "unsupported_format")
                {
                    400
                } else {
                    500
                }
            }

            // 500 Internal Server Error - Server-side issues
            Error::Assembly(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 / 504 - Request did not run to completion
            Error::Cancelled(_) => 503,
            Error::RequestTimedOut(_) => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Validation(_) => "validation_error",
            Error::MethodNotAllowed(_) => "method_not_allowed",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::Item { source, .. } => source.error_code(),
            Error::BatchFailed { .. } => "batch_failed",
            Error::Assembly(_) => "assembly_error",
            Error::Cancelled(_) => "cancelled",
            Error::RequestTimedOut(_) => "request_timeout",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::PayloadTooLarge { limit, actual } => Some(serde_json::json!({
                "limit_bytes": limit,
                "actual_bytes": actual,
            })),
            Error::Item { index, name, .. } => Some(serde_json::json!({
                "index": index,
                "name": name,
            })),
            Error::BatchFailed { failures } => Some(serde_json::json!({
                "failures": failures,
            })),
            Error::RequestTimedOut(after) => Some(serde_json::json!({
                "timeout_ms": after.as_millis() as u64,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
