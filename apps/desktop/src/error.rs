//! # API Error Type
//!
//! Unified error type for commands, and the response envelope mutating
//! commands return to the UI process.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Libris                                 │
//! │                                                                         │
//! │  UI process                  Rust Backend                               │
//! │  ──────────                  ────────────                               │
//! │                                                                         │
//! │  {"command":"issueBook",...}                                            │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │  Lending rule? ─── CoreError::NoCopiesAvailable ──┐             │  │
//! │  │  SQLite?       ─── DbError::QueryFailed("...") ───┼─► ApiError  │  │
//! │  │  No database?  ─── ApiError::unavailable ─────────┘      │      │  │
//! │  └──────────────────────────────────────────────────────────┼──────┘  │
//! │                                                              ▼         │
//! │  {"success":false,"error":"No copies available"}  ◄── CommandResponse  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Messages pass through verbatim: the librarian sees the lending rule text
//! or SQLite's own message.

use libris_core::CoreError;
use libris_db::DbError;
use serde::Serialize;
use thiserror::Error;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Student not found: S9"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Error)]
#[serde(rename_all = "camelCase")]
#[error("{message}")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Database operation failed
    DatabaseError,

    /// A lending or catalogue rule refused the request
    BusinessLogic,

    /// The database could not be opened at startup
    Unavailable,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// The database never came up (or was lost during a restore).
    pub fn unavailable(reason: Option<&str>) -> Self {
        let message = match reason {
            Some(reason) => format!("Database unavailable: {reason}"),
            None => "Database unavailable".to_string(),
        };
        ApiError::new(ErrorCode::Unavailable, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::new(ErrorCode::NotFound, err.to_string()),
            DbError::Rejected(core) => ApiError::from(core),
            DbError::QueryFailed(ref message) => {
                tracing::warn!(error = %message, "Database statement failed");
                ApiError::new(ErrorCode::DatabaseError, err.to_string())
            }
            DbError::ConnectionFailed(_)
            | DbError::MigrationFailed(_)
            | DbError::TransactionFailed(_)
            | DbError::Snapshot(_)
            | DbError::Internal(_) => {
                tracing::error!(error = %err, "Database error");
                ApiError::new(ErrorCode::DatabaseError, err.to_string())
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            e if e.is_not_found() => ErrorCode::NotFound,
            _ => ErrorCode::BusinessLogic,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<libris_core::ValidationError> for ApiError {
    fn from(err: libris_core::ValidationError) -> Self {
        ApiError::from(CoreError::from(err))
    }
}

// =============================================================================
// Command Response
// =============================================================================

/// Outcome of a mutating command as the UI process expects it.
///
/// ```json
/// { "success": true }
/// { "success": true, "filePath": "/home/lib/students.csv" }
/// { "success": false, "error": "Book already returned" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
}

impl CommandResponse {
    pub fn ok() -> Self {
        CommandResponse {
            success: true,
            error: None,
            file_path: None,
        }
    }

    pub fn with_file(path: impl Into<String>) -> Self {
        CommandResponse {
            file_path: Some(path.into()),
            ..CommandResponse::ok()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        CommandResponse {
            success: false,
            error: Some(error.into()),
            file_path: None,
        }
    }
}

impl<T> From<Result<T, ApiError>> for CommandResponse {
    fn from(result: Result<T, ApiError>) -> Self {
        match result {
            Ok(_) => CommandResponse::ok(),
            Err(e) => CommandResponse::failed(e.message),
        }
    }
}
