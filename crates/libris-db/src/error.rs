//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)      Lending rule (CoreError)              │
//! │       │                                 │                               │
//! │       ▼                                 ▼                               │
//! │  DbError (this module) ◄────────────────┘                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in desktop app) ← Serialized for the UI process             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Message Text
//! SQLite's own message is kept verbatim in [`DbError::QueryFailed`]. A
//! duplicate `student_id` therefore reads
//! `UNIQUE constraint failed: students.student_id`, which is what the UI
//! shows.

use libris_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    ///
    /// ## When This Occurs
    /// - Update or delete by a business key that does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Database connection failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Schema creation or migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Statement execution failed; carries SQLite's message.
    #[error("{0}")]
    QueryFailed(String),

    /// Transaction begin / commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Reading or writing the snapshot file failed.
    #[error("Snapshot I/O failed: {0}")]
    Snapshot(#[from] std::io::Error),

    /// A lending or catalogue rule refused the operation.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → DbError::QueryFailed (SQLite message)
/// sqlx::Error::PoolTimedOut   → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("Timed out waiting for a connection".to_string())
            }

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            sqlx::Error::Io(io) => DbError::Snapshot(io),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejections_keep_domain_text() {
        let err = DbError::from(CoreError::NoCopiesAvailable);
        assert_eq!(err.to_string(), "No copies available");
    }

    #[test]
    fn test_not_found_text() {
        assert_eq!(
            DbError::not_found("Student", "S9").to_string(),
            "Student not found: S9"
        );
    }
}
