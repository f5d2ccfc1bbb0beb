//! # Error Types
//!
//! Domain-specific error types for libris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libris-core errors (this file)                                        │
//! │  ├── CoreError        - Lending rule violations                        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  libris-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Desktop API errors (in app)                                           │
//! │  └── ApiError         - What the UI process sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → UI           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Message Text
//! The `Display` text of each lending variant is shown to librarians
//! verbatim, so it is part of the contract with the UI process.

use thiserror::Error;

/// Result alias for domain operations.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Core Error
// =============================================================================

/// Lending workflow and catalogue rule violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The student already holds an unreturned copy of this title.
    ///
    /// ## User Workflow
    /// ```text
    /// Issue (S1, X1)  ──► ok, loan #7 issued
    ///      │
    ///      ▼
    /// Issue (S1, X1)  ──► DuplicateActiveLoan
    ///      │
    ///      ▼
    /// Return #7       ──► ok
    ///      │
    ///      ▼
    /// Issue (S1, X1)  ──► ok again
    /// ```
    #[error("This student already has a copy of this book issued and hasn't returned it yet.")]
    DuplicateActiveLoan,

    /// No book carries the requested ISBN.
    #[error("Book not found")]
    BookNotFound,

    /// Every copy of the book is out on loan.
    #[error("No copies available")]
    NoCopiesAvailable,

    /// No student carries the requested student id.
    #[error("Student not found")]
    StudentNotFound,

    /// No transaction carries the requested id.
    #[error("Transaction not found")]
    TransactionNotFound,

    /// The transaction was already returned.
    #[error("Book already returned")]
    AlreadyReturned,

    /// Only returned transactions may be deleted.
    ///
    /// ## When This Occurs
    /// Deleting an `issued` record would leave a copy permanently checked
    /// out with no record explaining where it went.
    #[error("Transaction {0} is still issued; return the book before deleting it")]
    ActiveLoanNotDeletable(i64),

    /// A book update would drive `available_copies` below zero.
    #[error(
        "Cannot reduce total copies to {requested_total}: {on_loan} copies are currently on loan"
    )]
    CopiesBelowIssued { requested_total: i64, on_loan: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Whether the error describes a missing record rather than a refusal.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CoreError::BookNotFound | CoreError::StudentNotFound | CoreError::TransactionNotFound
        )
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before anything touches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Field has invalid format.
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}
