//! # Lending Rules
//!
//! The issue / return / delete state machine and copy-count arithmetic,
//! as pure functions over facts the database layer has already read.
//!
//! ## Issue Checks
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  issueBook(student_id, isbn)                                            │
//! │                                                                         │
//! │  1. active loan for (student, isbn)?  ──yes──► DuplicateActiveLoan      │
//! │  2. book exists?                      ──no───► BookNotFound             │
//! │  3. available_copies > 0?             ──no───► NoCopiesAvailable        │
//! │  4. student exists?                   ──no───► StudentNotFound          │
//! │  5. ok: insert loan, available_copies -= 1                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order matters: the UI shows exactly one message, and librarians are
//! used to seeing the duplicate warning before anything else.

use chrono::{DateTime, Duration, Utc};

use crate::error::{CoreError, CoreResult};
use crate::types::TransactionStatus;
use crate::LOAN_PERIOD_DAYS;

/// What the store knows about an issue request at the moment it is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IssueFacts {
    /// An `issued` transaction already exists for this (student, isbn).
    pub has_active_loan: bool,
    /// `available_copies` of the book, or `None` if the isbn is unknown.
    pub available_copies: Option<i64>,
    pub student_exists: bool,
}

/// Decides whether a book may be issued.
pub fn check_issue(facts: &IssueFacts) -> CoreResult<()> {
    if facts.has_active_loan {
        return Err(CoreError::DuplicateActiveLoan);
    }

    let available = facts.available_copies.ok_or(CoreError::BookNotFound)?;
    if available <= 0 {
        return Err(CoreError::NoCopiesAvailable);
    }

    if !facts.student_exists {
        return Err(CoreError::StudentNotFound);
    }

    Ok(())
}

/// Due date for a loan issued at `issued_at`.
pub fn due_date(issued_at: DateTime<Utc>) -> DateTime<Utc> {
    issued_at + Duration::days(LOAN_PERIOD_DAYS)
}

/// Decides whether a transaction may be returned.
///
/// `status` is `None` when the transaction id is unknown.
pub fn check_return(status: Option<TransactionStatus>) -> CoreResult<()> {
    match status {
        None => Err(CoreError::TransactionNotFound),
        Some(TransactionStatus::Returned) => Err(CoreError::AlreadyReturned),
        Some(TransactionStatus::Issued) => Ok(()),
    }
}

/// Decides whether a transaction record may be deleted.
///
/// Stricter than a plain delete: unknown ids are `TransactionNotFound`, and
/// an open loan is refused because its copy would never come back.
pub fn check_delete(id: i64, status: Option<TransactionStatus>) -> CoreResult<()> {
    match status {
        None => Err(CoreError::TransactionNotFound),
        Some(TransactionStatus::Issued) => Err(CoreError::ActiveLoanNotDeletable(id)),
        Some(TransactionStatus::Returned) => Ok(()),
    }
}

/// New `available_copies` after a book's total changes.
///
/// Copies on loan stay on loan, so the available count moves by the same
/// delta as the total: `old_available + (new_total - old_total)`.
///
/// ## Example
/// ```rust
/// use libris_core::lending::rebalance_available;
///
/// // 2 of 5 on loan, total raised to 7
/// assert_eq!(rebalance_available(5, 3, 7).unwrap(), 5);
/// // 2 of 5 on loan, total cut to 1: refused
/// assert!(rebalance_available(5, 3, 1).is_err());
/// ```
pub fn rebalance_available(old_total: i64, old_available: i64, new_total: i64) -> CoreResult<i64> {
    let available = old_available + (new_total - old_total);

    if available < 0 {
        return Err(CoreError::CopiesBelowIssued {
            requested_total: new_total,
            on_loan: old_total - old_available,
        });
    }

    Ok(available)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn facts() -> IssueFacts {
        IssueFacts {
            has_active_loan: false,
            available_copies: Some(1),
            student_exists: true,
        }
    }

    #[test]
    fn test_issue_allowed() {
        assert_eq!(check_issue(&facts()), Ok(()));
    }

    #[test]
    fn test_issue_check_order() {
        // Every check fails; the duplicate wins.
        let all_bad = IssueFacts {
            has_active_loan: true,
            available_copies: None,
            student_exists: false,
        };
        assert_eq!(check_issue(&all_bad), Err(CoreError::DuplicateActiveLoan));

        // Book missing beats student missing.
        let no_book = IssueFacts {
            has_active_loan: false,
            ..all_bad
        };
        assert_eq!(check_issue(&no_book), Err(CoreError::BookNotFound));

        // No copies beats student missing.
        let no_copies = IssueFacts {
            available_copies: Some(0),
            ..no_book
        };
        assert_eq!(check_issue(&no_copies), Err(CoreError::NoCopiesAvailable));

        let no_student = IssueFacts {
            available_copies: Some(2),
            ..no_copies
        };
        assert_eq!(check_issue(&no_student), Err(CoreError::StudentNotFound));
    }

    #[test]
    fn test_messages_match_ui_contract() {
        assert_eq!(CoreError::BookNotFound.to_string(), "Book not found");
        assert_eq!(CoreError::NoCopiesAvailable.to_string(), "No copies available");
        assert_eq!(CoreError::StudentNotFound.to_string(), "Student not found");
        assert_eq!(
            CoreError::DuplicateActiveLoan.to_string(),
            "This student already has a copy of this book issued and hasn't returned it yet."
        );
        assert_eq!(CoreError::TransactionNotFound.to_string(), "Transaction not found");
        assert_eq!(CoreError::AlreadyReturned.to_string(), "Book already returned");
    }

    #[test]
    fn test_due_date_is_fourteen_days_out() {
        let issued = Utc.with_ymd_and_hms(2024, 2, 20, 12, 30, 0).unwrap();
        assert_eq!(
            due_date(issued),
            Utc.with_ymd_and_hms(2024, 3, 5, 12, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_return_and_delete_transitions() {
        assert_eq!(check_return(None), Err(CoreError::TransactionNotFound));
        assert_eq!(
            check_return(Some(TransactionStatus::Returned)),
            Err(CoreError::AlreadyReturned)
        );
        assert!(check_return(Some(TransactionStatus::Issued)).is_ok());

        assert_eq!(check_delete(4, None), Err(CoreError::TransactionNotFound));
        assert_eq!(
            check_delete(4, Some(TransactionStatus::Issued)),
            Err(CoreError::ActiveLoanNotDeletable(4))
        );
        assert!(check_delete(4, Some(TransactionStatus::Returned)).is_ok());
    }

    #[test]
    fn test_rebalance_available() {
        assert_eq!(rebalance_available(3, 3, 3), Ok(3));
        assert_eq!(rebalance_available(3, 1, 5), Ok(3));
        assert_eq!(rebalance_available(3, 1, 2), Ok(0));
        assert_eq!(
            rebalance_available(3, 1, 1),
            Err(CoreError::CopiesBelowIssued {
                requested_total: 1,
                on_loan: 2
            })
        );
    }
}
