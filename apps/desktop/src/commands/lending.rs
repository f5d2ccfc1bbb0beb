//! # Lending Commands
//!
//! Issue, return and housekeeping of loans.
//!
//! ## Loan Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  issueBook ──► [issued] ──returnBook──► [returned] ──deleteTransaction──► gone
//! │                   │                        │                            │
//! │        available_copies - 1      available_copies + 1                   │
//! │                                                                         │
//! │  returnBook on [returned]         ──► "Book already returned"           │
//! │  deleteTransaction on [issued]    ──► rejected, copy still out          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use tracing::{debug, info};

use crate::commands::{required_key, search_query};
use crate::error::ApiError;
use crate::state::{AppState, CacheCategory};
use libris_core::{filter_records, ActiveLoan, IssueRequest, LoanRecord};

/// Issue and return move copies, so books and counts change too.
const LOAN_WRITE: &[CacheCategory] = &[
    CacheCategory::Transactions,
    CacheCategory::Books,
    CacheCategory::Statistics,
];

/// Lends one copy of a book to a student, due in 14 days.
///
/// ## Errors (first failing check wins)
/// 1. the student already holds an unreturned copy of this book
/// 2. "Book not found"
/// 3. "No copies available"
/// 4. "Student not found"
pub async fn issue_book(state: &AppState, request: IssueRequest) -> Result<(), ApiError> {
    let student_id = required_key("student_id", &request.student_id)?;
    let isbn = required_key("isbn", &request.isbn)?;

    let db = state.db.acquire().await?;
    let loan = db
        .transactions()
        .issue(&student_id, &isbn, Utc::now())
        .await?;

    state.cache.invalidate(LOAN_WRITE);
    state.saver.schedule();

    debug!(id = loan.id, "issue_book complete");
    Ok(())
}

/// Closes a loan and puts the copy back on the shelf.
pub async fn return_book(state: &AppState, transaction_id: i64) -> Result<(), ApiError> {
    let db = state.db.acquire().await?;
    let loan = db
        .transactions()
        .return_loan(transaction_id, Utc::now())
        .await?;

    state.cache.invalidate(LOAN_WRITE);
    state.saver.schedule();

    debug!(id = loan.id, isbn = %loan.isbn, "return_book complete");
    Ok(())
}

/// Removes a returned loan from the history.
pub async fn delete_transaction(state: &AppState, transaction_id: i64) -> Result<(), ApiError> {
    let db = state.db.acquire().await?;
    db.transactions().delete(transaction_id).await?;

    state.cache.invalidate(&[CacheCategory::Transactions]);
    state.saver.schedule();

    info!(id = transaction_id, "Transaction deleted");
    Ok(())
}

/// Lists loans with borrower names and book titles, newest first.
pub async fn get_transactions(
    state: &AppState,
    query: Option<&str>,
) -> Result<Vec<LoanRecord>, ApiError> {
    let query = search_query(query)?;
    let records = load_transactions(state).await?;
    Ok(filter_records(&records, &query))
}

/// All loan records, from the cache when fresh.
pub(crate) async fn load_transactions(state: &AppState) -> Result<Vec<LoanRecord>, ApiError> {
    let db = state.db.acquire().await?;
    if let Some(records) = state.cache.transactions() {
        return Ok(records);
    }

    let records = db.transactions().list_with_details().await?;
    state.cache.store_transactions(records.clone());
    Ok(records)
}

/// What a student currently has out. Never cached.
pub async fn get_student_books(
    state: &AppState,
    student_id: &str,
) -> Result<Vec<ActiveLoan>, ApiError> {
    let student_id = required_key("student_id", student_id)?;

    let db = state.db.acquire().await?;
    Ok(db.transactions().active_loans_for(&student_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::book::{add_book, get_books};
    use crate::commands::student::add_student;
    use crate::error::ErrorCode;
    use libris_core::{BookInput, StudentInput, TransactionStatus};

    async fn library() -> AppState {
        let state = AppState::in_memory().await;
        add_student(
            &state,
            StudentInput {
                student_id: "S1".to_string(),
                name: "Ada".to_string(),
                email: "ada@school.edu".to_string(),
                phone: None,
                department: None,
                year: None,
            },
        )
        .await
        .unwrap();
        add_book(
            &state,
            BookInput {
                isbn: "X1".to_string(),
                title: "Rust".to_string(),
                author: "Ferris".to_string(),
                publisher: None,
                category: None,
                total_copies: 2,
                available_copies: None,
            },
        )
        .await
        .unwrap();
        state
    }

    fn request(student_id: &str, isbn: &str) -> IssueRequest {
        IssueRequest {
            student_id: student_id.to_string(),
            isbn: isbn.to_string(),
        }
    }

    async fn available(state: &AppState) -> i64 {
        get_books(state, None).await.unwrap()[0].available_copies
    }

    #[tokio::test]
    async fn test_issue_return_delete_cycle() {
        let state = library().await;

        issue_book(&state, request("S1", "X1")).await.unwrap();
        assert_eq!(available(&state).await, 1);

        let loans = get_student_books(&state, "S1").await.unwrap();
        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].title.as_deref(), Some("Rust"));
        let id = loans[0].id;

        let err = issue_book(&state, request("S1", "X1")).await.unwrap_err();
        assert_eq!(
            err.message,
            "This student already has a copy of this book issued and hasn't returned it yet."
        );

        let err = delete_transaction(&state, id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        return_book(&state, id).await.unwrap();
        assert_eq!(available(&state).await, 2);
        assert!(get_student_books(&state, "S1").await.unwrap().is_empty());

        let err = return_book(&state, id).await.unwrap_err();
        assert_eq!(err.message, "Book already returned");

        delete_transaction(&state, id).await.unwrap();
        assert!(get_transactions(&state, None).await.unwrap().is_empty());
        assert_eq!(available(&state).await, 2);
    }

    #[tokio::test]
    async fn test_issue_check_order() {
        let state = library().await;

        let err = issue_book(&state, request("S9", "NOPE")).await.unwrap_err();
        assert_eq!(err.message, "Book not found");

        let err = issue_book(&state, request("S9", "X1")).await.unwrap_err();
        assert_eq!(err.message, "Student not found");
        assert_eq!(available(&state).await, 2);
    }

    #[tokio::test]
    async fn test_transactions_listing_is_searchable() {
        let state = library().await;
        issue_book(&state, request("S1", "X1")).await.unwrap();

        let records = get_transactions(&state, Some("ada")).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].book_title.as_deref(), Some("Rust"));
        assert_eq!(records[0].status, TransactionStatus::Issued);

        assert_eq!(get_transactions(&state, Some("issued")).await.unwrap().len(), 1);
        assert!(get_transactions(&state, Some("returned")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_transaction() {
        let state = library().await;
        let err = return_book(&state, 42).await.unwrap_err();
        assert_eq!(err.message, "Transaction not found");
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
