//! # Transaction Repository
//!
//! The lending workflow: issue, return, delete, and the loan listings.
//!
//! ## Atomicity
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    issue(student_id, isbn, now)                         │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    read: active loan? book copies? student exists?                     │
//! │    libris_core::lending::check_issue(facts)  ── Err ──► ROLLBACK       │
//! │    INSERT transactions (issued, now, now + 14d)                        │
//! │    UPDATE books SET available_copies - 1 WHERE available > 0           │
//! │         └── 0 rows? ───────────────────────────────────► ROLLBACK      │
//! │  COMMIT                                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Dropping an uncommitted `sqlx::Transaction` rolls it back, so every early
//! `?` return leaves the database untouched.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use libris_core::lending::{self, IssueFacts};
use libris_core::{ActiveLoan, CoreError, LoanRecord, Transaction, TransactionStatus};

const TRANSACTION_COLUMNS: &str =
    "id, student_id, isbn, issue_date, due_date, return_date, status";

/// Repository for the lending workflow.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    async fn begin(&self) -> DbResult<sqlx::Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))
    }

    /// Gets a transaction by id.
    pub async fn get(&self, id: i64) -> DbResult<Option<Transaction>> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(transaction)
    }

    /// Issues a copy of `isbn` to `student_id`.
    ///
    /// ## Errors
    /// In check order: [`CoreError::DuplicateActiveLoan`],
    /// [`CoreError::BookNotFound`], [`CoreError::NoCopiesAvailable`],
    /// [`CoreError::StudentNotFound`], all wrapped in [`DbError::Rejected`].
    pub async fn issue(
        &self,
        student_id: &str,
        isbn: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Transaction> {
        let mut tx = self.begin().await?;

        let has_active_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM transactions
                WHERE student_id = ?1 AND isbn = ?2 AND status = 'issued'
            )",
        )
        .bind(student_id)
        .bind(isbn)
        .fetch_one(&mut *tx)
        .await?;

        let available_copies: Option<i64> =
            sqlx::query_scalar("SELECT available_copies FROM books WHERE isbn = ?1")
                .bind(isbn)
                .fetch_optional(&mut *tx)
                .await?;

        let student_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM students WHERE student_id = ?1)")
                .bind(student_id)
                .fetch_one(&mut *tx)
                .await?;

        lending::check_issue(&IssueFacts {
            has_active_loan,
            available_copies,
            student_exists,
        })?;

        let due = lending::due_date(now);
        let id = sqlx::query(
            "INSERT INTO transactions (student_id, isbn, issue_date, due_date, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(student_id)
        .bind(isbn)
        .bind(now)
        .bind(due)
        .bind(TransactionStatus::Issued)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        let decremented = sqlx::query(
            "UPDATE books SET available_copies = available_copies - 1
             WHERE isbn = ?1 AND available_copies > 0",
        )
        .bind(isbn)
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() != 1 {
            // tx drops here and rolls back the insert
            return Err(CoreError::NoCopiesAvailable.into());
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id, student_id, isbn, due = %due, "Book issued");
        Ok(Transaction {
            id,
            student_id: student_id.to_string(),
            isbn: isbn.to_string(),
            issue_date: now,
            due_date: Some(due),
            return_date: None,
            status: TransactionStatus::Issued,
        })
    }

    /// Marks a loan returned and puts the copy back on the shelf.
    ///
    /// If the book has since been deleted the loan is still closed; there is
    /// simply no shelf to return the copy to.
    pub async fn return_loan(&self, id: i64, now: DateTime<Utc>) -> DbResult<Transaction> {
        let mut tx = self.begin().await?;

        let found: Option<(String, TransactionStatus)> =
            sqlx::query_as("SELECT isbn, status FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        lending::check_return(found.as_ref().map(|(_, status)| *status))?;
        let isbn = found.map(|(isbn, _)| isbn).unwrap_or_default();

        sqlx::query("UPDATE transactions SET status = ?1, return_date = ?2 WHERE id = ?3")
            .bind(TransactionStatus::Returned)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let shelf: Option<(i64, i64)> =
            sqlx::query_as("SELECT available_copies, total_copies FROM books WHERE isbn = ?1")
                .bind(&isbn)
                .fetch_optional(&mut *tx)
                .await?;

        match shelf {
            None => warn!(id, isbn = %isbn, "Returned loan names a book that no longer exists"),
            Some((available, total)) if available >= total => warn!(
                id,
                isbn = %isbn,
                available,
                total,
                "Book already fully stocked; available copies capped at total"
            ),
            Some(_) => {}
        }

        sqlx::query(
            "UPDATE books SET available_copies = MIN(available_copies + 1, total_copies)
             WHERE isbn = ?1",
        )
        .bind(&isbn)
        .execute(&mut *tx)
        .await?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"
        ))
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id, isbn = %isbn, "Book returned");
        Ok(transaction)
    }

    /// Deletes a returned transaction record. Copy counts are not touched.
    ///
    /// Deliberately tighter than an unconditional delete: an unknown id is
    /// rejected with `TransactionNotFound` and an `issued` loan with
    /// `ActiveLoanNotDeletable` (see [`lending::check_delete`]).
    pub async fn delete(&self, id: i64) -> DbResult<()> {
        let mut tx = self.begin().await?;

        let status: Option<TransactionStatus> =
            sqlx::query_scalar("SELECT status FROM transactions WHERE id = ?1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        lending::check_delete(id, status)?;

        sqlx::query("DELETE FROM transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(id, "Transaction deleted");
        Ok(())
    }

    /// Every transaction with the borrower's name and the book's title,
    /// most recently issued first.
    pub async fn list_with_details(&self) -> DbResult<Vec<LoanRecord>> {
        let records = sqlx::query_as::<_, LoanRecord>(
            "SELECT t.id, t.student_id, s.name AS student_name, t.isbn, b.title AS book_title,
                    t.issue_date, t.due_date, t.return_date, t.status
             FROM transactions t
             LEFT JOIN students s ON t.student_id = s.student_id
             LEFT JOIN books b ON t.isbn = b.isbn
             ORDER BY t.issue_date DESC, t.id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Listed transactions");
        Ok(records)
    }

    /// Unreturned loans of one student, most recent first.
    pub async fn active_loans_for(&self, student_id: &str) -> DbResult<Vec<ActiveLoan>> {
        let loans = sqlx::query_as::<_, ActiveLoan>(
            "SELECT t.id, t.isbn, b.title, b.author, t.issue_date, t.due_date, t.status
             FROM transactions t
             LEFT JOIN books b ON t.isbn = b.isbn
             WHERE t.student_id = ?1 AND t.status = 'issued'
             ORDER BY t.issue_date DESC, t.id DESC",
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
