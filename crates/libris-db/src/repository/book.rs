//! # Book Repository
//!
//! Database operations for books.
//!
//! ## Copy Counts on Update
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stored: total 5, available 3   (2 on loan)                             │
//! │                                                                         │
//! │  update total → 7   ──►  available 3 + (7 - 5) = 5                      │
//! │  update total → 2   ──►  available 3 + (2 - 5) = 0                      │
//! │  update total → 1   ──►  available -1  ──► CopiesBelowIssued, no write  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! The read and the write happen inside one SQL transaction.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::lending::rebalance_available;
use libris_core::{Book, BookInput};

const BOOK_COLUMNS: &str =
    "id, isbn, title, author, publisher, category, total_copies, available_copies, created_at";

/// Repository for book database operations.
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    /// Creates a new BookRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Lists every book, newest first.
    pub async fn list(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = books.len(), "Listed books");
        Ok(books)
    }

    /// Gets a book by ISBN.
    pub async fn get_by_isbn(&self, isbn: &str) -> DbResult<Option<Book>> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?1"
        ))
        .bind(isbn)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Inserts a new book. `available_copies` defaults to `total_copies`.
    pub async fn insert(&self, input: &BookInput) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO books (isbn, title, author, publisher, category, total_copies, available_copies)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&input.isbn)
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.publisher)
        .bind(&input.category)
        .bind(input.total_copies)
        .bind(input.initial_available())
        .execute(&self.pool)
        .await?;

        debug!(isbn = %input.isbn, copies = input.total_copies, "Book inserted");
        Ok(result.last_insert_rowid())
    }

    /// Replaces the mutable fields of the book named by `input.isbn` and
    /// shifts `available_copies` by the change in `total_copies`.
    ///
    /// `input.available_copies` is ignored.
    ///
    /// ## Returns
    /// The updated book.
    pub async fn update(&self, input: &BookInput) -> DbResult<Book> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let counts: Option<(i64, i64)> =
            sqlx::query_as("SELECT total_copies, available_copies FROM books WHERE isbn = ?1")
                .bind(&input.isbn)
                .fetch_optional(&mut *tx)
                .await?;

        let (old_total, old_available) =
            counts.ok_or_else(|| DbError::not_found("Book", &input.isbn))?;
        let available = rebalance_available(old_total, old_available, input.total_copies)?;

        sqlx::query(
            "UPDATE books SET title = ?1, author = ?2, publisher = ?3, category = ?4,
                    total_copies = ?5, available_copies = ?6
             WHERE isbn = ?7",
        )
        .bind(&input.title)
        .bind(&input.author)
        .bind(&input.publisher)
        .bind(&input.category)
        .bind(input.total_copies)
        .bind(available)
        .bind(&input.isbn)
        .execute(&mut *tx)
        .await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE isbn = ?1"
        ))
        .bind(&input.isbn)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(
            isbn = %input.isbn,
            total = book.total_copies,
            available = book.available_copies,
            "Book updated"
        );
        Ok(book)
    }

    /// Deletes a book. Transactions naming it are left untouched.
    pub async fn delete(&self, isbn: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?1")
            .bind(isbn)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", isbn));
        }

        debug!(isbn = %isbn, "Book deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{book, database, student};
    use crate::DbError;
    use chrono::Utc;
    use libris_core::CoreError;

    #[tokio::test]
    async fn test_insert_defaults_available_to_total() {
        let db = database().await;
        db.books().insert(&book("X1", "Rust", 3)).await.unwrap();

        let stored = db.books().get_by_isbn("X1").await.unwrap().unwrap();
        assert_eq!(stored.total_copies, 3);
        assert_eq!(stored.available_copies, 3);
    }

    #[tokio::test]
    async fn test_update_shifts_available_by_total_delta() {
        let db = database().await;
        db.students().insert(&student("S1", "Ada")).await.unwrap();
        db.books().insert(&book("X1", "Rust", 3)).await.unwrap();
        db.transactions().issue("S1", "X1", Utc::now()).await.unwrap();

        let mut changed = book("X1", "Rust, 2nd ed.", 5);
        changed.available_copies = Some(0);
        let updated = db.books().update(&changed).await.unwrap();

        assert_eq!(updated.title, "Rust, 2nd ed.");
        assert_eq!(updated.total_copies, 5);
        assert_eq!(updated.available_copies, 4);
    }

    #[tokio::test]
    async fn test_update_below_copies_on_loan_is_rejected() {
        let db = database().await;
        db.students().insert(&student("S1", "Ada")).await.unwrap();
        db.books().insert(&book("X1", "Rust", 1)).await.unwrap();
        db.transactions().issue("S1", "X1", Utc::now()).await.unwrap();

        let err = db.books().update(&book("X1", "Rust", 0)).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(CoreError::CopiesBelowIssued { .. })
        ));

        let stored = db.books().get_by_isbn("X1").await.unwrap().unwrap();
        assert_eq!((stored.total_copies, stored.available_copies), (1, 0));
    }

    #[tokio::test]
    async fn test_unknown_isbn_is_not_found() {
        let db = database().await;
        assert!(matches!(
            db.books().update(&book("X9", "Nope", 1)).await,
            Err(DbError::NotFound { .. })
        ));
        assert!(matches!(
            db.books().delete("X9").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
