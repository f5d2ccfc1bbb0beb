//! # Book Commands
//!
//! Catalogue maintenance. Copy counts are adjusted here only by edits of
//! `total_copies`; lending moves `available_copies`.

use tracing::{debug, info};

use crate::commands::{required_key, search_query};
use crate::error::ApiError;
use crate::state::{AppState, CacheCategory};
use libris_core::validation::validate_book_input;
use libris_core::{filter_records, Book, BookInput};

/// Book changes also retitle rows in the joined loan listing.
const BOOK_WRITE: &[CacheCategory] = &[
    CacheCategory::Books,
    CacheCategory::Statistics,
    CacheCategory::Transactions,
];

/// Catalogues a book. `available_copies` defaults to `total_copies`.
pub async fn add_book(state: &AppState, input: BookInput) -> Result<(), ApiError> {
    let input = input.normalized();
    validate_book_input(&input)?;

    let db = state.db.acquire().await?;
    let id = db.books().insert(&input).await?;

    state.cache.invalidate(BOOK_WRITE);
    state.saver.schedule();

    info!(
        id,
        isbn = %input.isbn,
        copies = input.total_copies,
        "Book added"
    );
    Ok(())
}

/// Lists books, newest first, optionally filtered.
pub async fn get_books(state: &AppState, query: Option<&str>) -> Result<Vec<Book>, ApiError> {
    let query = search_query(query)?;
    let books = load_books(state).await?;

    debug!(query = %query, total = books.len(), "get_books");
    Ok(filter_records(&books, &query))
}

/// All books, from the cache when fresh.
pub(crate) async fn load_books(state: &AppState) -> Result<Vec<Book>, ApiError> {
    let db = state.db.acquire().await?;
    if let Some(books) = state.cache.books() {
        return Ok(books);
    }

    let books = db.books().list().await?;
    state.cache.store_books(books.clone());
    Ok(books)
}

/// Replaces a book's details and rebalances its available copies by the
/// change in `total_copies`.
///
/// ## Errors
/// `BUSINESS_LOGIC` if the new total is smaller than the copies on loan.
pub async fn update_book(state: &AppState, input: BookInput) -> Result<Book, ApiError> {
    // Availability is derived from the stored counts, never taken from the form.
    let input = BookInput {
        available_copies: None,
        ..input.normalized()
    };
    validate_book_input(&input)?;

    let db = state.db.acquire().await?;
    let book = db.books().update(&input).await?;

    state.cache.invalidate(BOOK_WRITE);
    state.saver.schedule();

    info!(
        isbn = %book.isbn,
        total = book.total_copies,
        available = book.available_copies,
        "Book updated"
    );
    Ok(book)
}

/// Removes a book. Loans naming it stay.
pub async fn delete_book(state: &AppState, isbn: &str) -> Result<(), ApiError> {
    let isbn = required_key("isbn", isbn)?;

    let db = state.db.acquire().await?;
    db.books().delete(&isbn).await?;

    state.cache.invalidate(BOOK_WRITE);
    state.saver.schedule();

    info!(isbn = %isbn, "Book deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn input(isbn: &str, title: &str, total: i64) -> BookInput {
        BookInput {
            isbn: isbn.to_string(),
            title: title.to_string(),
            author: "Ferris".to_string(),
            publisher: None,
            category: Some("Programming".to_string()),
            total_copies: total,
            available_copies: None,
        }
    }

    #[tokio::test]
    async fn test_add_defaults_available_to_total() {
        let state = AppState::in_memory().await;
        add_book(&state, input("B1", "The Book", 3)).await.unwrap();

        let books = get_books(&state, None).await.unwrap();
        assert_eq!(books[0].available_copies, 3);
    }

    #[tokio::test]
    async fn test_search_by_author_and_category() {
        let state = AppState::in_memory().await;
        add_book(&state, input("B1", "Rust in Action", 1)).await.unwrap();
        let mut other = input("B2", "Dune", 1);
        other.author = "Herbert".to_string();
        other.category = Some("Fiction".to_string());
        add_book(&state, other).await.unwrap();

        assert_eq!(get_books(&state, Some("FERRIS")).await.unwrap().len(), 1);
        assert_eq!(get_books(&state, Some("fiction")).await.unwrap()[0].isbn, "B2");
        assert!(get_books(&state, Some("nothing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_rebalances_and_ignores_form_availability() {
        let state = AppState::in_memory().await;
        add_book(&state, input("B1", "The Book", 2)).await.unwrap();

        let mut edit = input("B1", "The Book (2nd ed.)", 5);
        edit.available_copies = Some(0);
        let book = update_book(&state, edit).await.unwrap();

        assert_eq!(book.total_copies, 5);
        assert_eq!(book.available_copies, 5);
        assert_eq!(book.title, "The Book (2nd ed.)");
    }

    #[tokio::test]
    async fn test_negative_copies_rejected() {
        let state = AppState::in_memory().await;
        let err = add_book(&state, input("B1", "The Book", -1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_unknown_book() {
        let state = AppState::in_memory().await;
        let err = delete_book(&state, "nope").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Book not found: nope");
    }
}
