//! # Commands Module
//!
//! Every operation the UI process can request.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (shared helpers)
//! ├── student.rs      ◄─── addStudent, getStudents, updateStudent, deleteStudent
//! ├── book.rs         ◄─── addBook, getBooks, updateBook, deleteBook
//! ├── lending.rs      ◄─── issueBook, returnBook, deleteTransaction,
//! │                        getTransactions, getStudentBooks
//! ├── stats.rs        ◄─── getStatistics
//! └── maintenance.rs  ◄─── exportToExcel, backupDatabase, restoreDatabase,
//!                          flush, getConfig
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  READ  getBooks({query})                                                │
//! │    acquire store lock                                                   │
//! │      cache fresh? ── yes ──► use cached Vec<Book>                       │
//! │           │ no                                                          │
//! │           ▼                                                             │
//! │      load from store, refill slot                                       │
//! │    release                                                              │
//! │    filter in memory by query ──► Vec<Book>                              │
//! │                                                                         │
//! │  WRITE  issueBook({studentId, isbn})                                    │
//! │    validate input (no lock yet)                                         │
//! │    acquire store lock                                                   │
//! │      repository call (checks + writes in one store transaction)        │
//! │      invalidate cache categories                                        │
//! │      schedule a debounced save                                          │
//! │    release ──► Ok(()) ──► {"success": true}                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are plain async functions over [`AppState`](crate::state::AppState);
//! [`crate::ipc`] decodes payloads and shapes the replies.

pub mod book;
pub mod lending;
pub mod maintenance;
pub mod stats;
pub mod student;

use libris_core::validation::validate_search_query;
use libris_core::ValidationError;

use crate::error::ApiError;

/// Trims a search query and rejects overly long ones.
pub(crate) fn search_query(query: Option<&str>) -> Result<String, ApiError> {
    Ok(validate_search_query(query.unwrap_or(""))?)
}

/// Trims a business key, rejecting blanks.
pub(crate) fn required_key(field: &str, value: &str) -> Result<String, ApiError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        }
        .into());
    }
    Ok(value.to_string())
}
