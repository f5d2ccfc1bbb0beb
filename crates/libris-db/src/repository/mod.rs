//! # Repository Module
//!
//! Database repository implementations for Libris.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command                                                               │
//! │       │                                                                 │
//! │       │  db.transactions().issue("S1", "X1", now)                      │
//! │       ▼                                                                 │
//! │  TransactionRepository                                                 │
//! │  ├── reads the facts inside one SQL transaction                        │
//! │  ├── asks libris_core::lending whether the move is allowed             │
//! │  └── writes and commits (or rolls back on any failure)                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  In-memory SQLite                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`StudentRepository`](student::StudentRepository) - Student CRUD
//! - [`BookRepository`](book::BookRepository) - Book CRUD and copy rebalancing
//! - [`TransactionRepository`](transaction::TransactionRepository) - Issue, return, delete, listings
//! - [`StatisticsRepository`](stats::StatisticsRepository) - Dashboard counters

pub mod book;
pub mod stats;
pub mod student;
pub mod transaction;

/// Shared fixtures for repository tests.
#[cfg(test)]
pub(crate) mod test_support {
    use libris_core::{BookInput, StudentInput};

    use crate::{Database, DbConfig};

    pub async fn database() -> Database {
        Database::open(DbConfig::in_memory()).await.unwrap()
    }

    pub fn student(id: &str, name: &str) -> StudentInput {
        StudentInput {
            student_id: id.into(),
            name: name.into(),
            email: format!("{}@school.edu", id.to_lowercase()),
            department: Some("Science".into()),
            ..Default::default()
        }
    }

    pub fn book(isbn: &str, title: &str, total: i64) -> BookInput {
        BookInput {
            isbn: isbn.into(),
            title: title.into(),
            author: "Ferris".into(),
            total_copies: total,
            ..Default::default()
        }
    }
}
