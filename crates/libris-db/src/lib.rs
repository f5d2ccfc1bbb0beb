//! # libris-db: Database Layer for Libris
//!
//! This crate provides database access for Libris. The live database is an
//! in-memory SQLite instance driven through sqlx; its durable form is a
//! single SQLite file that is loaded at startup and rewritten on demand.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Data Flow                                 │
//! │                                                                         │
//! │  Command (issueBook)                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     libris-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                │   │              │  │   │
//! │  │   │ in-memory     │◄───│ StudentRepo    │   │ CREATE ...   │  │   │
//! │  │   │ export/flush  │    │ BookRepo       │   │ IF NOT EXISTS│  │   │
//! │  │   │ query/execute │    │ TransactionRepo│   │ due_date col │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              library.db (per-user data directory)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Live database handle, snapshot load / export / flush
//! - [`migrations`] - Idempotent schema setup
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libris_db::{Database, DbConfig};
//!
//! let db = Database::open(DbConfig::new("library.db")).await?;
//! let loan = db.transactions().issue("S1", "978-0", Utc::now()).await?;
//! db.persist().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, SqlParam};

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::stats::StatisticsRepository;
pub use repository::student::StudentRepository;
pub use repository::transaction::TransactionRepository;
