//! # libris-core: Pure Library Rules for Libris
//!
//! This crate holds the domain of a small school library: who may borrow,
//! what can be lent, and how copy counts move. Everything here is a pure
//! function over plain values.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI process (out of tree)                     │   │
//! │  │    Students tab ─► Books tab ─► Issue/Return tab ─► Reports    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON lines over stdin/stdout           │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/desktop commands                        │   │
//! │  │    addStudent, issueBook, returnBook, getStatistics, ...        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ libris-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  lending  │  │  filter   │  │ validation│  │   │
//! │  │   │  Student  │  │ issue     │  │ substring │  │   rules   │  │   │
//! │  │   │  Book     │  │ return    │  │ search    │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    libris-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Student, Book, Transaction, Statistics)
//! - [`lending`] - Issue / return / delete rules and copy arithmetic
//! - [`filter`] - Case-insensitive substring filtering of lists
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use libris_core::lending::due_date;
//!
//! let issued = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
//! let due = due_date(issued);
//! assert_eq!(due, Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod filter;
pub mod lending;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{filter_records, Searchable};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Loan period in days: a book issued now is due back this many days later.
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// How long a cached list or statistics snapshot stays fresh.
///
/// Short enough that a stale read is never visible to a human switching
/// tabs, long enough to absorb the burst of reads a screen refresh makes.
pub const DEFAULT_CACHE_TTL_MS: u64 = 500;

/// Quiet period after the last write before the snapshot is written to disk.
pub const DEFAULT_SAVE_DEBOUNCE_MS: u64 = 300;

/// Maximum length of a free-text search query.
pub const MAX_QUERY_LENGTH: usize = 100;
