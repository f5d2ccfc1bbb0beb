//! # Database State
//!
//! Holds the live `Database` behind the single store lock.
//!
//! ## Locking
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  tokio::sync::Mutex<Option<Database>>                                   │
//! │                                                                         │
//! │  issueBook ──► acquire() ──► checks + writes + invalidate ──► release   │
//! │  getBooks  ──► acquire() ──► cache miss? load + refill    ──► release   │
//! │  saver     ──► lock()    ──► export + write file          ──► release   │
//! │  restore   ──► lock()    ──► swap in the reopened Database ──► release  │
//! │                                                                         │
//! │  None = the database failed to open; every command gets UNAVAILABLE.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! One workflow step runs at a time, so the checks of an issue can never
//! interleave with another command's writes.

use std::sync::Mutex as StdMutex;

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::{error, info};

use crate::error::ApiError;
use libris_db::{Database, DbConfig};

/// Slot for the live database plus the reason it is empty, if it is.
#[derive(Debug, Default)]
pub struct DbState {
    db: Mutex<Option<Database>>,
    init_error: StdMutex<Option<String>>,
}

impl DbState {
    /// Creates a DbState around an already-open database.
    pub fn new(db: Database) -> Self {
        DbState {
            db: Mutex::new(Some(db)),
            init_error: StdMutex::new(None),
        }
    }

    /// Opens the database, recording (not propagating) a failure.
    ///
    /// The process keeps running without a store so the UI can still show
    /// the error; every command then fails with `UNAVAILABLE`.
    pub async fn initialize(config: DbConfig) -> Self {
        match Database::open(config).await {
            Ok(db) => {
                info!("Database ready");
                DbState::new(db)
            }
            Err(e) => {
                error!(error = %e, "Database failed to open");
                DbState {
                    db: Mutex::new(None),
                    init_error: StdMutex::new(Some(e.to_string())),
                }
            }
        }
    }

    /// Locks the store for one workflow step.
    ///
    /// ## Errors
    /// `UNAVAILABLE` if there is no open database.
    pub async fn acquire(&self) -> Result<MappedMutexGuard<'_, Database>, ApiError> {
        let guard = self.db.lock().await;
        MutexGuard::try_map(guard, Option::as_mut).map_err(|_| {
            let reason = self
                .init_error
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .clone();
            ApiError::unavailable(reason.as_deref())
        })
    }

    /// Locks the raw slot (saver, restore and shutdown need to see `None`).
    pub async fn lock(&self) -> MutexGuard<'_, Option<Database>> {
        self.db.lock().await
    }

    /// Records why the slot is empty.
    pub fn set_init_error(&self, reason: Option<String>) {
        *self
            .init_error
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = reason;
    }
}
