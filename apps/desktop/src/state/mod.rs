//! # State Module
//!
//! Everything a command needs, gathered in one explicit context object that
//! is passed to every command by reference.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │                          AppState                                       │
//! │                              │                                          │
//! │     ┌──────────────┬─────────┴────────┬──────────────────┐              │
//! │     ▼              ▼                  ▼                  ▼              │
//! │  ┌──────────┐  ┌──────────────┐  ┌──────────────┐  ┌──────────────┐    │
//! │  │ DbState  │  │ CacheState   │  │ SaveHandle   │  │ ConfigState  │    │
//! │  │          │  │              │  │              │  │              │    │
//! │  │ Mutex<   │  │ Mutex<       │  │ channel to   │  │ paths, TTL,  │    │
//! │  │ Option<  │  │  ReadCache>  │  │ the save     │  │ debounce     │    │
//! │  │ Database>│  │              │  │ worker       │  │              │    │
//! │  └──────────┘  └──────────────┘  └──────────────┘  └──────────────┘    │
//! │       ▲                                  │                              │
//! │       └──────── Arc (worker saves) ──────┘                              │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • DbState: one async mutex; one workflow step at a time               │
//! │  • CacheState: std mutex, only held for field operations               │
//! │  • SaveHandle: unbounded sender, never blocks                          │
//! │  • ConfigState: read-only after initialization                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cache;
mod config;
mod db;
mod persistence;

use std::sync::Arc;

use libris_db::DbConfig;
use tracing::{error, info};

pub use cache::{CacheCategory, CacheState, ReadCache, Slot};
pub use config::{ConfigState, DATABASE_FILE_NAME};
pub use db::DbState;
pub use persistence::{SaveHandle, SaveScheduler};

/// The application context.
#[derive(Debug)]
pub struct AppState {
    pub db: Arc<DbState>,
    pub cache: CacheState,
    pub saver: SaveHandle,
    pub config: ConfigState,
}

impl AppState {
    /// Opens the database and starts the save worker.
    ///
    /// Must run inside a tokio runtime. A database that fails to open does
    /// not fail startup; see [`DbState::initialize`].
    pub async fn initialize(config: ConfigState) -> Self {
        info!(path = %config.database_path.display(), "Initializing application state");

        let db = Arc::new(DbState::initialize(DbConfig::new(&config.database_path)).await);
        Self::assemble(db, config)
    }

    /// State over a purely in-memory database (for testing).
    pub async fn in_memory() -> Self {
        let config = ConfigState::default();
        let db = Arc::new(DbState::initialize(DbConfig::in_memory()).await);
        Self::assemble(db, config)
    }

    fn assemble(db: Arc<DbState>, config: ConfigState) -> Self {
        let saver = SaveScheduler::new(db.clone(), config.save_debounce()).start();
        AppState {
            db,
            cache: CacheState::new(config.cache_ttl()),
            saver,
            config,
        }
    }

    /// Saves anything pending and stops the save worker.
    pub async fn shutdown(&self) {
        if let Err(e) = self.saver.shutdown().await {
            error!(error = %e, "Final save failed");
        }
        info!("Application state shut down");
    }
}
