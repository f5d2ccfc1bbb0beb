//! # Libris Desktop Library
//!
//! Backend process of the Libris library manager. The UI process talks to it
//! over stdin/stdout; this crate owns the state and runs the commands.
//!
//! ## Module Organization
//! ```text
//! libris_desktop_lib/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── ipc.rs          ◄─── JSON-lines protocol and dispatch
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── db.rs       ◄─── Store lock around the live Database
//! │   ├── cache.rs    ◄─── TTL read cache
//! │   ├── persistence.rs ◄─ Debounced snapshot saver
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Shared helpers
//! │   ├── student.rs  ◄─── Student CRUD
//! │   ├── book.rs     ◄─── Book CRUD
//! │   ├── lending.rs  ◄─── Issue / return / history
//! │   ├── stats.rs    ◄─── Dashboard statistics
//! │   └── maintenance.rs ◄─ Export, backup, restore, flush
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod ipc;
pub mod state;

use tracing::info;
use tracing_subscriber::EnvFilter;

use state::{AppState, ConfigState};

/// Runs the backend until the UI goes away.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Application Startup                               │
/// │                                                                         │
/// │  1. Initialize Logging ───────────────────────────────────────────────► │
/// │     • tracing-subscriber with env filter, written to stderr             │
/// │     • Default: info,libris=debug,sqlx=warn (override with RUST_LOG)     │
/// │                                                                         │
/// │  2. Load Configuration ───────────────────────────────────────────────► │
/// │     • LIBRIS_DB_PATH, LIBRIS_CACHE_TTL_MS, LIBRIS_SAVE_DEBOUNCE_MS      │
/// │     • Linux: ~/.local/share/library/library.db                          │
/// │                                                                         │
/// │  3. Open Database ────────────────────────────────────────────────────► │
/// │     • In-memory SQLite, loaded from the snapshot if present             │
/// │     • Failure is logged; commands then answer UNAVAILABLE               │
/// │                                                                         │
/// │  4. Serve ────────────────────────────────────────────────────────────► │
/// │     • Until stdin closes, a shutdown command, or Ctrl-C                 │
/// │                                                                         │
/// │  5. Shut Down ────────────────────────────────────────────────────────► │
/// │     • Save pending writes, stop the save worker                         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run() -> std::io::Result<()> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Libris backend");

    let config = ConfigState::from_env();
    let state = AppState::initialize(config).await;

    let served = tokio::select! {
        result = ipc::serve(&state) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted");
            Ok(())
        }
    };

    state.shutdown().await;
    served
}

/// Initializes the tracing subscriber for structured logging.
///
/// stdout carries the protocol, so logs go to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=libris=trace` - Show trace for libris crates only
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,libris=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
