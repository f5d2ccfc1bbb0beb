//! # Database Handle & Snapshot Management
//!
//! Opens the live in-memory database and moves it to and from the
//! `library.db` snapshot file.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Live Database + Snapshot                           │
//! │                                                                         │
//! │  Startup                                                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::open(DbConfig::new(path))                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │   SqlitePool (sqlite::memory:)          │                           │
//! │  │   exactly ONE connection, never reaped  │  ← all reads and writes  │
//! │  └─────────────────────────────────────────┘                           │
//! │       ▲                         │                                       │
//! │       │ load (ATTACH + copy)    │ export (VACUUM INTO scratch file)     │
//! │       │                         ▼                                       │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │   library.db  (snapshot on disk)        │  ← flush: write tmp,     │
//! │  └─────────────────────────────────────────┘     rename over target    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why One Connection
//! Each `sqlite::memory:` connection is its own private database. The pool
//! is pinned to a single connection with no idle timeout or lifetime, so the
//! data lives exactly as long as the `Database`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Arguments, Connection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::migrations::{self, TABLE_COLUMNS};
use crate::repository::book::BookRepository;
use crate::repository::stats::StatisticsRepository;
use crate::repository::student::StudentRepository;
use crate::repository::transaction::TransactionRepository;

const SNAPSHOT_SCHEMA: &str = "snapshot";

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/library.db")
///     .connect_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path of the snapshot file. `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,

    /// How long a command waits for the connection.
    /// Default: 30 seconds
    pub connect_timeout: Duration,
}

impl DbConfig {
    /// Creates a configuration backed by the snapshot file at `path`.
    ///
    /// The file does not need to exist; it is created on the first flush.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: Some(path.into()),
            connect_timeout: Duration::from_secs(30),
        }
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Creates a purely in-memory configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::open(DbConfig::in_memory()).await?;
    /// // nothing ever touches the disk
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: None,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// SQL Parameters
// =============================================================================

/// A bindable value for the generic [`Database::query`] / [`Database::execute`]
/// primitives.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        SqlParam::Integer(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        SqlParam::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        SqlParam::Text(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlParam::Null, Into::into)
    }
}

fn bind_params<'q>(params: &[SqlParam]) -> DbResult<SqliteArguments<'q>> {
    let mut args = SqliteArguments::default();
    for param in params {
        let added = match param.clone() {
            SqlParam::Null => args.add(None::<String>),
            SqlParam::Integer(v) => args.add(v),
            SqlParam::Real(v) => args.add(v),
            SqlParam::Text(v) => args.add(v),
            SqlParam::Blob(v) => args.add(v),
        };
        added.map_err(|e| DbError::Internal(format!("Failed to bind parameter: {e}")))?;
    }
    Ok(args)
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::open(DbConfig::new(path)).await?;
/// let students = db.students().list().await?;
/// db.persist().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The single-connection in-memory pool.
    pool: SqlitePool,

    /// Where `persist` writes the snapshot.
    snapshot_path: Option<PathBuf>,
}

impl Database {
    /// Opens the live database.
    ///
    /// ## What This Does
    /// 1. Creates an empty in-memory database on one pinned connection
    /// 2. Applies the schema to it
    /// 3. If the snapshot file exists, attaches it, migrates it, and copies
    ///    every row into memory
    ///
    /// ## Returns
    /// * `Ok(Database)` - Ready-to-use database handle
    /// * `Err(DbError)` - Connection, migration or load failed
    pub async fn open(config: DbConfig) -> DbResult<Self> {
        info!(
            path = ?config.database_path,
            "Initializing in-memory database"
        );

        // Foreign keys stay off: loans outlive the students and books they name.
        let connect_options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database {
            pool,
            snapshot_path: config.database_path,
        };

        {
            let mut conn = db.pool.acquire().await?;
            migrations::run_migrations(&mut conn, "main").await?;
        }

        if let Some(path) = db.snapshot_path.clone() {
            if tokio::fs::try_exists(&path).await? {
                db.load_snapshot(&path).await?;
            } else {
                info!(path = %path.display(), "No snapshot yet, starting empty");
            }
        }

        Ok(db)
    }

    /// Copies every row of the snapshot file into the live database.
    async fn load_snapshot(&self, path: &Path) -> DbResult<()> {
        info!(path = %path.display(), "Loading snapshot");

        let mut conn = self.pool.acquire().await?;

        sqlx::query("ATTACH DATABASE ?1 AS snapshot")
            .bind(path.to_string_lossy().into_owned())
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::ConnectionFailed(format!("Cannot open snapshot: {e}")))?;

        let copied = async {
            migrations::run_migrations(&mut conn, SNAPSHOT_SCHEMA).await?;

            let mut tx = conn.begin().await?;
            for (table, columns) in TABLE_COLUMNS {
                let result = sqlx::query(&format!(
                    "INSERT INTO main.{table} ({columns}) SELECT {columns} FROM {SNAPSHOT_SCHEMA}.{table}"
                ))
                .execute(&mut *tx)
                .await?;
                debug!(table, rows = result.rows_affected(), "Copied table from snapshot");
            }
            tx.commit()
                .await
                .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
            Ok::<_, DbError>(())
        }
        .await;

        // Detach even when the copy failed so the handle stays usable.
        if let Err(e) = sqlx::query("DETACH DATABASE snapshot")
            .execute(&mut *conn)
            .await
        {
            warn!(error = %e, "Failed to detach snapshot");
        }

        copied
    }

    /// Runs a parameterized statement and returns its rows.
    pub async fn query(&self, sql: &str, params: &[SqlParam]) -> DbResult<Vec<SqliteRow>> {
        let rows = sqlx::query_with(sql, bind_params(params)?)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Runs a parameterized statement and returns the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[SqlParam]) -> DbResult<u64> {
        let result = sqlx::query_with(sql, bind_params(params)?)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Serializes the whole database to SQLite file bytes.
    ///
    /// `VACUUM INTO` writes a compact copy to a scratch file, which is read
    /// back and removed.
    pub async fn export(&self) -> DbResult<Vec<u8>> {
        let scratch = std::env::temp_dir().join(format!("libris-export-{}.db", Uuid::new_v4()));

        sqlx::query("VACUUM INTO ?1")
            .bind(scratch.to_string_lossy().into_owned())
            .execute(&self.pool)
            .await?;

        let bytes = tokio::fs::read(&scratch).await;
        if let Err(e) = tokio::fs::remove_file(&scratch).await {
            warn!(path = %scratch.display(), error = %e, "Failed to remove export scratch file");
        }

        let bytes = bytes?;
        debug!(bytes = bytes.len(), "Database exported");
        Ok(bytes)
    }

    /// Writes snapshot bytes to `path`.
    ///
    /// The bytes go to a sibling `.partial` file first and are renamed over
    /// the target, so a crash mid-write never leaves a truncated snapshot.
    pub async fn flush(path: &Path, bytes: &[u8]) -> DbResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        let partial = PathBuf::from(partial);

        tokio::fs::write(&partial, bytes).await?;
        tokio::fs::rename(&partial, path).await?;

        debug!(path = %path.display(), bytes = bytes.len(), "Snapshot flushed");
        Ok(())
    }

    /// Exports the database and flushes it to the configured snapshot path.
    ///
    /// A no-op for in-memory configurations.
    pub async fn persist(&self) -> DbResult<()> {
        let Some(path) = self.snapshot_path.as_deref() else {
            return Ok(());
        };

        let bytes = self.export().await?;
        Self::flush(path, &bytes).await?;
        info!(path = %path.display(), "Database saved");
        Ok(())
    }

    /// The snapshot file this database persists to, if any.
    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot_path.as_deref()
    }

    /// Returns a reference to the connection pool.
    ///
    /// Prefer repository methods when available.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Returns the student repository.
    pub fn students(&self) -> StudentRepository {
        StudentRepository::new(self.pool.clone())
    }

    /// Returns the book repository.
    pub fn books(&self) -> BookRepository {
        BookRepository::new(self.pool.clone())
    }

    /// Returns the transaction (loan) repository.
    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// Returns the statistics repository.
    pub fn statistics(&self) -> StatisticsRepository {
        StatisticsRepository::new(self.pool.clone())
    }

    /// Closes the pool. The in-memory data is gone afterwards.
    pub async fn close(&self) {
        info!("Closing database");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Row;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        assert!(db.health_check().await);
        assert!(db.snapshot_path().is_none());
        // persist is a no-op without a path
        db.persist().await.unwrap();
    }

    #[tokio::test]
    async fn test_query_and_execute_primitives() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();

        let affected = db
            .execute(
                "INSERT INTO students (student_id, name, email, phone) VALUES (?1, ?2, ?3, ?4)",
                &[
                    "S1".into(),
                    "Ada".into(),
                    "ada@example.com".into(),
                    SqlParam::Null,
                ],
            )
            .await
            .unwrap();
        assert_eq!(affected, 1);

        let rows = db
            .query(
                "SELECT name, phone FROM students WHERE student_id = ?1",
                &["S1".into()],
            )
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get::<String, _>("name"), "Ada");
        assert_eq!(rows[0].get::<Option<String>, _>("phone"), None);
    }

    #[tokio::test]
    async fn test_sql_errors_keep_sqlite_message() {
        let db = Database::open(DbConfig::in_memory()).await.unwrap();
        let insert = "INSERT INTO books (isbn, title, author) VALUES (?1, 'T', 'A')";

        db.execute(insert, &["X1".into()]).await.unwrap();
        let err = db.execute(insert, &["X1".into()]).await.unwrap_err();

        assert!(err.to_string().contains("UNIQUE constraint failed"));
    }

    #[tokio::test]
    async fn test_persist_and_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("library.db");

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        db.execute(
            "INSERT INTO books (isbn, title, author, total_copies, available_copies)
             VALUES ('X1', 'Rust', 'Ferris', 2, 1)",
            &[],
        )
        .await
        .unwrap();
        db.persist().await.unwrap();
        db.close().await;

        assert!(path.exists());
        let mut partial = path.as_os_str().to_owned();
        partial.push(".partial");
        assert!(!PathBuf::from(partial).exists());

        let reopened = Database::open(DbConfig::new(&path)).await.unwrap();
        let books = reopened.books().list().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].isbn, "X1");
        assert_eq!(books[0].available_copies, 1);
    }

    #[tokio::test]
    async fn test_legacy_snapshot_is_migrated_on_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.db");

        {
            let options = SqliteConnectOptions::new()
                .filename(&path)
                .create_if_missing(true);
            let mut conn = sqlx::SqliteConnection::connect_with(&options).await.unwrap();
            sqlx::query(
                "CREATE TABLE transactions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    student_id TEXT NOT NULL,
                    isbn TEXT NOT NULL,
                    issue_date DATETIME DEFAULT CURRENT_TIMESTAMP,
                    return_date DATETIME,
                    status TEXT DEFAULT 'issued'
                )",
            )
            .execute(&mut conn)
            .await
            .unwrap();
            sqlx::query(
                "INSERT INTO transactions (student_id, isbn, issue_date, status)
                 VALUES ('S1', 'X1', '2023-09-01 10:00:00', 'returned')",
            )
            .execute(&mut conn)
            .await
            .unwrap();
            conn.close().await.unwrap();
        }

        let db = Database::open(DbConfig::new(&path)).await.unwrap();
        let loans = db.transactions().list_with_details().await.unwrap();

        assert_eq!(loans.len(), 1);
        assert_eq!(loans[0].due_date, None);
        assert_eq!(loans[0].student_name, None);
        assert!(db.students().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("library.db");

        Database::flush(&path, b"first").await.unwrap();
        Database::flush(&path, b"second").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"second");
    }
}
