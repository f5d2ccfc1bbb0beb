//! # Schema & Migrations
//!
//! Idempotent schema setup for a library database.
//!
//! ## How Migrations Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Migration Process                                  │
//! │                                                                         │
//! │  Database::open                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run_migrations(conn, "main")      ← fresh in-memory database          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ATTACH library.db AS snapshot     ← only when the file exists         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  run_migrations(conn, "snapshot")  ← upgrades older files in place     │
//! │       │                                                                 │
//! │       ├── CREATE TABLE IF NOT EXISTS students / books / transactions   │
//! │       ├── CREATE INDEX IF NOT EXISTS ...                               │
//! │       └── transactions.due_date missing? ALTER TABLE ... ADD COLUMN    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  copy rows snapshot → main, DETACH                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every statement is safe to run any number of times, so there is no
//! migration bookkeeping table. A schema change adds another idempotent step
//! at the end of [`run_migrations`].

use sqlx::{Row, SqliteConnection};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Columns copied between schemas, in table order.
///
/// Copies name their columns so that a file migrated with
/// `ALTER TABLE ... ADD COLUMN` (where `due_date` sits last) lines up with a
/// freshly created table.
pub const TABLE_COLUMNS: &[(&str, &str)] = &[
    (
        "students",
        "id, student_id, name, email, phone, department, year, created_at",
    ),
    (
        "books",
        "id, isbn, title, author, publisher, category, total_copies, available_copies, created_at",
    ),
    (
        "transactions",
        "id, student_id, isbn, issue_date, due_date, return_date, status",
    ),
];

/// Creates tables and indexes in `schema` and applies column migrations.
///
/// ## Arguments
/// * `conn` - Connection the schema is attached to
/// * `schema` - `main` or the name of an attached database
pub async fn run_migrations(conn: &mut SqliteConnection, schema: &str) -> DbResult<()> {
    info!(schema, "Applying library schema");

    for statement in schema_statements(schema) {
        sqlx::query(&statement)
            .execute(&mut *conn)
            .await
            .map_err(|e| DbError::MigrationFailed(e.to_string()))?;
    }

    add_due_date_column(conn, schema).await?;

    debug!(schema, "Schema up to date");
    Ok(())
}

fn schema_statements(schema: &str) -> Vec<String> {
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.students (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id TEXT UNIQUE NOT NULL,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                phone TEXT,
                department TEXT,
                year TEXT,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.books (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                isbn TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                publisher TEXT,
                category TEXT,
                total_copies INTEGER DEFAULT 1,
                available_copies INTEGER DEFAULT 1,
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )"
        ),
        // student_id / isbn reference the business keys. Foreign keys are
        // never switched on, so deleting a student or book leaves its loans.
        format!(
            "CREATE TABLE IF NOT EXISTS {schema}.transactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                student_id TEXT NOT NULL,
                isbn TEXT NOT NULL,
                issue_date DATETIME DEFAULT CURRENT_TIMESTAMP,
                due_date DATETIME,
                return_date DATETIME,
                status TEXT DEFAULT 'issued',
                FOREIGN KEY (student_id) REFERENCES students(student_id),
                FOREIGN KEY (isbn) REFERENCES books(isbn)
            )"
        ),
        format!("CREATE INDEX IF NOT EXISTS {schema}.idx_student_id ON students(student_id)"),
        format!("CREATE INDEX IF NOT EXISTS {schema}.idx_book_isbn ON books(isbn)"),
        format!(
            "CREATE INDEX IF NOT EXISTS {schema}.idx_trans_student ON transactions(student_id)"
        ),
        format!("CREATE INDEX IF NOT EXISTS {schema}.idx_trans_isbn ON transactions(isbn)"),
        format!("CREATE INDEX IF NOT EXISTS {schema}.idx_trans_status ON transactions(status)"),
    ]
}

/// Files written before loans had due dates lack the column.
async fn add_due_date_column(conn: &mut SqliteConnection, schema: &str) -> DbResult<()> {
    let columns = sqlx::query(&format!("PRAGMA {schema}.table_info(transactions)"))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;

    let has_due_date = columns
        .iter()
        .any(|row| row.try_get::<String, _>("name").is_ok_and(|name| name == "due_date"));

    if !has_due_date {
        info!(schema, "Adding transactions.due_date column");
        sqlx::query(&format!(
            "ALTER TABLE {schema}.transactions ADD COLUMN due_date DATETIME"
        ))
        .execute(&mut *conn)
        .await
        .map_err(|e| DbError::MigrationFailed(e.to_string()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Connection;

    async fn column_names(conn: &mut SqliteConnection) -> Vec<String> {
        sqlx::query("PRAGMA main.table_info(transactions)")
            .fetch_all(&mut *conn)
            .await
            .unwrap()
            .iter()
            .map(|row| row.get::<String, _>("name"))
            .collect()
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();

        run_migrations(&mut conn, "main").await.unwrap();
        run_migrations(&mut conn, "main").await.unwrap();

        let indexes: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'index' AND name LIKE 'idx_%'",
        )
        .fetch_one(&mut conn)
        .await
        .unwrap();
        assert_eq!(indexes, 5);
    }

    #[tokio::test]
    async fn test_legacy_transactions_table_gains_due_date() {
        let mut conn = SqliteConnection::connect("sqlite::memory:").await.unwrap();
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
        assert!(!column_names(&mut conn).await.contains(&"due_date".to_string()));

        run_migrations(&mut conn, "main").await.unwrap();

        let names = column_names(&mut conn).await;
        assert_eq!(names.last().map(String::as_str), Some("due_date"));
    }
}
