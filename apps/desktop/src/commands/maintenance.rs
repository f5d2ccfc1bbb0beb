//! # Maintenance Commands
//!
//! Spreadsheet reports, backup and restore of the database file, and a few
//! process-level helpers.
//!
//! ## Report Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Books Report                                                           │
//! │  Generated on: 2024-03-01 14:05:09                                      │
//! │  ISBN,Title,Author,Publisher,Category,Total Copies,Available Copies,... │
//! │  978-0,The Rust Programming Language,Klabnik,No Starch,Programming,3,2  │
//! │  ...                                                                    │
//! │  (blank)                                 ◄── Books and Transactions     │
//! │  Total Records:,42                       ◄── only                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::commands::{book, lending, student};
use crate::error::{ApiError, ErrorCode};
use crate::state::{AppState, ConfigState};
use libris_db::{Database, DbConfig, DbError};

// =============================================================================
// Spreadsheet Export
// =============================================================================

/// Which report to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    Students,
    Books,
    Transactions,
}

impl ReportType {
    fn title(self) -> &'static str {
        match self {
            ReportType::Students => "Students Report",
            ReportType::Books => "Books Report",
            ReportType::Transactions => "Transactions Report",
        }
    }

    /// `(header, record key)` per column.
    fn columns(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ReportType::Students => &[
                ("Student ID", "student_id"),
                ("Name", "name"),
                ("Email", "email"),
                ("Phone", "phone"),
                ("Department", "department"),
                ("Year", "year"),
                ("Created At", "created_at"),
            ],
            ReportType::Books => &[
                ("ISBN", "isbn"),
                ("Title", "title"),
                ("Author", "author"),
                ("Publisher", "publisher"),
                ("Category", "category"),
                ("Total Copies", "total_copies"),
                ("Available Copies", "available_copies"),
                ("Created At", "created_at"),
            ],
            ReportType::Transactions => &[
                ("Transaction ID", "id"),
                ("Student ID", "student_id"),
                ("Student Name", "student_name"),
                ("ISBN", "isbn"),
                ("Book Title", "book_title"),
                ("Issue Date", "issue_date"),
                ("Due Date", "due_date"),
                ("Return Date", "return_date"),
                ("Status", "status"),
            ],
        }
    }

    fn has_total_row(self) -> bool {
        !matches!(self, ReportType::Students)
    }

    fn slug(self) -> &'static str {
        match self {
            ReportType::Students => "students",
            ReportType::Books => "books",
            ReportType::Transactions => "transactions",
        }
    }
}

/// Arguments of `exportToExcel`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(rename = "type")]
    pub report: ReportType,

    /// Rows as the UI currently shows them. Loaded from the store if absent.
    #[serde(default)]
    pub data: Option<Vec<Value>>,

    #[serde(default, alias = "file_path")]
    pub file_path: Option<PathBuf>,
}

/// Writes a CSV report and returns where it went.
pub async fn export_report(state: &AppState, request: ExportRequest) -> Result<PathBuf, ApiError> {
    let records = match request.data {
        Some(records) => records,
        None => load_records(state, request.report).await?,
    };

    let path = request
        .file_path
        .unwrap_or_else(|| default_export_path(&state.config, request.report));

    let generated_on = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let rows = report_rows(request.report, &records, &generated_on);
    write_csv(path.clone(), rows).await?;

    info!(
        report = request.report.slug(),
        records = records.len(),
        path = %path.display(),
        "Report exported"
    );
    Ok(path)
}

async fn load_records(state: &AppState, report: ReportType) -> Result<Vec<Value>, ApiError> {
    match report {
        ReportType::Students => to_values(&student::load_students(state).await?),
        ReportType::Books => to_values(&book::load_books(state).await?),
        ReportType::Transactions => to_values(&lending::load_transactions(state).await?),
    }
}

fn to_values<T: Serialize>(records: &[T]) -> Result<Vec<Value>, ApiError> {
    records
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<_, _>>()
        .map_err(|e| ApiError::internal(e.to_string()))
}

/// `library_<type>_<YYYY-MM-DD>.csv` in the export directory.
fn default_export_path(config: &ConfigState, report: ReportType) -> PathBuf {
    config.export_dir.join(format!(
        "library_{}_{}.csv",
        report.slug(),
        Local::now().format("%Y-%m-%d")
    ))
}

fn report_rows(report: ReportType, records: &[Value], generated_on: &str) -> Vec<Vec<String>> {
    let columns = report.columns();
    let mut rows = Vec::with_capacity(records.len() + 5);

    rows.push(vec![report.title().to_string()]);
    rows.push(vec![format!("Generated on: {generated_on}")]);
    rows.push(columns.iter().map(|(header, _)| header.to_string()).collect());

    for record in records {
        rows.push(
            columns
                .iter()
                .map(|(_, key)| cell_text(record.get(*key)))
                .collect(),
        );
    }

    if report.has_total_row() {
        rows.push(vec![String::new()]);
        rows.push(vec!["Total Records:".to_string(), records.len().to_string()]);
    }

    rows
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

async fn write_csv(path: PathBuf, rows: Vec<Vec<String>>) -> Result<(), ApiError> {
    tokio::task::spawn_blocking(move || -> Result<(), csv::Error> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Title and footer rows are shorter than the data rows.
        let mut writer = csv::WriterBuilder::new().flexible(true).from_path(&path)?;
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    })
    .await
    .map_err(|e| ApiError::internal(format!("Export task failed: {e}")))?
    .map_err(|e| ApiError::internal(format!("Export failed: {e}")))
}

// =============================================================================
// Backup & Restore
// =============================================================================

/// Saves the database, then copies the file to `target`.
pub async fn backup_database(state: &AppState, target: &Path) -> Result<PathBuf, ApiError> {
    let db = state.db.acquire().await?;
    db.persist().await?;

    match db.snapshot_path() {
        Some(live) if live == target => {
            return Err(ApiError::validation(
                "Backup target is the live database file",
            ));
        }
        Some(live) => {
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await.map_err(DbError::from)?;
            }
            tokio::fs::copy(live, target).await.map_err(DbError::from)?;
        }
        // Nothing on disk yet: write the in-memory state directly.
        None => {
            let bytes = db.export().await?;
            Database::flush(target, &bytes).await?;
        }
    }

    info!(path = %target.display(), "Database backed up");
    Ok(target.to_path_buf())
}

/// Replaces the live database with the contents of a backup file.
///
/// On failure the current database stays live and is saved again, so the
/// file on disk matches it even if the copy had already overwritten it.
pub async fn restore_database(state: &AppState, source: &Path) -> Result<(), ApiError> {
    if !tokio::fs::try_exists(source).await.unwrap_or(false) {
        return Err(ApiError::new(
            ErrorCode::NotFound,
            format!("Backup file not found: {}", source.display()),
        ));
    }

    let target = state.config.database_path.clone();
    let mut slot = state.db.lock().await;

    let reopened = async {
        if source != target.as_path() {
            if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::copy(source, &target).await?;
        }
        Database::open(DbConfig::new(&target)).await
    }
    .await;

    match reopened {
        Ok(db) => {
            if let Some(previous) = slot.replace(db) {
                previous.close().await;
            }
            state.db.set_init_error(None);
            state.cache.invalidate_all();

            info!(source = %source.display(), "Database restored");
            Ok(())
        }
        Err(e) => {
            error!(source = %source.display(), error = %e, "Restore failed, keeping current database");
            if let Some(current) = slot.as_ref() {
                if let Err(persist_err) = current.persist().await {
                    error!(error = %persist_err, "Failed to re-save current database");
                }
            }
            Err(e.into())
        }
    }
}

// =============================================================================
// Process Helpers
// =============================================================================

/// Saves pending writes now instead of waiting for the debounce.
pub async fn flush(state: &AppState) -> Result<(), ApiError> {
    state.saver.flush_now().await?;
    Ok(())
}

pub fn get_config(state: &AppState) -> ConfigState {
    state.config.clone()
}
