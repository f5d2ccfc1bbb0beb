//! # IPC Layer
//!
//! JSON-lines protocol between the UI process and this backend.
//!
//! ## Wire Format
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  stdin  (one object per line)                                           │
//! │    {"id": 7, "command": "issueBook",                                    │
//! │     "payload": {"studentId": "S1", "isbn": "978-0"}}                    │
//! │                                                                         │
//! │  stdout (one object per line, same id)                                  │
//! │    {"id": 7, "result": {"success": true}}                               │
//! │                                                                         │
//! │  Reads answer with data:   {"id": 8, "result": [ {...}, {...} ]}        │
//! │  Broken line:              {"id": null, "result":                       │
//! │                              {"success": false, "error": "..."}}        │
//! │                                                                         │
//! │  stderr carries the logs.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Command names are accepted in camelCase (`getStudents`) or kebab-case
//! (`get-students`).

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::commands::{book, lending, maintenance, stats, student};
use crate::error::{ApiError, CommandResponse};
use crate::state::AppState;
use libris_core::Statistics;

/// One request line.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub id: Value,
    pub command: String,
    #[serde(default)]
    pub payload: Value,
}

/// One response line.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: Value,
    pub result: Value,
}

/// `get-student-books` → `getStudentBooks`. camelCase passes through.
pub fn canonical_command(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for c in name.trim().chars() {
        if c == '-' || c == '_' {
            upper_next = true;
        } else if upper_next {
            out.extend(c.to_uppercase());
            upper_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Runs a command and shapes its reply.
///
/// Mutating commands answer with a [`CommandResponse`]. Failed reads are
/// logged and answered with an empty value the UI can render.
pub async fn dispatch(state: &AppState, command: &str, payload: Value) -> Value {
    let command = canonical_command(command);
    debug!(command = %command, "Dispatching");

    match run(state, &command, payload).await {
        Ok(result) => result,
        Err(e) => match empty_read_result(&command) {
            Some(empty) => {
                warn!(command = %command, error = %e, "Read failed, answering empty");
                empty
            }
            None => {
                warn!(command = %command, code = ?e.code, error = %e, "Command failed");
                json!(CommandResponse::failed(e.message))
            }
        },
    }
}

fn empty_read_result(command: &str) -> Option<Value> {
    match command {
        "getStudents" | "getBooks" | "getTransactions" | "getStudentBooks" => Some(json!([])),
        "getStatistics" => Some(json!(Statistics::default())),
        _ => None,
    }
}

async fn run(state: &AppState, command: &str, payload: Value) -> Result<Value, ApiError> {
    match command {
        // Students
        "addStudent" => {
            student::add_student(state, parse(payload)?).await?;
            ok()
        }
        "getStudents" => {
            let query = query_arg(&payload)?;
            to_json(student::get_students(state, query.as_deref()).await?)
        }
        "updateStudent" => {
            student::update_student(state, parse(payload)?).await?;
            ok()
        }
        "deleteStudent" => {
            let student_id = key_arg(&payload, &["studentId", "student_id"])?;
            student::delete_student(state, &student_id).await?;
            ok()
        }

        // Books
        "addBook" => {
            book::add_book(state, parse(payload)?).await?;
            ok()
        }
        "getBooks" => {
            let query = query_arg(&payload)?;
            to_json(book::get_books(state, query.as_deref()).await?)
        }
        "updateBook" => {
            book::update_book(state, parse(payload)?).await?;
            ok()
        }
        "deleteBook" => {
            book::delete_book(state, &key_arg(&payload, &["isbn"])?).await?;
            ok()
        }

        // Lending
        "issueBook" => {
            lending::issue_book(state, parse(payload)?).await?;
            ok()
        }
        "returnBook" => {
            lending::return_book(state, id_arg(&payload)?).await?;
            ok()
        }
        "deleteTransaction" => {
            lending::delete_transaction(state, id_arg(&payload)?).await?;
            ok()
        }
        "getTransactions" => {
            let query = query_arg(&payload)?;
            to_json(lending::get_transactions(state, query.as_deref()).await?)
        }
        "getStudentBooks" => {
            let student_id = key_arg(&payload, &["studentId", "student_id"])?;
            to_json(lending::get_student_books(state, &student_id).await?)
        }

        // Statistics
        "getStatistics" => to_json(stats::get_statistics(state).await?),

        // Maintenance
        "exportToExcel" => {
            let path = maintenance::export_report(state, parse(payload)?).await?;
            to_json(CommandResponse::with_file(path.display().to_string()))
        }
        "backupDatabase" => {
            let target = key_arg(&payload, &["filePath", "file_path"])?;
            let path = maintenance::backup_database(state, Path::new(&target)).await?;
            to_json(CommandResponse::with_file(path.display().to_string()))
        }
        "restoreDatabase" => {
            let source = key_arg(&payload, &["filePath", "file_path"])?;
            maintenance::restore_database(state, Path::new(&source)).await?;
            ok()
        }
        "flush" => {
            maintenance::flush(state).await?;
            ok()
        }
        "getConfig" => to_json(maintenance::get_config(state)),
        "shutdown" => ok(),

        other => Err(ApiError::validation(format!("Unknown command: {other}"))),
    }
}

// =============================================================================
// Payload Helpers
// =============================================================================

fn ok() -> Result<Value, ApiError> {
    to_json(CommandResponse::ok())
}

fn to_json<T: Serialize>(value: T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::internal(e.to_string()))
}

fn parse<T: DeserializeOwned>(payload: Value) -> Result<T, ApiError> {
    serde_json::from_value(payload)
        .map_err(|e| ApiError::validation(format!("Invalid payload: {e}")))
}

/// `null`, `"text"` or `{"query": "text"}`.
fn query_arg(payload: &Value) -> Result<Option<String>, ApiError> {
    match payload {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Object(map) => match map.get("query") {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(ApiError::validation("query must be a string")),
        },
        _ => Err(ApiError::validation("query must be a string")),
    }
}

/// A bare string, or the first of `keys` present in an object.
fn key_arg(payload: &Value, keys: &[&str]) -> Result<String, ApiError> {
    let found = match payload {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => keys
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    };
    found.ok_or_else(|| ApiError::validation(format!("{} is required", keys[0])))
}

/// A number, a numeric string, or `{"transactionId": n}` / `{"id": n}`.
fn id_arg(payload: &Value) -> Result<i64, ApiError> {
    let value = match payload {
        Value::Object(map) => ["transactionId", "transaction_id", "id"]
            .iter()
            .find_map(|k| map.get(*k))
            .unwrap_or(&Value::Null),
        other => other,
    };

    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .ok_or_else(|| ApiError::validation("transactionId must be an integer"))
}

// =============================================================================
// Serve Loop
// =============================================================================

/// Answers one line. The flag is set when the line asked to shut down.
pub async fn handle_line(state: &AppState, line: &str) -> (Reply, bool) {
    match serde_json::from_str::<Envelope>(line) {
        Ok(envelope) => {
            let stop = canonical_command(&envelope.command) == "shutdown";
            let result = dispatch(state, &envelope.command, envelope.payload).await;
            (
                Reply {
                    id: envelope.id,
                    result,
                },
                stop,
            )
        }
        Err(e) => {
            warn!(error = %e, "Malformed request line");
            (
                Reply {
                    id: Value::Null,
                    result: json!(CommandResponse::failed(format!("Malformed request: {e}"))),
                },
                false,
            )
        }
    }
}

/// Serves requests until the input ends or a `shutdown` command arrives.
pub async fn serve_io<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let (reply, stop) = handle_line(state, &line).await;
        let mut out = serde_json::to_vec(&reply)?;
        out.push(b'\n');
        writer.write_all(&out).await?;
        writer.flush().await?;

        if stop {
            info!("Shutdown requested");
            return Ok(());
        }
    }

    info!("Input closed");
    Ok(())
}

/// [`serve_io`] over the process's stdin and stdout.
pub async fn serve(state: &AppState) -> std::io::Result<()> {
    serve_io(state, tokio::io::stdin(), tokio::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_command() {
        assert_eq!(canonical_command("get-student-books"), "getStudentBooks");
        assert_eq!(canonical_command("export-to-excel"), "exportToExcel");
        assert_eq!(canonical_command("issueBook"), "issueBook");
    }

    #[test]
    fn test_payload_helpers() {
        assert_eq!(id_arg(&json!(5)).unwrap(), 5);
        assert_eq!(id_arg(&json!("12")).unwrap(), 12);
        assert_eq!(id_arg(&json!({ "transactionId": 3 })).unwrap(), 3);
        assert!(id_arg(&json!("abc")).is_err());

        assert_eq!(key_arg(&json!("S1"), &["studentId"]).unwrap(), "S1");
        assert_eq!(
            key_arg(&json!({ "student_id": "S2" }), &["studentId", "student_id"]).unwrap(),
            "S2"
        );
        assert_eq!(query_arg(&json!({ "query": "ada" })).unwrap().as_deref(), Some("ada"));
        assert_eq!(query_arg(&Value::Null).unwrap(), None);
    }

    #[tokio::test]
    async fn test_workflow_over_dispatch() {
        let state = AppState::in_memory().await;

        let reply = dispatch(
            &state,
            "add-student",
            json!({ "student_id": "S1", "name": "Ada", "email": "ada@school.edu" }),
        )
        .await;
        assert_eq!(reply, json!({ "success": true }));

        let reply = dispatch(
            &state,
            "addBook",
            json!({ "isbn": "X1", "title": "Rust", "author": "Ferris", "totalCopies": 1 }),
        )
        .await;
        assert_eq!(reply, json!({ "success": true }));

        let reply = dispatch(&state, "issueBook", json!({ "studentId": "S1", "isbn": "X1" })).await;
        assert_eq!(reply, json!({ "success": true }));

        let reply = dispatch(&state, "issueBook", json!({ "studentId": "S1", "isbn": "X1" })).await;
        assert_eq!(reply["success"], json!(false));

        let stats = dispatch(&state, "getStatistics", Value::Null).await;
        assert_eq!(stats["issuedBooks"], json!(1));
        assert_eq!(stats["availableCopies"], json!(0));

        let loans = dispatch(&state, "get-student-books", json!("S1")).await;
        assert_eq!(loans.as_array().map(Vec::len), Some(1));

        let reply = dispatch(&state, "returnBook", loans[0]["id"].clone()).await;
        assert_eq!(reply, json!({ "success": true }));
    }

    #[tokio::test]
    async fn test_failed_read_answers_empty() {
        let state = AppState::in_memory().await;
        let long_query = "x".repeat(500);

        let reply = dispatch(&state, "getBooks", json!({ "query": long_query })).await;
        assert_eq!(reply, json!([]));

        let reply = dispatch(&state, "frobnicate", Value::Null).await;
        assert_eq!(reply["error"], json!("Unknown command: frobnicate"));
    }

    #[tokio::test]
    async fn test_serve_io_round_trip() {
        let state = AppState::in_memory().await;
        let input = concat!(
            r#"{"id":1,"command":"getStudents"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"id":"bye","command":"shutdown"}"#,
            "\n",
            r#"{"id":3,"command":"getBooks"}"#,
            "\n",
        );
        let mut output = Vec::new();

        serve_io(&state, input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<Value> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], json!({ "id": 1, "result": [] }));
        assert_eq!(replies[1]["id"], Value::Null);
        assert_eq!(replies[1]["result"]["success"], json!(false));
        assert_eq!(replies[2], json!({ "id": "bye", "result": { "success": true } }));
    }
}
