//! # Student Commands
//!
//! Registration, listing and maintenance of borrowers.

use tracing::{debug, info};

use crate::commands::{required_key, search_query};
use crate::error::ApiError;
use crate::state::{AppState, CacheCategory};
use libris_core::validation::validate_student_input;
use libris_core::{filter_records, Student, StudentInput};

/// Student changes also rename rows in the joined loan listing.
const STUDENT_WRITE: &[CacheCategory] = &[
    CacheCategory::Students,
    CacheCategory::Statistics,
    CacheCategory::Transactions,
];

/// Registers a student.
///
/// ## Errors
/// Validation errors before the store is touched; a duplicate `student_id`
/// surfaces as SQLite's UNIQUE constraint message.
pub async fn add_student(state: &AppState, input: StudentInput) -> Result<(), ApiError> {
    let input = input.normalized();
    validate_student_input(&input)?;

    let db = state.db.acquire().await?;
    let id = db.students().insert(&input).await?;

    state.cache.invalidate(STUDENT_WRITE);
    state.saver.schedule();

    info!(id, student_id = %input.student_id, "Student added");
    Ok(())
}

/// Lists students, newest first, optionally filtered.
pub async fn get_students(state: &AppState, query: Option<&str>) -> Result<Vec<Student>, ApiError> {
    let query = search_query(query)?;
    let students = load_students(state).await?;

    debug!(query = %query, total = students.len(), "get_students");
    Ok(filter_records(&students, &query))
}

/// All students, from the cache when fresh.
pub(crate) async fn load_students(state: &AppState) -> Result<Vec<Student>, ApiError> {
    let db = state.db.acquire().await?;
    if let Some(students) = state.cache.students() {
        return Ok(students);
    }

    let students = db.students().list().await?;
    state.cache.store_students(students.clone());
    Ok(students)
}

/// Replaces a student's details. The `student_id` picks the row.
pub async fn update_student(state: &AppState, input: StudentInput) -> Result<(), ApiError> {
    let input = input.normalized();
    validate_student_input(&input)?;

    let db = state.db.acquire().await?;
    db.students().update(&input).await?;

    state.cache.invalidate(STUDENT_WRITE);
    state.saver.schedule();

    info!(student_id = %input.student_id, "Student updated");
    Ok(())
}

/// Removes a student. Their loan history stays.
pub async fn delete_student(state: &AppState, student_id: &str) -> Result<(), ApiError> {
    let student_id = required_key("student_id", student_id)?;

    let db = state.db.acquire().await?;
    db.students().delete(&student_id).await?;

    state.cache.invalidate(STUDENT_WRITE);
    state.saver.schedule();

    info!(student_id = %student_id, "Student deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn input(id: &str, name: &str, department: &str) -> StudentInput {
        StudentInput {
            student_id: id.to_string(),
            name: name.to_string(),
            email: format!("{}@school.edu", id.to_lowercase()),
            phone: None,
            department: Some(department.to_string()),
            year: None,
        }
    }

    #[tokio::test]
    async fn test_add_and_search_students() {
        let state = AppState::in_memory().await;
        add_student(&state, input("S1", "Ada Lovelace", "Maths")).await.unwrap();
        add_student(&state, input("S2", "Alan Turing", "Computing")).await.unwrap();

        assert_eq!(get_students(&state, None).await.unwrap().len(), 2);

        let found = get_students(&state, Some("  maths ")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].student_id, "S1");
    }

    #[tokio::test]
    async fn test_write_is_visible_despite_warm_cache() {
        let state = AppState::in_memory().await;
        add_student(&state, input("S1", "Ada", "Maths")).await.unwrap();
        assert_eq!(get_students(&state, None).await.unwrap().len(), 1);

        add_student(&state, input("S2", "Alan", "Computing")).await.unwrap();
        assert_eq!(get_students(&state, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_student_id_reports_store_error() {
        let state = AppState::in_memory().await;
        add_student(&state, input("S1", "Ada", "Maths")).await.unwrap();

        let err = add_student(&state, input("S1", "Copy", "Maths")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("UNIQUE"));
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_before_store() {
        let state = AppState::in_memory().await;
        let mut bad = input("S1", "Ada", "Maths");
        bad.email = "not-an-email".to_string();

        let err = add_student(&state, bad).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(get_students(&state, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_student() {
        let state = AppState::in_memory().await;

        let err = update_student(&state, input("S9", "Ghost", "None")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = delete_student(&state, "S9").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_then_delete() {
        let state = AppState::in_memory().await;
        add_student(&state, input("S1", "Ada", "Maths")).await.unwrap();

        update_student(&state, input("S1", "Ada King", "Maths")).await.unwrap();
        assert_eq!(get_students(&state, None).await.unwrap()[0].name, "Ada King");

        delete_student(&state, " S1 ").await.unwrap();
        assert!(get_students(&state, None).await.unwrap().is_empty());
    }
}
