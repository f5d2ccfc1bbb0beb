//! # Student Repository
//!
//! Database operations for students.
//!
//! Students are addressed by their business key `student_id`. Deleting a
//! student leaves their transactions in place; listings then show the loan
//! without a name.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::{Student, StudentInput};

const STUDENT_COLUMNS: &str =
    "id, student_id, name, email, phone, department, year, created_at";

/// Repository for student database operations.
#[derive(Debug, Clone)]
pub struct StudentRepository {
    pool: SqlitePool,
}

impl StudentRepository {
    /// Creates a new StudentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StudentRepository { pool }
    }

    /// Lists every student, newest first.
    pub async fn list(&self) -> DbResult<Vec<Student>> {
        let students = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = students.len(), "Listed students");
        Ok(students)
    }

    /// Gets a student by business key.
    ///
    /// ## Returns
    /// * `Ok(Some(Student))` - Student found
    /// * `Ok(None)` - Student not found
    pub async fn get_by_student_id(&self, student_id: &str) -> DbResult<Option<Student>> {
        let student = sqlx::query_as::<_, Student>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE student_id = ?1"
        ))
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }

    /// Inserts a new student.
    ///
    /// A duplicate `student_id` fails with SQLite's UNIQUE constraint message.
    pub async fn insert(&self, input: &StudentInput) -> DbResult<i64> {
        let result = sqlx::query(
            "INSERT INTO students (student_id, name, email, phone, department, year)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&input.student_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.department)
        .bind(&input.year)
        .execute(&self.pool)
        .await?;

        debug!(student_id = %input.student_id, "Student inserted");
        Ok(result.last_insert_rowid())
    }

    /// Replaces every mutable field of the student named by `input.student_id`.
    pub async fn update(&self, input: &StudentInput) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE students SET name = ?1, email = ?2, phone = ?3, department = ?4, year = ?5
             WHERE student_id = ?6",
        )
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.department)
        .bind(&input.year)
        .bind(&input.student_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Student", &input.student_id));
        }

        debug!(student_id = %input.student_id, "Student updated");
        Ok(())
    }

    /// Deletes a student. Their transactions are left untouched.
    pub async fn delete(&self, student_id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM students WHERE student_id = ?1")
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Student", student_id));
        }

        debug!(student_id = %student_id, "Student deleted");
        Ok(())
    }

    /// Counts registered students.
    pub async fn count(&self) -> DbResult<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM students")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}
