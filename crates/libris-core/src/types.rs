//! # Domain Types
//!
//! Core domain types used throughout Libris.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Student      │   │      Book       │   │  Transaction    │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (rowid)     │   │  id (rowid)     │   │  id (rowid)     │       │
//! │  │  student_id     │   │  isbn           │   │  student_id ──► │       │
//! │  │  name, email    │   │  total_copies   │   │  isbn ────────► │       │
//! │  │                 │   │  available_...  │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  Derived views: LoanRecord (joined names), ActiveLoan, Statistics      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Students and books carry:
//! - `id`: SQLite rowid, internal only
//! - Business key (`student_id`, `isbn`): what librarians type, unique and
//!   immutable once created
//!
//! Transactions reference students and books by business key, not rowid.
//!
//! ## Wire Shape
//! Entities serialize with their column names (`student_id`, `total_copies`)
//! because that is what the UI process sends and expects. `Statistics` is the
//! one camelCase view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Student
// =============================================================================

/// A registered borrower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Student {
    /// Internal rowid.
    pub id: i64,

    /// Business key, unique across students.
    pub student_id: String,

    pub name: String,

    pub email: String,

    pub phone: Option<String>,

    pub department: Option<String>,

    /// Year of study as entered ("2", "Final", ...).
    pub year: Option<String>,

    /// When the student was registered.
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Fields a librarian supplies when adding or updating a student.
///
/// On update `student_id` selects the row; every other field replaces the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StudentInput {
    #[serde(alias = "studentId")]
    pub student_id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl StudentInput {
    /// Trims every field and turns blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        StudentInput {
            student_id: self.student_id.trim().to_string(),
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: blank_to_none(self.phone),
            department: blank_to_none(self.department),
            year: blank_to_none(self.year),
        }
    }
}

// =============================================================================
// Book
// =============================================================================

/// A catalogued title and its copy counts.
///
/// ## Invariant
/// `0 <= available_copies <= total_copies`, and
/// `available_copies = total_copies - (issued transactions on this isbn)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Book {
    pub id: i64,

    /// Business key, unique across books.
    pub isbn: String,

    pub title: String,

    pub author: String,

    pub publisher: Option<String>,

    pub category: Option<String>,

    pub total_copies: i64,

    pub available_copies: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Copies currently out on loan.
    #[inline]
    pub fn issued_copies(&self) -> i64 {
        self.total_copies - self.available_copies
    }
}

/// Fields a librarian supplies when adding or updating a book.
///
/// `available_copies` is only honoured on add, where it defaults to
/// `total_copies`. On update the available count is derived from the change
/// in total (see [`crate::lending::rebalance_available`]).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookInput {
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_total_copies", alias = "totalCopies")]
    pub total_copies: i64,
    #[serde(default, alias = "availableCopies")]
    pub available_copies: Option<i64>,
}

fn default_total_copies() -> i64 {
    1
}

impl BookInput {
    /// Trims text fields and turns blank optional fields into `None`.
    pub fn normalized(self) -> Self {
        BookInput {
            isbn: self.isbn.trim().to_string(),
            title: self.title.trim().to_string(),
            author: self.author.trim().to_string(),
            publisher: blank_to_none(self.publisher),
            category: blank_to_none(self.category),
            total_copies: self.total_copies,
            available_copies: self.available_copies,
        }
    }

    /// Available copies for a newly added book.
    #[inline]
    pub fn initial_available(&self) -> i64 {
        self.available_copies.unwrap_or(self.total_copies)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle of a loan record.
///
/// ```text
///   issue ──► Issued ──return──► Returned ──delete──► (gone)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum TransactionStatus {
    Issued,
    Returned,
}

impl TransactionStatus {
    /// Column value as stored in SQLite.
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Issued => "issued",
            TransactionStatus::Returned => "returned",
        }
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transaction
// =============================================================================

/// One borrow event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Transaction {
    pub id: i64,

    /// Borrower's business key.
    pub student_id: String,

    pub isbn: String,

    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,

    /// `None` only for rows written before due dates were tracked.
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,

    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,

    pub status: TransactionStatus,
}

/// A transaction joined with the borrower's name and the book's title.
///
/// The joins are outer joins: a record whose student or book has since been
/// deleted still appears, with `None` for the missing name or title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LoanRecord {
    pub id: i64,
    pub student_id: String,
    pub student_name: Option<String>,
    pub isbn: String,
    pub book_title: Option<String>,
    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub return_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
}

impl LoanRecord {
    /// An issued loan whose due date has passed.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == TransactionStatus::Issued && self.due_date.is_some_and(|due| due < now)
    }
}

/// An unreturned loan as listed on a student's card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ActiveLoan {
    /// Transaction id (what `returnBook` takes).
    pub id: i64,
    pub isbn: String,
    pub title: Option<String>,
    pub author: Option<String>,
    #[ts(as = "String")]
    pub issue_date: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: TransactionStatus,
}

/// Arguments of an issue request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IssueRequest {
    #[serde(alias = "studentId")]
    pub student_id: String,
    pub isbn: String,
}

// =============================================================================
// Statistics
// =============================================================================

/// Dashboard counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Statistics {
    pub total_students: i64,
    pub total_books: i64,
    pub total_copies: i64,
    pub available_copies: i64,
    /// Copies currently out: `total_copies - available_copies`.
    pub issued_books: i64,
}

impl Statistics {
    /// Builds the view from raw counts.
    pub fn from_counts(
        total_students: i64,
        total_books: i64,
        total_copies: i64,
        available_copies: i64,
    ) -> Self {
        Statistics {
            total_students,
            total_books,
            total_copies,
            available_copies,
            issued_books: total_copies - available_copies,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn loan(status: TransactionStatus, due: Option<DateTime<Utc>>) -> LoanRecord {
        let issued = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        LoanRecord {
            id: 1,
            student_id: "S1".into(),
            student_name: Some("Ada".into()),
            isbn: "X1".into(),
            book_title: Some("Rust".into()),
            issue_date: issued,
            due_date: due,
            return_date: None,
            status,
        }
    }

    #[test]
    fn test_statistics_from_counts() {
        let stats = Statistics::from_counts(3, 2, 5, 4);
        assert_eq!(stats.issued_books, 1);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalStudents"], 3);
        assert_eq!(json["issuedBooks"], 1);
    }

    #[test]
    fn test_overdue_only_when_issued_and_past_due() {
        let due = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let later = due + Duration::days(1);

        assert!(loan(TransactionStatus::Issued, Some(due)).is_overdue(later));
        assert!(!loan(TransactionStatus::Issued, Some(due)).is_overdue(due));
        assert!(!loan(TransactionStatus::Returned, Some(due)).is_overdue(later));
        assert!(!loan(TransactionStatus::Issued, None).is_overdue(later));
    }

    #[test]
    fn test_inputs_accept_ui_payloads() {
        let student: StudentInput = serde_json::from_value(serde_json::json!({
            "student_id": " S1 ",
            "name": "Ada",
            "email": "ada@example.com",
            "phone": "",
            "department": "CS",
            "year": "2"
        }))
        .unwrap();
        let student = student.normalized();
        assert_eq!(student.student_id, "S1");
        assert_eq!(student.phone, None);
        assert_eq!(student.department.as_deref(), Some("CS"));

        let book: BookInput = serde_json::from_value(serde_json::json!({
            "isbn": "X1",
            "title": "Rust",
            "author": "Ferris",
            "total_copies": 3
        }))
        .unwrap();
        assert_eq!(book.initial_available(), 3);

        let request: IssueRequest =
            serde_json::from_value(serde_json::json!({ "studentId": "S1", "isbn": "X1" }))
                .unwrap();
        assert_eq!(request.student_id, "S1");
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Returned).unwrap(),
            "\"returned\""
        );
        assert_eq!(TransactionStatus::Issued.to_string(), "issued");
    }
}
