//! # Validation Module
//!
//! Input validation for student and book forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI process                                                   │
//! │  └── Required markers on form fields                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Command (Rust)                                               │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: field and copy-count rules                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE constraints on student_id / isbn                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Validators expect already-normalized input (see
//! [`StudentInput::normalized`](crate::StudentInput::normalized)).

use crate::error::ValidationError;
use crate::types::{BookInput, StudentInput};
use crate::MAX_QUERY_LENGTH;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_KEY_LENGTH: usize = 50;
const MAX_TEXT_LENGTH: usize = 200;

/// Upper bound on copies of one title; guards against a typo like 1000.
pub const MAX_COPIES: i64 = 9_999;

// =============================================================================
// Field Validators
// =============================================================================

fn require(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

fn optional(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_TEXT_LENGTH => Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_TEXT_LENGTH,
        }),
        _ => Ok(()),
    }
}

/// Validates an email address.
///
/// ## Rules
/// - Must not be empty
/// - Must contain exactly one `@` with text on both sides
///
/// ## Example
/// ```rust
/// use libris_core::validation::validate_email;
///
/// assert!(validate_email("ada@example.com").is_ok());
/// assert!(validate_email("ada.example.com").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    require("email", email, MAX_TEXT_LENGTH)?;

    let mut parts = email.trim().split('@');
    let well_formed = matches!(
        (parts.next(), parts.next(), parts.next()),
        (Some(local), Some(domain), None) if !local.is_empty() && !domain.is_empty()
    );

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain".to_string(),
        });
    }

    Ok(())
}

/// Validates a copy count.
pub fn validate_copies(field: &str, copies: i64) -> ValidationResult<()> {
    if copies < 0 {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    if copies > MAX_COPIES {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_COPIES,
        });
    }

    Ok(())
}

/// Validates a search query and returns it trimmed.
///
/// Empty queries are fine and mean "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();

    if query.chars().count() > MAX_QUERY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "query".to_string(),
            max: MAX_QUERY_LENGTH,
        });
    }

    Ok(query.to_string())
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates a student form.
pub fn validate_student_input(input: &StudentInput) -> ValidationResult<()> {
    require("student_id", &input.student_id, MAX_KEY_LENGTH)?;
    require("name", &input.name, MAX_TEXT_LENGTH)?;
    validate_email(&input.email)?;
    optional("phone", input.phone.as_deref())?;
    optional("department", input.department.as_deref())?;
    optional("year", input.year.as_deref())?;
    Ok(())
}

/// Validates a book form.
///
/// ## Rules
/// - `isbn`, `title`, `author` are required
/// - `total_copies` is within `0..=MAX_COPIES`
/// - if given, `available_copies` is within `0..=total_copies`
pub fn validate_book_input(input: &BookInput) -> ValidationResult<()> {
    require("isbn", &input.isbn, MAX_KEY_LENGTH)?;
    require("title", &input.title, MAX_TEXT_LENGTH)?;
    require("author", &input.author, MAX_TEXT_LENGTH)?;
    optional("publisher", input.publisher.as_deref())?;
    optional("category", input.category.as_deref())?;
    validate_copies("total_copies", input.total_copies)?;

    if let Some(available) = input.available_copies {
        if available < 0 || available > input.total_copies {
            return Err(ValidationError::OutOfRange {
                field: "available_copies".to_string(),
                min: 0,
                max: input.total_copies,
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> StudentInput {
        StudentInput {
            student_id: "S1".into(),
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            ..Default::default()
        }
    }

    fn book() -> BookInput {
        BookInput {
            isbn: "978-0".into(),
            title: "The Rust Book".into(),
            author: "Klabnik".into(),
            total_copies: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_student_input() {
        assert!(validate_student_input(&student()).is_ok());

        let missing_id = StudentInput {
            student_id: "  ".into(),
            ..student()
        };
        assert_eq!(
            validate_student_input(&missing_id),
            Err(ValidationError::Required {
                field: "student_id".into()
            })
        );

        let bad_email = StudentInput {
            email: "ada@@example.com".into(),
            ..student()
        };
        assert!(validate_student_input(&bad_email).is_err());
    }

    #[test]
    fn test_validate_book_input() {
        assert!(validate_book_input(&book()).is_ok());
        assert!(validate_book_input(&BookInput {
            total_copies: 0,
            ..book()
        })
        .is_ok());

        assert!(validate_book_input(&BookInput {
            total_copies: -1,
            ..book()
        })
        .is_err());
        assert!(validate_book_input(&BookInput {
            available_copies: Some(4),
            ..book()
        })
        .is_err());
        assert!(validate_book_input(&BookInput {
            title: String::new(),
            ..book()
        })
        .is_err());
    }

    #[test]
    fn test_validate_search_query() {
        assert_eq!(validate_search_query("  rust ").unwrap(), "rust");
        assert_eq!(validate_search_query("").unwrap(), "");
        assert!(validate_search_query(&"q".repeat(101)).is_err());
    }
}
