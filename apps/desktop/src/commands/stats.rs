//! # Statistics Command

use crate::error::ApiError;
use crate::state::AppState;
use libris_core::Statistics;

/// Dashboard counts, from the cache when fresh.
pub async fn get_statistics(state: &AppState) -> Result<Statistics, ApiError> {
    let db = state.db.acquire().await?;
    if let Some(stats) = state.cache.statistics() {
        return Ok(stats);
    }

    let stats = db.statistics().compute().await?;
    state.cache.store_statistics(stats);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::book::add_book;
    use crate::commands::lending::{issue_book, return_book};
    use crate::commands::student::add_student;
    use libris_core::{BookInput, IssueRequest, StudentInput};

    fn student(id: &str) -> StudentInput {
        StudentInput {
            student_id: id.to_string(),
            name: format!("Student {id}"),
            email: format!("{}@school.edu", id.to_lowercase()),
            phone: None,
            department: None,
            year: None,
        }
    }

    fn book(isbn: &str, total: i64) -> BookInput {
        BookInput {
            isbn: isbn.to_string(),
            title: format!("Title {isbn}"),
            author: "Ferris".to_string(),
            publisher: None,
            category: None,
            total_copies: total,
            available_copies: None,
        }
    }

    #[tokio::test]
    async fn test_statistics_follow_lending() {
        let state = AppState::in_memory().await;
        assert_eq!(get_statistics(&state).await.unwrap(), Statistics::default());

        for id in ["S1", "S2", "S3"] {
            add_student(&state, student(id)).await.unwrap();
        }
        add_book(&state, book("B1", 2)).await.unwrap();
        add_book(&state, book("B2", 3)).await.unwrap();
        issue_book(
            &state,
            IssueRequest {
                student_id: "S1".to_string(),
                isbn: "B1".to_string(),
            },
        )
        .await
        .unwrap();

        let stats = get_statistics(&state).await.unwrap();
        assert_eq!(stats, Statistics::from_counts(3, 2, 5, 4));
        assert_eq!(stats.issued_books, 1);

        // Cached value must not survive the return.
        return_book(&state, 1).await.unwrap();
        assert_eq!(get_statistics(&state).await.unwrap().issued_books, 0);
    }
}
