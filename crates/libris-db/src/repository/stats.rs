//! # Statistics Repository
//!
//! Dashboard counters computed in one pass over `students` and `books`.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use libris_core::Statistics;

/// Repository for derived, read-only counters.
#[derive(Debug, Clone)]
pub struct StatisticsRepository {
    pool: SqlitePool,
}

impl StatisticsRepository {
    /// Creates a new StatisticsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StatisticsRepository { pool }
    }

    /// Computes the current counters.
    ///
    /// Empty tables count as zero rather than NULL.
    pub async fn compute(&self) -> DbResult<Statistics> {
        let (total_students, total_books, total_copies, available_copies): (i64, i64, i64, i64) =
            sqlx::query_as(
                "SELECT
                    (SELECT COUNT(*) FROM students),
                    (SELECT COUNT(*) FROM books),
                    (SELECT COALESCE(SUM(total_copies), 0) FROM books),
                    (SELECT COALESCE(SUM(available_copies), 0) FROM books)",
            )
            .fetch_one(&self.pool)
            .await?;

        let stats =
            Statistics::from_counts(total_students, total_books, total_copies, available_copies);
        debug!(?stats, "Statistics computed");
        Ok(stats)
    }
}
