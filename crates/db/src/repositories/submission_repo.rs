//! Repository for the `submissions` table.

use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::submission::{CreateSubmission, Submission};

/// Column list for `submissions` queries.
const COLUMNS: &str = "\
    id, session_id, answers, client_submitted_at, remote_address, \
    user_agent_string, submitted_at, created_at, updated_at";

/// Insert and read operations for stored submissions.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a submission; `submitted_at` is stamped by the database.
    pub async fn insert(pool: &PgPool, input: &CreateSubmission) -> Result<Submission, sqlx::Error> {
        let query = format!(
            "INSERT INTO submissions \
                (session_id, answers, client_submitted_at, remote_address, user_agent_string) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(&input.session_id)
            .bind(Json(&input.answers))
            .bind(&input.client_submitted_at)
            .bind(&input.remote_address)
            .bind(&input.user_agent_string)
            .fetch_one(pool)
            .await
    }

    /// Most recent submission for a session, if any.
    pub async fn find_by_session(
        pool: &PgPool,
        session_id: &str,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions \
             WHERE session_id = $1 \
             ORDER BY submitted_at DESC, id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(session_id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first. Callers clamp `limit` and `offset`.
    pub async fn list_recent(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM submissions \
             ORDER BY submitted_at DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM submissions")
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}
