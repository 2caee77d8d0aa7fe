//! The storage seam used by the HTTP layer.
//!
//! [`PgSubmissionStore`] delegates to [`SubmissionRepo`]; the in-memory
//! store backs local runs and the API tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::models::submission::{CreateSubmission, Submission};
use crate::repositories::SubmissionRepo;
use crate::DbPool;

#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, input: &CreateSubmission) -> Result<Submission, sqlx::Error>;

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Submission>, sqlx::Error>;

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Submission>, sqlx::Error>;

    async fn count(&self) -> Result<i64, sqlx::Error>;

    /// Whether the backing storage is reachable.
    async fn is_healthy(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Postgres
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PgSubmissionStore {
    pool: DbPool,
}

impl PgSubmissionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for PgSubmissionStore {
    async fn insert(&self, input: &CreateSubmission) -> Result<Submission, sqlx::Error> {
        let row = SubmissionRepo::insert(&self.pool, input).await?;
        tracing::debug!(id = row.id, session_id = %row.session_id, "Inserted submission");
        Ok(row)
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Submission>, sqlx::Error> {
        SubmissionRepo::find_by_session(&self.pool, session_id).await
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Submission>, sqlx::Error> {
        SubmissionRepo::list_recent(&self.pool, limit, offset).await
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        SubmissionRepo::count(&self.pool).await
    }

    async fn is_healthy(&self) -> bool {
        crate::health_check(&self.pool).await.is_ok()
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local store. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct MemorySubmissionStore {
    rows: Mutex<Vec<Submission>>,
}

impl MemorySubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Submission>> {
        self.rows.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rows newest first, the order every read uses. Rows are appended in
    /// insertion order, so that is plain reverse order.
    fn newest_first(&self) -> Vec<Submission> {
        self.lock().iter().rev().cloned().collect()
    }
}

#[async_trait]
impl SubmissionStore for MemorySubmissionStore {
    async fn insert(&self, input: &CreateSubmission) -> Result<Submission, sqlx::Error> {
        let now = chrono::Utc::now();
        let mut rows = self.lock();
        let row = Submission {
            id: rows.len() as i64 + 1,
            session_id: input.session_id.clone(),
            answers: Value::Object(input.answers.clone()),
            client_submitted_at: input.client_submitted_at.clone(),
            remote_address: input.remote_address.clone(),
            user_agent_string: input.user_agent_string.clone(),
            submitted_at: now,
            created_at: now,
            updated_at: now,
        };
        rows.push(row.clone());
        Ok(row)
    }

    async fn find_by_session(&self, session_id: &str) -> Result<Option<Submission>, sqlx::Error> {
        Ok(self
            .newest_first()
            .into_iter()
            .find(|row| row.session_id == session_id))
    }

    async fn list_recent(&self, limit: i64, offset: i64) -> Result<Vec<Submission>, sqlx::Error> {
        Ok(self
            .newest_first()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64, sqlx::Error> {
        Ok(self.lock().len() as i64)
    }

    async fn is_healthy(&self) -> bool {
        true
    }
}
