use std::sync::Arc;

use vidform_db::store::SubmissionStore;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the store is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Where submissions are stored (Postgres, or in-memory without `DATABASE_URL`).
    pub store: Arc<dyn SubmissionStore>,
}
