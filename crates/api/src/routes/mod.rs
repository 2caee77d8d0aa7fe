pub mod admin;
pub mod health;
pub mod submissions;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /submissions                  store (POST), lookup by ?sessionId or list recent (GET)
/// /admin/submissions            viewer listing (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/submissions", submissions::router())
        .nest("/admin", admin::router())
}
