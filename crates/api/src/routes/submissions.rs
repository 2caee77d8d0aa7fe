use axum::routing::get;
use axum::Router;

use crate::handlers::submissions;
use crate::state::AppState;

/// Routes mounted at `/submissions`.
///
/// ```text
/// POST   /            store a submission
/// GET    /            ?sessionId= lookup, else recent (?limit, ?offset)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(submissions::get_submissions).post(submissions::create_submission),
    )
}
