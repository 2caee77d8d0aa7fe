use axum::routing::get;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// GET    /submissions         viewer listing (?limit, ?offset)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/submissions", get(admin::list_submissions))
}
