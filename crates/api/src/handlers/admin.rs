//! Admin viewer over stored submissions.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;

use vidform_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use vidform_core::viewer;

use crate::error::AppResult;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET /admin/submissions
// ---------------------------------------------------------------------------

/// Recent submissions split into technical fields and answer pairs.
///
/// `total` is the number of stored submissions, not the page size.
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<impl IntoResponse> {
    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);

    let rows = state.store.list_recent(limit, offset).await?;
    let total = state.store.count().await?;

    let documents: Vec<_> = rows.iter().map(|row| row.to_document()).collect();
    let mut listing = viewer::present_all(&documents);
    listing.total = usize::try_from(total).unwrap_or_default();

    tracing::debug!(page = listing.submissions.len(), total, "Admin listing");

    Ok(Json(DataResponse { data: listing }))
}
