//! Handlers for storing and reading form submissions.
//!
//! The request body is the client's answers merged with `sessionId` and a
//! client-observed `submittedAt`. The server keeps the latter as
//! `clientSubmittedAt` and stamps its own `submittedAt`, `remoteAddress`
//! and `userAgentString`.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{Map, Value};

use vidform_core::error::CoreError;
use vidform_core::pagination::{clamp_limit, clamp_offset, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use vidform_core::submission::{FIELD_SESSION_ID, FIELD_SUBMITTED_AT};
use vidform_core::viewer;
use vidform_db::models::submission::CreateSubmission;

use crate::error::{AppError, AppResult};
use crate::query::SubmissionQuery;
use crate::response::{DataResponse, SubmitResponse};
use crate::state::AppState;

/// Placeholder for request metadata the client did not send.
const UNKNOWN: &str = "unknown";

/// Key the client-observed timestamp is stored under.
const FIELD_CLIENT_SUBMITTED_AT: &str = "clientSubmittedAt";

// ---------------------------------------------------------------------------
// POST /submissions
// ---------------------------------------------------------------------------

/// Store a submission and return its identifier.
pub async fn create_submission(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> AppResult<impl IntoResponse> {
    let input = build_submission(body, &headers)?;

    let row = state.store.insert(&input).await?;

    tracing::info!(
        id = row.id,
        session_id = %row.session_id,
        remote_address = %row.remote_address,
        fields = input.answers.len(),
        "Submission stored"
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            id: row.id.to_string(),
            message: "Form submitted successfully",
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /submissions
// ---------------------------------------------------------------------------

/// With `?sessionId=` return that session's submission, otherwise the most
/// recent submissions (newest first).
pub async fn get_submissions(
    State(state): State<AppState>,
    Query(params): Query<SubmissionQuery>,
) -> AppResult<impl IntoResponse> {
    if let Some(session_id) = params.session_id.filter(|s| !s.is_empty()) {
        let row = state
            .store
            .find_by_session(&session_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Submission",
                key: session_id,
            })?;
        return Ok(Json(DataResponse {
            data: Value::Object(row.to_document()),
        }));
    }

    let limit = clamp_limit(params.limit, DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT);
    let offset = clamp_offset(params.offset);
    let rows = state.store.list_recent(limit, offset).await?;

    tracing::debug!(count = rows.len(), limit, offset, "Listed submissions");

    let documents = rows
        .iter()
        .map(|row| Value::Object(row.to_document()))
        .collect();
    Ok(Json(DataResponse {
        data: Value::Array(documents),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split a request body into the stored answers and metadata.
///
/// Technical keys sent by the client are dropped: the server is the only
/// source for them.
fn build_submission(
    mut body: Map<String, Value>,
    headers: &HeaderMap,
) -> Result<CreateSubmission, AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("No data provided".into()));
    }

    let session_id = match body.remove(FIELD_SESSION_ID) {
        Some(Value::String(s)) if !s.trim().is_empty() => s,
        _ => return Err(CoreError::Validation("sessionId is required".into()).into()),
    };

    let client_submitted_at = match body.remove(FIELD_SUBMITTED_AT) {
        Some(Value::String(s)) => Some(s),
        _ => None,
    };

    body.retain(|key, _| !viewer::is_technical_field(key) && key != FIELD_CLIENT_SUBMITTED_AT);

    Ok(CreateSubmission {
        session_id,
        answers: body,
        client_submitted_at,
        remote_address: remote_address(headers),
        user_agent_string: header_str(headers, "user-agent")
            .unwrap_or(UNKNOWN)
            .to_string(),
    })
}

/// Client address from `x-forwarded-for` (first hop), then `x-real-ip`.
fn remote_address(headers: &HeaderMap) -> String {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header_str(headers, "x-real-ip"))
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}
