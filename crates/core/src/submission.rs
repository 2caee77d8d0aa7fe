//! Submission of a completed run to the storage endpoint.
//!
//! The core only defines the request body and the client seam; the HTTP
//! implementation lives in `vidform-client`. Clients never retry: the user
//! retries from the sequencer.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::answers::Answers;
use crate::types::{SessionId, Timestamp};

/// Body key carrying the session identifier.
pub const FIELD_SESSION_ID: &str = "sessionId";

/// Body key carrying the client-observed submission time.
pub const FIELD_SUBMITTED_AT: &str = "submittedAt";

/// Build the request body: every answer plus `sessionId` and `submittedAt`.
///
/// The two metadata keys are written last so they win over any answer
/// field that happens to share a name.
pub fn build_payload(
    answers: &Answers,
    session_id: &SessionId,
    submitted_at: Timestamp,
) -> serde_json::Map<String, serde_json::Value> {
    let mut body: serde_json::Map<String, serde_json::Value> = answers
        .iter()
        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
        .collect();
    body.insert(
        FIELD_SESSION_ID.to_string(),
        serde_json::Value::String(session_id.to_string()),
    );
    body.insert(
        FIELD_SUBMITTED_AT.to_string(),
        serde_json::Value::String(submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    body
}

/// Same as [`build_payload`] stamped with the current time.
pub fn build_payload_now(
    answers: &Answers,
    session_id: &SessionId,
) -> serde_json::Map<String, serde_json::Value> {
    build_payload(answers, session_id, Utc::now())
}

/// Acknowledgement returned by the storage endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionAck {
    /// Opaque identifier of the stored record.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Any failure to get an acknowledgement. Network failures and rejected
/// payloads are handled identically by the sequencer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission request failed: {0}")]
    Transport(String),

    #[error("Submission rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected submission response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait SubmissionClient: Send + Sync {
    async fn submit(
        &self,
        answers: &Answers,
        session_id: &SessionId,
    ) -> Result<SubmissionAck, SubmissionError>;
}

#[async_trait]
impl<C: SubmissionClient + ?Sized> SubmissionClient for Arc<C> {
    async fn submit(
        &self,
        answers: &Answers,
        session_id: &SessionId,
    ) -> Result<SubmissionAck, SubmissionError> {
        (**self).submit(answers, session_id).await
    }
}
