//! Submission entity model and DTOs.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::FromRow;
use vidform_core::types::{DbId, Timestamp};

/// A row from the `submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: DbId,
    pub session_id: String,
    /// Flat JSON object of answer field name to value.
    pub answers: Value,
    pub client_submitted_at: Option<String>,
    pub remote_address: String,
    pub user_agent_string: String,
    pub submitted_at: Timestamp,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmission {
    pub session_id: String,
    pub answers: Map<String, Value>,
    pub client_submitted_at: Option<String>,
    pub remote_address: String,
    pub user_agent_string: String,
}

impl Submission {
    /// Flatten the row into the document shape clients and the viewer see:
    /// the answers plus `id`, `sessionId`, `submittedAt`, `remoteAddress`,
    /// `userAgentString` and, when present, `clientSubmittedAt`.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = match &self.answers {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        doc.insert("id".into(), Value::String(self.id.to_string()));
        doc.insert("sessionId".into(), Value::String(self.session_id.clone()));
        doc.insert(
            "submittedAt".into(),
            Value::String(self.submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        doc.insert(
            "remoteAddress".into(),
            Value::String(self.remote_address.clone()),
        );
        doc.insert(
            "userAgentString".into(),
            Value::String(self.user_agent_string.clone()),
        );
        if let Some(at) = &self.client_submitted_at {
            doc.insert("clientSubmittedAt".into(), Value::String(at.clone()));
        }
        doc
    }
}
