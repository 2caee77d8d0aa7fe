//! Read-side projection of stored submissions for the admin viewer.
//!
//! Stored records are free-form documents: a handful of technical fields
//! stamped by the storage endpoint plus whatever answers the form produced.
//! The viewer shows the technical fields in their own slots and every other
//! field generically.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Record keys shown separately from the answers.
pub const TECHNICAL_FIELDS: [&str; 5] = [
    "id",
    "sessionId",
    "submittedAt",
    "remoteAddress",
    "userAgentString",
];

pub fn is_technical_field(key: &str) -> bool {
    TECHNICAL_FIELDS.contains(&key)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayField {
    pub key: String,
    pub value: String,
}

/// One stored record split for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionView {
    pub id: Option<String>,
    pub session_id: Option<String>,
    pub submitted_at: Option<String>,
    pub remote_address: Option<String>,
    pub user_agent_string: Option<String>,
    /// Non-technical fields, sorted by key.
    pub fields: Vec<DisplayField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionListing {
    pub total: usize,
    pub submissions: Vec<SubmissionView>,
}

/// Textual form of a field value: strings as-is, `null` as empty, anything
/// else as compact JSON.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub fn present(record: &Map<String, Value>) -> SubmissionView {
    let technical = |key: &str| record.get(key).map(display_value);

    SubmissionView {
        id: technical("id"),
        session_id: technical("sessionId"),
        submitted_at: technical("submittedAt"),
        remote_address: technical("remoteAddress"),
        user_agent_string: technical("userAgentString"),
        fields: record
            .iter()
            .filter(|(key, _)| !is_technical_field(key))
            .map(|(key, value)| DisplayField {
                key: key.clone(),
                value: display_value(value),
            })
            .collect(),
    }
}

pub fn present_all<'a, I>(records: I) -> SubmissionListing
where
    I: IntoIterator<Item = &'a Map<String, Value>>,
{
    let submissions: Vec<SubmissionView> = records.into_iter().map(present).collect();
    SubmissionListing {
        total: submissions.len(),
        submissions,
    }
}
