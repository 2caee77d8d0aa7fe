//! Shared response envelope types for API handlers.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Acknowledgement returned when a submission is stored.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: String,
    pub message: &'static str,
}
