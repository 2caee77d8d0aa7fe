//! REST client for the submission storage endpoint.
//!
//! Wraps `POST /api/v1/submissions` (submit a run) and
//! `GET /api/v1/admin/submissions` (viewer listing) using [`reqwest`].

use async_trait::async_trait;
use serde::Deserialize;

use vidform_core::answers::Answers;
use vidform_core::submission::{
    build_payload_now, SubmissionAck, SubmissionClient, SubmissionError,
};
use vidform_core::types::SessionId;
use vidform_core::viewer::SubmissionListing;

/// HTTP client for one storage endpoint.
pub struct HttpSubmissionClient {
    client: reqwest::Client,
    api_url: String,
}

/// Body of a successful `POST /submissions`.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub success: bool,
    pub id: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// Errors from the storage endpoint REST layer.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The endpoint returned a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    ApiError { status: u16, body: String },

    /// A 2xx response that does not acknowledge the submission.
    #[error("Submission not acknowledged")]
    NotAcknowledged,
}

impl From<SubmissionApiError> for SubmissionError {
    fn from(err: SubmissionApiError) -> Self {
        match err {
            SubmissionApiError::Request(e) if e.is_decode() => {
                SubmissionError::InvalidResponse(e.to_string())
            }
            SubmissionApiError::Request(e) => SubmissionError::Transport(e.to_string()),
            SubmissionApiError::ApiError { status, body } => {
                SubmissionError::Rejected { status, body }
            }
            SubmissionApiError::NotAcknowledged => {
                SubmissionError::InvalidResponse("success flag not set".to_string())
            }
        }
    }
}

impl HttpSubmissionClient {
    /// * `api_url` - Base URL of the storage service, e.g. `http://host:3000`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Send one run's answers. Never retries.
    pub async fn submit_answers(
        &self,
        answers: &Answers,
        session_id: &SessionId,
    ) -> Result<SubmitResponse, SubmissionApiError> {
        let body = build_payload_now(answers, session_id);

        let response = self
            .client
            .post(format!("{}/api/v1/submissions", self.api_url))
            .json(&body)
            .send()
            .await?;

        let ack: SubmitResponse = Self::parse_response(response).await?;
        if !ack.success {
            return Err(SubmissionApiError::NotAcknowledged);
        }
        Ok(ack)
    }

    /// Fetch the admin viewer listing.
    pub async fn list_submissions(
        &self,
        limit: i64,
    ) -> Result<SubmissionListing, SubmissionApiError> {
        let response = self
            .client
            .get(format!("{}/api/v1/admin/submissions", self.api_url))
            .query(&[("limit", limit)])
            .send()
            .await?;

        let envelope: DataEnvelope<SubmissionListing> = Self::parse_response(response).await?;
        Ok(envelope.data)
    }

    // ---- private helpers ----

    /// Return the response unchanged on a success status, or an
    /// [`SubmissionApiError::ApiError`] with the status and body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, SubmissionApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(SubmissionApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SubmissionApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl SubmissionClient for HttpSubmissionClient {
    async fn submit(
        &self,
        answers: &Answers,
        session_id: &SessionId,
    ) -> Result<SubmissionAck, SubmissionError> {
        let ack = self.submit_answers(answers, session_id).await.map_err(|e| {
            tracing::warn!(session_id = %session_id, error = %e, "Submission request failed");
            SubmissionError::from(e)
        })?;
        Ok(SubmissionAck {
            id: ack.id,
            message: ack.message,
        })
    }
}
