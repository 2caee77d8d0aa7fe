use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vidform_client::api::{HttpSubmissionClient, SubmissionApiError};
use vidform_core::answers::Answers;
use vidform_core::submission::{SubmissionClient, SubmissionError};
use vidform_core::types::SessionId;

fn answers() -> Answers {
    [("color", "red"), ("email", "jane@example.com")]
        .into_iter()
        .collect()
}

fn session() -> SessionId {
    SessionId::from_string("session_test")
}

#[tokio::test]
async fn submit_posts_answers_with_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .and(body_partial_json(json!({
            "color": "red",
            "email": "jane@example.com",
            "sessionId": "session_test",
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "id": "42",
            "message": "Form submitted successfully",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpSubmissionClient::new(format!("{}/", server.uri()));
    let ack = client.submit(&answers(), &session()).await.unwrap();

    assert_eq!(ack.id, "42");
    assert_eq!(ack.message.as_deref(), Some("Form submitted successfully"));
}

#[tokio::test]
async fn server_error_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "An internal error occurred",
            "code": "INTERNAL_ERROR",
        })))
        .mount(&server)
        .await;

    let client = HttpSubmissionClient::new(server.uri());

    let err = client.submit_answers(&answers(), &session()).await.unwrap_err();
    assert_matches!(err, SubmissionApiError::ApiError { status: 500, .. });

    let err = client.submit(&answers(), &session()).await.unwrap_err();
    assert_matches!(err, SubmissionError::Rejected { status: 500, ref body } if body.contains("INTERNAL_ERROR"));
}

#[tokio::test]
async fn unacknowledged_success_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "id": "",
        })))
        .mount(&server)
        .await;

    let client = HttpSubmissionClient::new(server.uri());
    let err = client.submit(&answers(), &session()).await.unwrap_err();
    assert_matches!(err, SubmissionError::InvalidResponse(_));
}

#[tokio::test]
async fn malformed_body_is_invalid() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/submissions"))
        .respond_with(ResponseTemplate::new(201).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpSubmissionClient::new(server.uri());
    let err = client.submit(&answers(), &session()).await.unwrap_err();
    assert_matches!(err, SubmissionError::InvalidResponse(_));
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    // Reserve a free port, then release it so nothing is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = HttpSubmissionClient::new(format!("http://127.0.0.1:{port}"));
    let err = client.submit(&answers(), &session()).await.unwrap_err();
    assert_matches!(err, SubmissionError::Transport(_));
}

#[tokio::test]
async fn lists_submissions_from_admin_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/admin/submissions"))
        .and(query_param("limit", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "total": 1,
                "submissions": [{
                    "id": "7",
                    "sessionId": "session_test",
                    "submittedAt": "2026-03-01T12:00:00.000Z",
                    "remoteAddress": "203.0.113.9",
                    "userAgentString": "curl/8.0",
                    "fields": [{"key": "color", "value": "red"}],
                }],
            }
        })))
        .mount(&server)
        .await;

    let client = HttpSubmissionClient::new(server.uri());
    let listing = client.list_submissions(10).await.unwrap();

    assert_eq!(listing.total, 1);
    assert_eq!(listing.submissions[0].id.as_deref(), Some("7"));
    assert_eq!(listing.submissions[0].fields[0].value, "red");
}
