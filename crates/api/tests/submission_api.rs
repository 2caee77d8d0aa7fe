//! Integration tests for the submission storage endpoint and admin viewer.

mod common;

use std::sync::Arc;

use axum::http::StatusCode;
use common::{body_json, get, post_json, post_json_with_headers};
use serde_json::json;
use vidform_db::store::{MemorySubmissionStore, SubmissionStore};

const SUBMISSIONS: &str = "/api/v1/submissions";

// ---------------------------------------------------------------------------
// POST /submissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn submit_stores_answers_and_stamps_metadata() {
    let store = Arc::new(MemorySubmissionStore::new());
    let app = common::build_test_app_with(store.clone());

    let response = post_json_with_headers(
        app,
        SUBMISSIONS,
        json!({
            "color": "red",
            "email": "jane@example.com",
            "sessionId": "session_abc",
            "submittedAt": "2026-03-01T12:00:00.000Z",
        }),
        &[("x-real-ip", "192.0.2.7"), ("user-agent", "vidform-test")],
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert!(json["id"].is_string());
    assert!(json["message"].is_string());

    let row = store.find_by_session("session_abc").await.unwrap().unwrap();
    assert_eq!(row.answers, json!({"color": "red", "email": "jane@example.com"}));
    assert_eq!(row.remote_address, "192.0.2.7");
    assert_eq!(row.user_agent_string, "vidform-test");
    assert_eq!(row.client_submitted_at.as_deref(), Some("2026-03-01T12:00:00.000Z"));
}

#[tokio::test]
async fn submit_without_headers_records_unknown() {
    let store = Arc::new(MemorySubmissionStore::new());
    let app = common::build_test_app_with(store.clone());

    let response = post_json(app, SUBMISSIONS, json!({"sessionId": "s1", "q1": "a"})).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let row = store.find_by_session("s1").await.unwrap().unwrap();
    assert_eq!(row.remote_address, "unknown");
    assert_eq!(row.user_agent_string, "unknown");
    assert!(row.client_submitted_at.is_none());
}

#[tokio::test]
async fn empty_body_returns_400() {
    let app = common::build_test_app();
    let response = post_json(app, SUBMISSIONS, json!({})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert_eq!(json["error"], "No data provided");
}

#[tokio::test]
async fn missing_session_id_returns_400() {
    let app = common::build_test_app();
    let response = post_json(app, SUBMISSIONS, json!({"color": "red"})).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
    assert_eq!(json["error"], "sessionId is required");
}

// ---------------------------------------------------------------------------
// GET /submissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn get_by_session_returns_document() {
    let app = common::build_test_app();
    post_json(
        app.clone(),
        SUBMISSIONS,
        json!({"sessionId": "session_abc", "color": "blue"}),
    )
    .await;

    let response = get(app, &format!("{SUBMISSIONS}?sessionId=session_abc")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let doc = &body_json(response).await["data"];
    assert_eq!(doc["sessionId"], "session_abc");
    assert_eq!(doc["color"], "blue");
    assert!(doc["submittedAt"].is_string());
    assert_eq!(doc["remoteAddress"], "unknown");
}

#[tokio::test]
async fn get_unknown_session_returns_404() {
    let app = common::build_test_app();
    let response = get(app, &format!("{SUBMISSIONS}?sessionId=nobody")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_returns_newest_first_with_clamped_limit() {
    let app = common::build_test_app();
    for i in 0..3 {
        post_json(
            app.clone(),
            SUBMISSIONS,
            json!({"sessionId": format!("s{i}"), "n": i.to_string()}),
        )
        .await;
    }

    let json = body_json(get(app.clone(), SUBMISSIONS).await).await;
    let list = json["data"].as_array().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["sessionId"], "s2");

    // limit=0 is clamped up to 1.
    let json = body_json(get(app, &format!("{SUBMISSIONS}?limit=0")).await).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// GET /admin/submissions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn admin_listing_splits_technical_fields() {
    let app = common::build_test_app();
    post_json(
        app.clone(),
        SUBMISSIONS,
        json!({"sessionId": "s1", "color": "red", "submittedAt": "2026-03-01T12:00:00.000Z"}),
    )
    .await;
    post_json(app.clone(), SUBMISSIONS, json!({"sessionId": "s2", "color": "blue"})).await;

    let response = get(app, "/api/v1/admin/submissions?limit=1").await;
    assert_eq!(response.status(), StatusCode::OK);

    let data = &body_json(response).await["data"];
    assert_eq!(data["total"], 2);
    let submissions = data["submissions"].as_array().unwrap();
    assert_eq!(submissions.len(), 1);

    let first = &submissions[0];
    assert_eq!(first["sessionId"], "s2");
    assert_eq!(first["remoteAddress"], "unknown");
    let fields = first["fields"].as_array().unwrap();
    assert!(fields
        .iter()
        .any(|f| f["key"] == "color" && f["value"] == "blue"));
    assert!(fields.iter().all(|f| f["key"] != "sessionId"));
}
