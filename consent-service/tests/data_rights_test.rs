mod common;

use axum::http::{header, StatusCode};
use common::{test_config, TestApp, CHILD_EMAIL, PARENT_EMAIL};
use consent_service::models::{ConfirmationMethod, DeletionStatus};
use consent_service::services::data_rights::MAX_DELETION_CODE_ATTEMPTS;
use consent_service::services::SecurityEventType;
use serde_json::json;

fn export_uri(parent: &str) -> String {
    format!(
        "/api/data-rights/export-data/{}?parentEmail={}",
        CHILD_EMAIL, parent
    )
}

#[tokio::test]
async fn test_export_by_parent_returns_allowlisted_attachment() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app.get(&export_uri(PARENT_EMAIL), None).await;

    assert_eq!(response.status, StatusCode::OK);
    let disposition = response.headers[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap();
    assert!(disposition.starts_with("attachment; filename=\"user-data-c-t-com-"));

    let body = response.body;
    assert_eq!(body["personalInfo"]["email"], CHILD_EMAIL);
    assert_eq!(body["personalInfo"]["age"], 10);
    assert_eq!(body["consent"]["status"], "PENDING");
    assert_eq!(body["exportFormat"], "JSON");
    assert!(body.get("deletionCode").is_none());
    assert!(body.get("version").is_none());
    assert!(body["consent"].get("auditTrail").is_none());
}

#[tokio::test]
async fn test_export_by_other_adult_is_forbidden() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app.get(&export_uri("stranger@t.com"), None).await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert!(app
        .store
        .security_events()
        .iter()
        .any(|e| e.event_type == SecurityEventType::ParentEmailMismatch));
}

#[tokio::test]
async fn test_export_without_parent_email_is_bad_request() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app
        .get(&format!("/api/data-rights/export-data/{}", CHILD_EMAIL), None)
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deletion_with_issued_code_removes_account_and_keeps_log() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let issued = app
        .post_json(
            "/api/data-rights/deletion-code",
            json!({ "childEmail": CHILD_EMAIL, "parentEmail": PARENT_EMAIL }),
        )
        .await;
    assert_eq!(issued.status, StatusCode::OK);
    assert!(issued.body["expiresAt"].is_string());

    let code = app
        .mailer
        .last_deletion_code(CHILD_EMAIL)
        .expect("deletion code was mailed");

    let response = app
        .post_json(
            "/api/data-rights/delete-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "confirmationCode": code
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["deletionLog"]["childEmail"], CHILD_EMAIL);
    assert_eq!(response.body["deletionLog"]["confirmationMethod"], "issued_code");
    assert_eq!(response.body["deletionLog"]["status"], "completed");
    assert_eq!(app.store.account_count(), 0);

    let logs = app.store.deletion_logs();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].parent_email, PARENT_EMAIL);
    assert_eq!(logs[0].confirmation_method, ConfirmationMethod::IssuedCode);
    assert_eq!(logs[0].status, DeletionStatus::Completed);

    let after = app.get(&export_uri(PARENT_EMAIL), None).await;
    assert_eq!(after.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_deletion_with_wrong_code_is_refused() {
    let app = TestApp::spawn();
    app.request_consent().await;
    app.post_json(
        "/api/data-rights/deletion-code",
        json!({ "childEmail": CHILD_EMAIL, "parentEmail": PARENT_EMAIL }),
    )
    .await;

    let response = app
        .post_json(
            "/api/data-rights/delete-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "confirmationCode": "not-the-code"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.account_count(), 1);
    assert!(app.store.deletion_logs().is_empty());
    assert!(app
        .store
        .security_events()
        .iter()
        .any(|e| e.event_type == SecurityEventType::InvalidDeletionCode));
}

#[tokio::test]
async fn test_deletion_code_stops_working_after_repeated_wrong_guesses() {
    let app = TestApp::spawn();
    app.request_consent().await;
    app.post_json(
        "/api/data-rights/deletion-code",
        json!({ "childEmail": CHILD_EMAIL, "parentEmail": PARENT_EMAIL }),
    )
    .await;
    let code = app
        .mailer
        .last_deletion_code(CHILD_EMAIL)
        .expect("deletion code was mailed");
    let wrong = if code == "12345678" { "87654321" } else { "12345678" };

    for _ in 0..MAX_DELETION_CODE_ATTEMPTS {
        let response = app
            .post_json(
                "/api/data-rights/delete-data",
                json!({
                    "childEmail": CHILD_EMAIL,
                    "parentEmail": PARENT_EMAIL,
                    "confirmationCode": wrong
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    let response = app
        .post_json(
            "/api/data-rights/delete-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "confirmationCode": code
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
    assert_eq!(app.store.account_count(), 1);
    assert!(app.store.deletion_logs().is_empty());
}

#[tokio::test]
async fn test_deletion_with_presence_only_confirmation() {
    let mut config = test_config();
    config.data_rights.require_issued_deletion_code = false;
    let app = TestApp::with_config(config);
    app.request_consent().await;

    let response = app
        .post_json(
            "/api/data-rights/delete-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "confirmationCode": "anything"
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["deletionLog"]["confirmationMethod"],
        "presence_only"
    );
    assert_eq!(app.store.account_count(), 0);
}

#[tokio::test]
async fn test_deletion_without_code_is_bad_request() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app
        .post_json(
            "/api/data-rights/delete-data",
            json!({ "childEmail": CHILD_EMAIL, "parentEmail": PARENT_EMAIL }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(app.store.account_count(), 1);
}

#[tokio::test]
async fn test_rectify_applies_only_allowlisted_fields() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app
        .post_json(
            "/api/data-rights/rectify-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "updates": {
                    "username": "striker9",
                    "preferences": { "theme": "dark" },
                    "age": 30,
                    "isMinor": false
                }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["updatedFields"], json!(["username", "preferences"]));

    let export = app.get(&export_uri(PARENT_EMAIL), None).await;
    assert_eq!(export.body["personalInfo"]["username"], "striker9");
    assert_eq!(export.body["personalInfo"]["age"], 10);
    assert_eq!(export.body["preferences"]["theme"], "dark");
    assert_eq!(export.body["preferences"]["notifications"], true);
}

#[tokio::test]
async fn test_rectify_rejects_malformed_preferences() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app
        .post_json(
            "/api/data-rights/rectify-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": PARENT_EMAIL,
                "updates": { "preferences": { "theme": "neon" } }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rectify_by_other_adult_is_forbidden() {
    let app = TestApp::spawn();
    app.request_consent().await;

    let response = app
        .post_json(
            "/api/data-rights/rectify-data",
            json!({
                "childEmail": CHILD_EMAIL,
                "parentEmail": "stranger@t.com",
                "updates": { "username": "hijack" }
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::FORBIDDEN);
}
