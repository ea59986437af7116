mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn test_signup_derives_restrictions_from_age() {
    let app = TestApp::spawn();

    let response = app
        .post_json("/api/accounts", json!({ "email": "teen@t.com", "age": 15 }))
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["isMinor"], true);
    assert_eq!(response.body["accessRestrictions"]["bettingAllowed"], false);
    assert_eq!(response.body["accessRestrictions"]["paymentsAllowed"], false);
    assert_eq!(response.body["accessRestrictions"]["fullContentAccess"], true);
}

#[tokio::test]
async fn test_signup_with_taken_email_conflicts() {
    let app = TestApp::spawn();
    app.signup("adult@t.com", 30).await;

    let response = app
        .post_json("/api/accounts", json!({ "email": "adult@t.com", "age": 31 }))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(app.store.account_count(), 1);
}

#[tokio::test]
async fn test_signup_rejects_invalid_input() {
    let app = TestApp::spawn();

    let response = app
        .post_json("/api/accounts", json!({ "email": "not-an-email", "age": 30 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_json("/api/accounts", json!({ "email": "young@t.com", "age": 9 }))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_explicit_minor_flag_restricts_adult_age() {
    let app = TestApp::spawn();

    let response = app
        .post_json(
            "/api/accounts",
            json!({ "email": "managed@t.com", "age": 25, "isMinor": true }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["isMinor"], true);
    assert_eq!(response.body["accessRestrictions"]["bettingAllowed"], false);
}

#[tokio::test]
async fn test_restrictions_view_reports_effective_kids_mode() {
    let app = TestApp::spawn();
    let user_id = app.signup("teen@t.com", 16).await;

    let response = app
        .get("/api/accounts/me/restrictions", Some(&user_id))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["isMinor"], true);
    assert_eq!(response.body["kidsMode"], false);
    assert_eq!(response.body["effectiveKidsMode"], true);
    assert!(response.body["consentStatus"].is_null());
}

#[tokio::test]
async fn test_adult_can_toggle_kids_mode() {
    let app = TestApp::spawn();
    let user_id = app.signup("adult@t.com", 35).await;

    let response = app
        .json_request(
            Method::PATCH,
            "/api/accounts/me/kids-mode",
            Some(&user_id),
            json!({ "kidsMode": true }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["kidsMode"], true);
    assert_eq!(response.body["effectiveKidsMode"], true);

    let content = app.get("/api/content", Some(&user_id)).await;
    assert!(content.body.get("odds").is_none());
}

#[tokio::test]
async fn test_restrictions_require_identity() {
    let app = TestApp::spawn();

    let response = app.get("/api/accounts/me/restrictions", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_reports_service() {
    let app = TestApp::spawn();

    let response = app.get("/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["service"], "consent-service");
}
