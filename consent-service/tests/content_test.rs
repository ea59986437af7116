mod common;

use axum::http::StatusCode;
use common::TestApp;

#[tokio::test]
async fn test_minor_receives_sanitized_feed() {
    let app = TestApp::spawn();
    let user_id = app.signup("teen@t.com", 14).await;

    let response = app.get("/api/content", Some(&user_id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["x-kids-mode"], "true");

    let feed = response.body;
    assert!(feed.get("odds").is_none());
    assert!(feed.get("bettingTips").is_none());
    assert!(feed.get("depositButton").is_none());
    assert_eq!(feed["title"], "Matchday");

    let items = feed["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert!(items.iter().all(|item| item["isGambling"] == false));
    assert!(items[0]["items"][0].get("odds").is_none());
    assert_eq!(items[0]["items"][0]["label"], "Head to head");
    assert!(items[1].get("recommendedWagers").is_none());
}

#[tokio::test]
async fn test_adult_receives_full_feed() {
    let app = TestApp::spawn();
    let user_id = app.signup("adult@t.com", 40).await;

    let response = app.get("/api/content", Some(&user_id)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.headers.get("x-kids-mode").is_none());
    assert!(response.body.get("odds").is_some());
    assert_eq!(response.body["items"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_kids_mode_query_filters_adult_feed() {
    let app = TestApp::spawn();
    let user_id = app.signup("adult@t.com", 40).await;

    let response = app
        .get(
            &format!("/api/content?userId={}&kidsMode=1", user_id),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.get("odds").is_none());
    assert_eq!(response.body["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_content_requires_identity() {
    let app = TestApp::spawn();

    let response = app.get("/api/content", None).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
