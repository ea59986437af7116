#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use consent_service::config::{
    ConsentConfig, ConsentSettings, ContentConfig, DataRightsConfig, Environment, MongoConfig,
    SecurityConfig, SmtpConfig,
};
use consent_service::models::ChildAccount;
use consent_service::services::restrictions::RestrictionPolicy;
use consent_service::services::{InMemoryStore, MockMailer, StaticContentCatalog};
use consent_service::{build_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const CHILD_EMAIL: &str = "c@t.com";
pub const PARENT_EMAIL: &str = "p@t.com";

pub fn test_config() -> ConsentConfig {
    ConsentConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "consent-service".to_string(),
        service_version: "test".to_string(),
        mongodb: MongoConfig {
            uri: "mongodb://localhost:27017".to_string(),
            database: "consent_test".to_string(),
        },
        smtp: SmtpConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from: "no-reply@localhost".to_string(),
        },
        consent: ConsentSettings {
            verification_base_url: "http://localhost:3000".to_string(),
        },
        data_rights: DataRightsConfig {
            deletion_code_ttl_minutes: 30,
            require_issued_deletion_code: true,
        },
        content: ContentConfig {
            restrict_full_content_for_minors: false,
            feed_path: None,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Value,
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
    pub mailer: Arc<MockMailer>,
}

impl TestApp {
    pub fn spawn() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ConsentConfig) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let mailer = Arc::new(MockMailer::new());

        let state = AppState::new(
            config,
            store.clone(),
            store.clone(),
            mailer.clone(),
            Arc::new(StaticContentCatalog::sample()),
        );

        TestApp {
            router: build_router(state),
            store,
            mailer,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to execute request");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("Response body is not JSON")
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> TestResponse {
        self.json_request(Method::POST, uri, None, body).await
    }

    pub async fn json_request(
        &self,
        method: Method,
        uri: &str,
        user_id: Option<&str>,
        body: Value,
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(id) = user_id {
            builder = builder.header("x-user-id", id);
        }

        self.send(
            builder
                .body(Body::from(body.to_string()))
                .expect("Failed to build request"),
        )
        .await
    }

    pub async fn get(&self, uri: &str, user_id: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(Method::GET).uri(uri);
        if let Some(id) = user_id {
            builder = builder.header("x-user-id", id);
        }

        self.send(builder.body(Body::empty()).expect("Failed to build request"))
            .await
    }

    /// Create an account through the signup endpoint and return its id.
    pub async fn signup(&self, email: &str, age: i32) -> String {
        let response = self
            .post_json(
                "/api/accounts",
                serde_json::json!({ "email": email, "age": age }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);

        response.body["id"]
            .as_str()
            .expect("signup returns an id")
            .to_string()
    }

    /// Seed an account directly, bypassing the signup age floor.
    pub async fn seed_account(&self, email: &str, age: i32) -> String {
        use consent_service::services::ChildStore;

        let account = ChildAccount::new(email.to_string(), age, false, &RestrictionPolicy::default());
        let id = account.id.clone();
        self.store
            .insert(&account)
            .await
            .expect("Failed to seed account");
        id
    }

    /// Run request-consent for the default child and parent.
    pub async fn request_consent(&self) -> TestResponse {
        self.post_json(
            "/api/coppa/request-consent",
            serde_json::json!({
                "childEmail": CHILD_EMAIL,
                "childAge": 10,
                "parentEmail": PARENT_EMAIL
            }),
        )
        .await
    }
}
