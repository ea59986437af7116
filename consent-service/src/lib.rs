pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
    Router,
};
use service_core::middleware::{
    metrics::metrics_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ConsentConfig;
use crate::services::{
    AccountRepository, ChildStore, ComplianceLog, ConsentLifecycleManager, ConsentMailer,
    ContentCatalog, DataRightsService, SecurityAuditService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: ConsentConfig,
    pub accounts: AccountRepository,
    pub lifecycle: ConsentLifecycleManager,
    pub data_rights: DataRightsService,
    pub audit: SecurityAuditService,
    pub content: Arc<dyn ContentCatalog>,
}

impl AppState {
    pub fn new(
        config: ConsentConfig,
        store: Arc<dyn ChildStore>,
        compliance: Arc<dyn ComplianceLog>,
        mailer: Arc<dyn ConsentMailer>,
        content: Arc<dyn ContentCatalog>,
    ) -> Self {
        let accounts = AccountRepository::new(store, config.restriction_policy());
        let audit = SecurityAuditService::new(compliance.clone());

        let lifecycle = ConsentLifecycleManager::new(
            accounts.clone(),
            mailer.clone(),
            audit.clone(),
            config.consent.verification_base_url.clone(),
        );
        let data_rights = DataRightsService::new(
            accounts.clone(),
            compliance,
            mailer,
            audit.clone(),
            config.data_rights.clone(),
        );

        Self {
            config,
            accounts,
            lifecycle,
            data_rights,
            audit,
            content,
        }
    }
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-user-id"),
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([header::CONTENT_DISPOSITION])
}

pub fn build_router(state: AppState) -> Router {
    let consent_routes = Router::new()
        .route("/api/coppa/request-consent", post(handlers::consent::request_consent))
        .route("/api/coppa/verify-consent", post(handlers::consent::verify_consent))
        .route("/api/coppa/revoke-consent", post(handlers::consent::revoke_consent))
        .route(
            "/api/coppa/export-consent/:child_email",
            get(handlers::data_rights::export_consent),
        );

    let data_rights_routes = Router::new()
        .route(
            "/api/data-rights/export-data/:child_email",
            get(handlers::data_rights::export_data),
        )
        .route(
            "/api/data-rights/deletion-code",
            post(handlers::data_rights::issue_deletion_code),
        )
        .route(
            "/api/data-rights/delete-data",
            post(handlers::data_rights::delete_data),
        )
        .route(
            "/api/data-rights/rectify-data",
            post(handlers::data_rights::rectify_data),
        );

    let payment_routes = Router::new()
        .route("/api/payments/process", post(handlers::payments::process_payment))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_payments_access,
        ));

    let betting_routes = Router::new()
        .route("/api/bets", post(handlers::payments::place_bet))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_betting_access,
        ));

    let content_routes = Router::new()
        .route("/api/content", get(handlers::content::get_content))
        .route_layer(from_fn_with_state(state.clone(), middleware::sanitize_content));

    let account_routes = Router::new()
        .route(
            "/api/accounts/me/restrictions",
            get(handlers::accounts::get_restrictions),
        )
        .route(
            "/api/accounts/me/kids-mode",
            patch(handlers::accounts::update_kids_mode),
        )
        .route_layer(from_fn_with_state(state.clone(), middleware::require_identity))
        .route("/api/accounts", post(handlers::accounts::signup));

    let cors = cors_layer(&state.config.security.allowed_origins);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::health::metrics_endpoint))
        .merge(consent_routes)
        .merge(data_rights_routes)
        .merge(payment_routes)
        .merge(betting_routes)
        .merge(content_routes)
        .merge(account_routes)
        .with_state(state)
        .layer(from_fn(metrics_middleware))
        // Span fields use the route template; export paths embed an email.
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            let route = request
                .extensions()
                .get::<MatchedPath>()
                .map(MatchedPath::as_str)
                .unwrap_or("unmatched");

            tracing::info_span!(
                "http_request",
                request_id = %request_id,
                method = %request.method(),
                route = %route,
            )
        }))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(cors)
}
