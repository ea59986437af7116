//! Caller identity resolution for gated routes.
//!
//! The trusted edge sets `X-User-ID`. Callers without it may pass `userId`
//! as a query parameter or as a field of a JSON body.

use axum::body::Body;
use axum::extract::Request;
use axum::http::header;
use http_body_util::{BodyExt, Limited};
use serde::Deserialize;
use service_core::error::AppError;

use crate::models::{CallerContext, ChildAccount};
use crate::services::{AccountRepository, SecurityAuditLog, SecurityAuditService, SecurityEventType};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Largest body buffered while looking for a `userId` field.
const MAX_IDENTITY_BODY_BYTES: usize = 64 * 1024;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatingQuery {
    pub user_id: Option<String>,
    pub kids_mode: Option<String>,
}

impl GatingQuery {
    pub fn parse(query: Option<&str>) -> Self {
        query
            .and_then(|q| serde_urlencoded::from_str(q).ok())
            .unwrap_or_default()
    }

    /// Explicit kids-mode request from the client.
    pub fn kids_mode_override(&self) -> bool {
        matches!(self.kids_mode.as_deref(), Some("true") | Some("1"))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BodyIdentity {
    user_id: Option<String>,
}

fn header_user_id(req: &Request) -> Option<String> {
    req.headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn is_json(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}

/// Find the caller's user id, reading the body only as a last resort.
///
/// The request is handed back intact, with a buffered body when it was read.
pub async fn extract_user_id(
    req: Request,
    query: &GatingQuery,
) -> Result<(Option<String>, Request), AppError> {
    if let Some(id) = header_user_id(&req) {
        return Ok((Some(id), req));
    }

    if let Some(id) = query.user_id.as_deref().filter(|s| !s.is_empty()) {
        return Ok((Some(id.to_string()), req));
    }

    if !is_json(&req) {
        return Ok((None, req));
    }

    let (parts, body) = req.into_parts();
    let bytes = Limited::new(body, MAX_IDENTITY_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Failed to read body: {}", e)))?
        .to_bytes();

    let user_id = serde_json::from_slice::<BodyIdentity>(&bytes)
        .ok()
        .and_then(|b| b.user_id)
        .filter(|s| !s.is_empty());

    Ok((user_id, Request::from_parts(parts, Body::from(bytes))))
}

/// Resolve the calling account. No id at all is 401, an unknown id 404.
/// Store failures surface as 500 so the gated action never proceeds.
pub async fn resolve_account(
    accounts: &AccountRepository,
    audit: &SecurityAuditService,
    user_id: Option<&str>,
    caller: &CallerContext,
) -> Result<ChildAccount, AppError> {
    let user_id = match user_id {
        Some(id) => id,
        None => {
            audit
                .log(SecurityAuditLog::new(
                    SecurityEventType::MissingIdentity,
                    caller,
                    None,
                    "No caller identity supplied",
                ))
                .await;
            return Err(AppError::Unauthorized(anyhow::anyhow!(
                "Authentication required"
            )));
        }
    };

    accounts
        .find_by_id(user_id)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to resolve caller account");
            AppError::from(e)
        })?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("User not found")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/api/bets")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_header_wins_over_query_and_body() {
        let req = Request::builder()
            .uri("/api/content?userId=from-query")
            .header(USER_ID_HEADER, "from-header")
            .body(Body::empty())
            .unwrap();
        let query = GatingQuery::parse(req.uri().query());

        let (id, _) = extract_user_id(req, &query).await.unwrap();
        assert_eq!(id.as_deref(), Some("from-header"));
    }

    #[tokio::test]
    async fn test_query_used_without_header() {
        let req = Request::builder()
            .uri("/api/content?userId=from-query&kidsMode=true")
            .body(Body::empty())
            .unwrap();
        let query = GatingQuery::parse(req.uri().query());

        let (id, _) = extract_user_id(req, &query).await.unwrap();
        assert_eq!(id.as_deref(), Some("from-query"));
        assert!(query.kids_mode_override());
    }

    #[tokio::test]
    async fn test_body_is_read_and_restored() {
        let req = json_request(r#"{"userId":"from-body","stake":5}"#);

        let (id, req) = extract_user_id(req, &GatingQuery::default()).await.unwrap();
        assert_eq!(id.as_deref(), Some("from-body"));

        let bytes = req.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], br#"{"userId":"from-body","stake":5}"#);
    }

    #[tokio::test]
    async fn test_no_identity_anywhere() {
        let (id, _) = extract_user_id(json_request("{}"), &GatingQuery::default())
            .await
            .unwrap();
        assert!(id.is_none());
    }

    #[test]
    fn test_kids_mode_override_values() {
        assert!(GatingQuery::parse(Some("kidsMode=1")).kids_mode_override());
        assert!(!GatingQuery::parse(Some("kidsMode=false")).kids_mode_override());
        assert!(!GatingQuery::parse(None).kids_mode_override());
    }
}
