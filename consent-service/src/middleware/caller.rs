use axum::async_trait;
use axum::extract::{FromRequestParts, MatchedPath};
use axum::http::{request::Parts, Extensions, HeaderMap, Method, Uri};
use service_core::middleware::client_info::ClientInfo;
use service_core::middleware::tracing::RequestId;
use std::convert::Infallible;

use crate::models::CallerContext;

/// Build the caller description from request metadata.
///
/// The endpoint is the route template when one matched, so emails embedded
/// in paths do not end up in audit records.
pub fn caller_context(
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    extensions: &Extensions,
) -> CallerContext {
    let client = ClientInfo::from_parts(headers, extensions);
    let endpoint = extensions
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    CallerContext {
        endpoint,
        method: method.to_string(),
        ip_address: client.ip_string(),
        user_agent: client.user_agent,
        request_id: extensions.get::<RequestId>().map(|id| id.0.clone()),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(caller_context(
            &parts.method,
            &parts.uri,
            &parts.headers,
            &parts.extensions,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_falls_back_to_raw_path_and_unknown_ip() {
        let uri: Uri = "/api/bets".parse().unwrap();
        let caller = caller_context(&Method::POST, &uri, &HeaderMap::new(), &Extensions::new());

        assert_eq!(caller.endpoint, "/api/bets");
        assert_eq!(caller.method, "POST");
        assert_eq!(caller.ip_address, "unknown");
        assert!(caller.request_id.is_none());
    }

    #[test]
    fn test_request_id_is_carried() {
        let mut extensions = Extensions::new();
        extensions.insert(RequestId("req-7".to_string()));
        let uri: Uri = "/".parse().unwrap();

        let caller = caller_context(&Method::GET, &uri, &HeaderMap::new(), &extensions);

        assert_eq!(caller.request_id.as_deref(), Some("req-7"));
    }
}
