//! Caller network metadata for audit records and security logs.

use axum::async_trait;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap, Extensions};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

/// Network-level description of whoever sent the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientInfo {
    /// Resolve the caller from `x-forwarded-for` (first hop), falling back to
    /// the socket peer address when the server was started with connect info.
    pub fn from_parts(headers: &HeaderMap, extensions: &Extensions) -> Self {
        let forwarded_ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok());

        let ip = forwarded_ip.or_else(|| {
            extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip())
        });

        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self { ip, user_agent }
    }

    pub fn ip_string(&self) -> String {
        self.ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ClientInfo::from_parts(&parts.headers, &parts.extensions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwarded_for_takes_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "203.0.113.7, 10.0.0.1".parse().unwrap());
        headers.insert(header::USER_AGENT, "parent-portal/1.0".parse().unwrap());

        let info = ClientInfo::from_parts(&headers, &Extensions::new());

        assert_eq!(info.ip_string(), "203.0.113.7");
        assert_eq!(info.user_agent.as_deref(), Some("parent-portal/1.0"));
    }

    #[test]
    fn test_falls_back_to_connect_info() {
        let mut extensions = Extensions::new();
        extensions.insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 10], 5555))));

        let info = ClientInfo::from_parts(&HeaderMap::new(), &extensions);

        assert_eq!(info.ip_string(), "192.0.2.10");
    }

    #[test]
    fn test_unknown_when_nothing_available() {
        let info = ClientInfo::from_parts(&HeaderMap::new(), &Extensions::new());
        assert_eq!(info.ip_string(), "unknown");
        assert!(info.user_agent.is_none());
    }
}
