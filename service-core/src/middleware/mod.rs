pub mod client_info;
pub mod metrics;
pub mod security_headers;
pub mod tracing;
