use super::consent::AuditContext;

/// Who called, from where, and on which endpoint.
///
/// Threaded explicitly into every service call that audits or denies.
#[derive(Debug, Clone)]
pub struct CallerContext {
    pub endpoint: String,
    pub method: String,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl CallerContext {
    pub fn audit_context(&self) -> AuditContext {
        AuditContext {
            ip_address: Some(self.ip_address.clone()),
            user_agent: self.user_agent.clone(),
        }
    }
}
