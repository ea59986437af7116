//! Security audit trail for authorization failures.
//!
//! Records events such as:
//! - Parent email mismatches on consent and data-rights operations
//! - Age and kids-mode restricted actions
//! - Requests with no resolvable caller identity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::store::ComplianceLog;
use crate::models::CallerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityEventType {
    /// Supplied parent email did not match the stored one
    ParentEmailMismatch,
    /// Monetary or wagering action attempted by a minor
    AgeRestrictionViolation,
    /// Action refused because kids mode or a manual restriction is active
    KidsModeViolation,
    /// No caller identity could be resolved
    MissingIdentity,
    /// Deletion confirmation code absent, wrong or expired
    InvalidDeletionCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityAuditLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub event_type: SecurityEventType,
    pub endpoint: String,
    pub method: String,
    pub ip_address: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Caller user id or child email, whichever identifies the subject
    #[serde(default)]
    pub subject: Option<String>,
    pub details: String,
    pub created_at: DateTime<Utc>,
}

impl SecurityAuditLog {
    pub fn new(
        event_type: SecurityEventType,
        caller: &CallerContext,
        subject: Option<&str>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            event_type,
            endpoint: caller.endpoint.clone(),
            method: caller.method.clone(),
            ip_address: caller.ip_address.clone(),
            user_agent: caller.user_agent.clone(),
            subject: subject.map(str::to_string),
            details: details.into(),
            created_at: Utc::now(),
        }
    }

    pub fn parent_email_mismatch(caller: &CallerContext, child_email: &str) -> Self {
        Self::new(
            SecurityEventType::ParentEmailMismatch,
            caller,
            Some(child_email),
            "Supplied parent email does not match the consent record",
        )
    }
}

/// Writes security events to the structured log and the compliance store.
#[derive(Clone)]
pub struct SecurityAuditService {
    sink: Arc<dyn ComplianceLog>,
}

impl SecurityAuditService {
    pub fn new(sink: Arc<dyn ComplianceLog>) -> Self {
        Self { sink }
    }

    /// Log a security event. Persisted before returning so the entry exists
    /// by the time the denial reaches the caller; a storage failure is only
    /// logged.
    pub async fn log(&self, log: SecurityAuditLog) {
        tracing::warn!(
            event_type = ?log.event_type,
            endpoint = %log.endpoint,
            method = %log.method,
            ip_address = %log.ip_address,
            user_agent = log.user_agent.as_deref().unwrap_or("unknown"),
            timestamp = %log.created_at.to_rfc3339(),
            details = %log.details,
            "Security event"
        );

        if let Err(e) = self.sink.record_security_event(&log).await {
            tracing::error!(
                error = %e,
                event_type = ?log.event_type,
                "Failed to write security audit log"
            );
        }
    }
}
