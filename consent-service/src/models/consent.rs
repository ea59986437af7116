//! Parental consent record and its guarded state machine.
//!
//! Every status change goes through [`apply_event`], which validates the
//! transition and appends exactly one [`AuditEntry`] in the same step. The
//! audit trail is only ever pushed to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsentStatus {
    Pending,
    Approved,
    Rejected,
    Revoked,
}

impl ConsentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsentStatus::Pending => "PENDING",
            ConsentStatus::Approved => "APPROVED",
            ConsentStatus::Rejected => "REJECTED",
            ConsentStatus::Revoked => "REVOKED",
        }
    }
}

impl fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationMethod {
    #[serde(alias = "email_link", alias = "email-link")]
    EmailLink,
    #[serde(alias = "credit_card", alias = "credit-card")]
    CreditCard,
    #[serde(alias = "government_id", alias = "id-check")]
    GovernmentId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub timestamp: DateTime<Utc>,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_method: Option<VerificationMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_identity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentRecord {
    pub status: ConsentStatus,
    pub parent_email: Option<String>,
    pub parent_identity: Option<String>,
    pub verification_method: Option<VerificationMethod>,
    pub requested_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub audit_trail: Vec<AuditEntry>,
}

/// Request metadata recorded on each audit entry.
#[derive(Debug, Clone, Default)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsentEvent {
    Requested {
        parent_email: Option<String>,
    },
    Approved {
        method: VerificationMethod,
        parent_identity: Option<String>,
    },
    Rejected {
        method: Option<VerificationMethod>,
        parent_identity: Option<String>,
    },
    Revoked {
        reason: String,
    },
}

impl ConsentEvent {
    pub fn action(&self) -> &'static str {
        match self {
            ConsentEvent::Requested { .. } => "requested",
            ConsentEvent::Approved { .. } => "approved",
            ConsentEvent::Rejected { .. } => "rejected",
            ConsentEvent::Revoked { .. } => "revoked",
        }
    }

    fn target(&self) -> ConsentStatus {
        match self {
            ConsentEvent::Requested { .. } => ConsentStatus::Pending,
            ConsentEvent::Approved { .. } => ConsentStatus::Approved,
            ConsentEvent::Rejected { .. } => ConsentStatus::Rejected,
            ConsentEvent::Revoked { .. } => ConsentStatus::Revoked,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: Option<ConsentStatus>,
    pub to: ConsentStatus,
}

impl fmt::Display for InvalidTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let from = self.from.map(|s| s.as_str()).unwrap_or("NONE");
        write!(f, "consent cannot move from {} to {}", from, self.to)
    }
}

impl std::error::Error for InvalidTransition {}

/// Transition table. `None` is the state where no consent record exists.
pub fn next_status(
    current: Option<ConsentStatus>,
    event: &ConsentEvent,
) -> Result<ConsentStatus, InvalidTransition> {
    let to = event.target();
    let allowed = match event {
        // A new parental request always opens a fresh cycle.
        ConsentEvent::Requested { .. } => true,
        ConsentEvent::Approved { .. } | ConsentEvent::Rejected { .. } => {
            current == Some(ConsentStatus::Pending)
        }
        ConsentEvent::Revoked { .. } => current.is_some(),
    };

    if allowed {
        Ok(to)
    } else {
        Err(InvalidTransition { from: current, to })
    }
}

/// Apply `event` to the consent slot of an account.
///
/// On success the slot holds the new status and one new audit entry. On
/// failure the slot is untouched.
pub fn apply_event(
    slot: &mut Option<ConsentRecord>,
    event: ConsentEvent,
    ctx: &AuditContext,
    now: DateTime<Utc>,
) -> Result<ConsentStatus, InvalidTransition> {
    let next = next_status(slot.as_ref().map(|r| r.status), &event)?;

    let record = slot.get_or_insert_with(|| ConsentRecord {
        status: next,
        parent_email: None,
        parent_identity: None,
        verification_method: None,
        requested_at: None,
        verified_at: None,
        revoked_at: None,
        audit_trail: Vec::new(),
    });

    let mut entry = AuditEntry {
        timestamp: now,
        action: event.action().to_string(),
        verification_method: None,
        parent_identity: None,
        reason: None,
        ip_address: ctx.ip_address.clone(),
        user_agent: ctx.user_agent.clone(),
    };

    match event {
        ConsentEvent::Requested { parent_email } => {
            record.parent_email = parent_email;
            record.requested_at = Some(now);
            record.verified_at = None;
            record.revoked_at = None;
            record.verification_method = None;
            record.parent_identity = None;
        }
        ConsentEvent::Approved {
            method,
            parent_identity,
        } => {
            let identity = parent_identity.or_else(|| record.parent_email.clone());
            record.verified_at = Some(now);
            record.verification_method = Some(method);
            record.parent_identity = identity.clone();
            entry.verification_method = Some(method);
            entry.parent_identity = identity;
        }
        ConsentEvent::Rejected {
            method,
            parent_identity,
        } => {
            let identity = parent_identity.or_else(|| record.parent_email.clone());
            record.verified_at = Some(now);
            record.verification_method = method;
            entry.verification_method = method;
            entry.parent_identity = identity;
        }
        ConsentEvent::Revoked { reason } => {
            record.revoked_at = Some(now);
            entry.reason = Some(reason);
        }
    }

    record.status = next;
    record.audit_trail.push(entry);
    Ok(next)
}
