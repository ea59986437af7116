use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationMethod {
    /// Code issued through the deletion-code endpoint and matched by hash.
    IssuedCode,
    /// Code presence only; issuance enforcement disabled.
    PresenceOnly,
}

/// Lifecycle of a deletion log. Written `pending` before the account is
/// removed and settled once the removal has succeeded or failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletionStatus {
    Pending,
    Completed,
    Failed,
}

impl DeletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionStatus::Pending => "pending",
            DeletionStatus::Completed => "completed",
            DeletionStatus::Failed => "failed",
        }
    }
}

/// Evidence that a child's data was erased on a parent's request. Only a
/// `completed` log attests an erasure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionLog {
    #[serde(rename = "_id")]
    pub id: String,
    pub child_id: String,
    pub child_email: String,
    pub parent_email: String,
    pub deleted_at: DateTime<Utc>,
    pub request_ip: String,
    pub confirmation_method: ConfirmationMethod,
    pub status: DeletionStatus,
}

impl DeletionLog {
    pub fn new(
        child_id: &str,
        child_email: &str,
        parent_email: &str,
        request_ip: &str,
        confirmation_method: ConfirmationMethod,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            child_id: child_id.to_string(),
            child_email: child_email.to_string(),
            parent_email: parent_email.to_string(),
            deleted_at: Utc::now(),
            request_ip: request_ip.to_string(),
            confirmation_method,
            status: DeletionStatus::Pending,
        }
    }
}
