use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use validator::Validate;

use crate::models::{
    AccessRestrictions, ConsentRecord, ConsentStatus, DeletionLog, Preferences,
    VerificationMethod,
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParentQuery {
    #[validate(required(message = "parentEmail is required"))]
    pub parent_email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCodeRequest {
    #[validate(required(message = "childEmail is required"))]
    pub child_email: Option<String>,

    #[validate(required(message = "parentEmail is required"))]
    pub parent_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionCodeResponse {
    pub success: bool,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataRequest {
    #[validate(required(message = "childEmail is required"))]
    pub child_email: Option<String>,

    #[validate(required(message = "parentEmail is required"))]
    pub parent_email: Option<String>,

    #[validate(
        required(message = "confirmationCode is required"),
        length(min = 1, message = "confirmationCode must not be empty")
    )]
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteDataResponse {
    pub success: bool,
    pub message: String,
    pub deletion_log: DeletionLog,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RectifyDataRequest {
    #[validate(required(message = "childEmail is required"))]
    pub child_email: Option<String>,

    #[validate(required(message = "parentEmail is required"))]
    pub parent_email: Option<String>,

    #[validate(required(message = "updates is required"))]
    pub updates: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RectifyDataResponse {
    pub success: bool,
    pub message: String,
    pub updated_fields: Vec<String>,
}

/// Allowlisted export of a child's personal data. Fields are added here
/// explicitly; nothing from the stored account is copied wholesale.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataExport {
    pub personal_info: PersonalInfo,
    pub consent: Option<ConsentSummary>,
    pub preferences: Preferences,
    pub access_restrictions: AccessRestrictions,
    pub exported_at: DateTime<Utc>,
    pub export_format: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalInfo {
    pub username: Option<String>,
    pub email: String,
    pub age: i32,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentSummary {
    pub status: ConsentStatus,
    pub parent_email: Option<String>,
    pub verification_method: Option<VerificationMethod>,
    pub requested_at: Option<DateTime<Utc>>,
    pub verified_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl From<&ConsentRecord> for ConsentSummary {
    fn from(record: &ConsentRecord) -> Self {
        Self {
            status: record.status,
            parent_email: record.parent_email.clone(),
            verification_method: record.verification_method,
            requested_at: record.requested_at,
            verified_at: record.verified_at,
            revoked_at: record.revoked_at,
        }
    }
}

/// Consent record with its full audit trail.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentExport {
    pub child_email: String,
    pub consent: Option<ConsentRecord>,
    pub exported_at: DateTime<Utc>,
    pub export_format: &'static str,
}
