use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ConsentStatus, VerificationMethod};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RequestConsentRequest {
    #[validate(
        required(message = "childEmail is required"),
        email(message = "Invalid childEmail format")
    )]
    pub child_email: Option<String>,

    #[validate(
        required(message = "childAge is required"),
        range(min = 1, max = 120, message = "childAge must be between 1 and 120")
    )]
    pub child_age: Option<i32>,

    #[validate(email(message = "Invalid parentEmail format"))]
    pub parent_email: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestConsentResponse {
    pub message: String,
    pub status: ConsentStatus,
    pub kids_mode: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VerifyConsentRequest {
    #[validate(
        required(message = "childEmail is required"),
        email(message = "Invalid childEmail format")
    )]
    pub child_email: Option<String>,

    /// Absent counts as a refusal.
    #[serde(default)]
    pub parent_confirmed: Option<bool>,

    pub verification_method: Option<VerificationMethod>,

    #[validate(length(min = 1, max = 256))]
    pub parent_identity: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RevokeConsentRequest {
    #[validate(
        required(message = "childEmail is required"),
        email(message = "Invalid childEmail format")
    )]
    pub child_email: Option<String>,

    #[validate(required(message = "parentEmail is required"))]
    pub parent_email: Option<String>,

    #[validate(
        required(message = "reason is required"),
        length(min = 1, max = 1000, message = "reason must not be empty")
    )]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentActionResponse {
    pub success: bool,
    pub message: String,
    pub status: ConsentStatus,
}
