use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{AccessRestrictions, ConsentStatus};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(
        required(message = "email is required"),
        email(message = "Invalid email format")
    )]
    pub email: Option<String>,

    #[validate(
        required(message = "age is required"),
        range(min = 13, max = 120, message = "age must be between 13 and 120")
    )]
    pub age: Option<i32>,

    #[validate(length(min = 1, max = 50, message = "username must be 1-50 characters"))]
    pub username: Option<String>,

    pub kids_mode: Option<bool>,

    /// Explicit minor flag, e.g. set by a parent-managed signup.
    pub is_minor: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub id: String,
    pub email: String,
    pub is_minor: bool,
    pub access_restrictions: AccessRestrictions,
    pub kids_mode: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionsResponse {
    pub is_minor: bool,
    pub access_restrictions: AccessRestrictions,
    pub kids_mode: bool,
    pub effective_kids_mode: bool,
    pub account_restricted: bool,
    pub consent_status: Option<ConsentStatus>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct KidsModeRequest {
    #[validate(required(message = "kidsMode is required"))]
    pub kids_mode: Option<bool>,
}
