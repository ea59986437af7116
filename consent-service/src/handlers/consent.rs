use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::consent::{
    ConsentActionResponse, RequestConsentRequest, RequestConsentResponse, RevokeConsentRequest,
    VerifyConsentRequest,
};
use crate::models::{CallerContext, ConsentStatus};
use crate::services::VerifyConsent;
use crate::utils::{required, ValidatedJson};
use crate::AppState;

pub async fn request_consent(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<RequestConsentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let child_age = required(req.child_age, "childAge")?;

    let account = state
        .lifecycle
        .request_consent(&child_email, child_age, req.parent_email, &caller)
        .await?;

    Ok(Json(RequestConsentResponse {
        message: "Parental consent requested".to_string(),
        status: account.consent_status().unwrap_or(ConsentStatus::Pending),
        kids_mode: account.kids_mode,
    }))
}

pub async fn verify_consent(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<VerifyConsentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let parent_confirmed = req.parent_confirmed.unwrap_or(false);

    let status = state
        .lifecycle
        .verify_consent(
            VerifyConsent {
                child_email,
                parent_confirmed,
                verification_method: req.verification_method,
                parent_identity: req.parent_identity,
            },
            &caller,
        )
        .await?;

    let message = if parent_confirmed {
        "Parental consent approved"
    } else {
        "Parental consent rejected"
    };

    Ok(Json(ConsentActionResponse {
        success: parent_confirmed,
        message: message.to_string(),
        status,
    }))
}

pub async fn revoke_consent(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<RevokeConsentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let parent_email = required(req.parent_email, "parentEmail")?;
    let reason = required(req.reason, "reason")?;

    let status = state
        .lifecycle
        .revoke_consent(&child_email, &parent_email, reason, &caller)
        .await?;

    Ok(Json(ConsentActionResponse {
        success: true,
        message: "Parental consent revoked".to_string(),
        status,
    }))
}
