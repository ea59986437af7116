use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

use crate::dtos::data_rights::{
    DeleteDataRequest, DeleteDataResponse, DeletionCodeRequest, DeletionCodeResponse,
    ParentQuery, RectifyDataRequest, RectifyDataResponse,
};
use crate::models::CallerContext;
use crate::utils::{required, ValidatedJson};
use crate::AppState;

/// `attachment; filename="<prefix>-<slug>-<unix ts>.json"`
fn attachment_disposition(prefix: &str, email: &str) -> String {
    let slug: String = email
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!(
        "attachment; filename=\"{}-{}-{}.json\"",
        prefix,
        slug,
        Utc::now().timestamp()
    )
}

pub async fn export_data(
    State(state): State<AppState>,
    caller: CallerContext,
    Path(child_email): Path<String>,
    Query(query): Query<ParentQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let parent_email = required(query.parent_email, "parentEmail")?;

    let export = state
        .data_rights
        .export_data(&child_email, &parent_email, &caller)
        .await?;

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            attachment_disposition("user-data", &child_email),
        )],
        Json(export),
    ))
}

pub async fn export_consent(
    State(state): State<AppState>,
    caller: CallerContext,
    Path(child_email): Path<String>,
    Query(query): Query<ParentQuery>,
) -> Result<impl IntoResponse, AppError> {
    query.validate()?;
    let parent_email = required(query.parent_email, "parentEmail")?;

    let export = state
        .data_rights
        .export_consent(&child_email, &parent_email, &caller)
        .await?;

    Ok((
        [(
            header::CONTENT_DISPOSITION,
            attachment_disposition("consent-record", &child_email),
        )],
        Json(export),
    ))
}

pub async fn issue_deletion_code(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<DeletionCodeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let parent_email = required(req.parent_email, "parentEmail")?;

    let expires_at = state
        .data_rights
        .issue_deletion_code(&child_email, &parent_email, &caller)
        .await?;

    Ok(Json(DeletionCodeResponse {
        success: true,
        message: "A confirmation code was sent to the parent email on record".to_string(),
        expires_at,
    }))
}

pub async fn delete_data(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<DeleteDataRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let parent_email = required(req.parent_email, "parentEmail")?;
    let confirmation_code = required(req.confirmation_code, "confirmationCode")?;

    let deletion_log = state
        .data_rights
        .delete_data(&child_email, &parent_email, &confirmation_code, &caller)
        .await?;

    Ok(Json(DeleteDataResponse {
        success: true,
        message: "All data for this account has been permanently deleted".to_string(),
        deletion_log,
    }))
}

pub async fn rectify_data(
    State(state): State<AppState>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<RectifyDataRequest>,
) -> Result<impl IntoResponse, AppError> {
    let child_email = required(req.child_email, "childEmail")?;
    let parent_email = required(req.parent_email, "parentEmail")?;
    let updates = required(req.updates, "updates")?;

    let updated_fields = state
        .data_rights
        .rectify_data(&child_email, &parent_email, &updates, &caller)
        .await?;

    let message = if updated_fields.is_empty() {
        "No rectifiable fields supplied"
    } else {
        "Data updated successfully"
    };

    Ok(Json(RectifyDataResponse {
        success: true,
        message: message.to_string(),
        updated_fields,
    }))
}
