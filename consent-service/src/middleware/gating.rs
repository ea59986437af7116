//! Per-request entitlement enforcement for payments, betting and content.
//!
//! Every middleware resolves the caller before the handler runs and inserts
//! a [`ResolvedUser`] extension carrying the effective kids-mode decision.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::BodyExt;
use service_core::error::AppError;

use super::caller::caller_context;
use super::identity::{extract_user_id, resolve_account, GatingQuery};
use crate::models::{CallerContext, ChildAccount};
use crate::services::gating::{effective_kids_mode, evaluate, GatedAction, RestrictionReason};
use crate::services::metrics::{record_content_sanitized, record_gating_denial};
use crate::services::sanitizer::sanitize;
use crate::services::{SecurityAuditLog, SecurityEventType};
use crate::AppState;

/// The caller's account and the kids-mode decision made for this request.
#[derive(Debug, Clone)]
pub struct ResolvedUser {
    pub account: ChildAccount,
    pub effective_kids_mode: bool,
}

async fn resolve(
    state: &AppState,
    req: Request,
) -> Result<(ResolvedUser, CallerContext, Request), AppError> {
    let caller = caller_context(req.method(), req.uri(), req.headers(), req.extensions());
    let query = GatingQuery::parse(req.uri().query());

    let (user_id, req) = extract_user_id(req, &query).await?;
    let account = resolve_account(&state.accounts, &state.audit, user_id.as_deref(), &caller).await?;

    let effective_kids_mode = effective_kids_mode(query.kids_mode_override(), &account);
    Ok((
        ResolvedUser {
            account,
            effective_kids_mode,
        },
        caller,
        req,
    ))
}

async fn enforce(
    state: AppState,
    action: GatedAction,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (resolved, caller, mut req) = resolve(&state, req).await?;

    if let Err(reason) = evaluate(&resolved.account, action) {
        let event_type = match reason {
            RestrictionReason::AgeRestriction => SecurityEventType::AgeRestrictionViolation,
            RestrictionReason::AccountRestricted => SecurityEventType::KidsModeViolation,
        };
        state
            .audit
            .log(SecurityAuditLog::new(
                event_type,
                &caller,
                Some(&resolved.account.id),
                format!("{} denied: {}", action.as_str(), reason),
            ))
            .await;
        record_gating_denial(action.as_str(), reason.as_str());

        return Err(AppError::AccessRestricted {
            message: reason.message(action),
            reason: reason.as_str().to_string(),
        });
    }

    req.extensions_mut().insert(resolved);
    Ok(next.run(req).await)
}

pub async fn require_payments_access(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(state, GatedAction::Payments, req, next).await
}

pub async fn require_betting_access(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    enforce(state, GatedAction::Betting, req, next).await
}

/// Resolve the caller without gating any action.
pub async fn require_identity(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (resolved, _caller, mut req) = resolve(&state, req).await?;
    req.extensions_mut().insert(resolved);
    Ok(next.run(req).await)
}

/// Resolve the caller and strip gambling fields from the JSON response when
/// kids mode is in effect or the account lacks full content access.
pub async fn sanitize_content(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (resolved, _caller, mut req) = resolve(&state, req).await?;

    let filter = resolved.effective_kids_mode
        || !GatedAction::Content.is_allowed_by(&resolved.account.access_restrictions);

    req.extensions_mut().insert(resolved);
    let response = next.run(req).await;

    if !filter || !response.status().is_success() || !is_json_response(&response) {
        return Ok(response);
    }

    let (mut parts, body) = response.into_parts();
    let bytes = body
        .collect()
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to read response: {}", e)))?
        .to_bytes();

    let payload: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(payload) => payload,
        // Not actually JSON; never emit unfiltered content in kids mode.
        Err(e) => {
            tracing::error!(error = %e, "Content response is not valid JSON");
            return Err(AppError::InternalError(anyhow::anyhow!(
                "content response could not be sanitized"
            )));
        }
    };

    let sanitized = serde_json::to_vec(&sanitize(&payload))
        .map_err(|e| AppError::InternalError(e.into()))?;
    record_content_sanitized();

    parts.headers.remove(header::CONTENT_LENGTH);
    parts
        .headers
        .insert("x-kids-mode", HeaderValue::from_static("true"));

    Ok(Response::from_parts(parts, Body::from(sanitized)).into_response())
}

fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("application/json"))
        .unwrap_or(false)
}
