use axum::{extract::State, response::IntoResponse, Extension, Json};
use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::payments::{BetResponse, PaymentResponse, PlaceBetRequest, ProcessPaymentRequest};
use crate::middleware::ResolvedUser;
use crate::models::CallerContext;
use crate::services::gating::is_gambling_payment;
use crate::services::metrics::record_gating_denial;
use crate::services::{SecurityAuditLog, SecurityEventType};
use crate::utils::{required, ValidatedJson};
use crate::AppState;

pub const KIDS_MODE_PAYMENT_MESSAGE: &str = "This payment type is not available in Kids Mode";

pub async fn process_payment(
    State(state): State<AppState>,
    Extension(user): Extension<ResolvedUser>,
    caller: CallerContext,
    ValidatedJson(req): ValidatedJson<ProcessPaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if user.effective_kids_mode
        && is_gambling_payment(req.payment_type.as_deref(), req.description.as_deref())
    {
        state
            .audit
            .log(SecurityAuditLog::new(
                SecurityEventType::KidsModeViolation,
                &caller,
                Some(&user.account.id),
                format!(
                    "Gambling payment refused in kids mode (type: {})",
                    req.payment_type.as_deref().unwrap_or("none")
                ),
            ))
            .await;
        record_gating_denial("payments", "kids_mode");

        return Err(AppError::AccessRestricted {
            message: KIDS_MODE_PAYMENT_MESSAGE.to_string(),
            reason: "kids_mode".to_string(),
        });
    }

    let amount = required(req.amount, "amount")?;
    let currency = req.currency.unwrap_or_else(|| "USD".to_string()).to_uppercase();
    let payment_id = Uuid::new_v4().to_string();

    tracing::info!(
        user_id = %user.account.id,
        payment_id = %payment_id,
        currency = %currency,
        "Payment accepted"
    );

    Ok(Json(PaymentResponse {
        success: true,
        payment_id,
        amount,
        currency,
        status: "processed",
        processed_at: Utc::now(),
    }))
}

pub async fn place_bet(
    Extension(user): Extension<ResolvedUser>,
    ValidatedJson(req): ValidatedJson<PlaceBetRequest>,
) -> Result<impl IntoResponse, AppError> {
    let match_id = required(req.match_id, "matchId")?;
    let selection = required(req.selection, "selection")?;
    let stake = required(req.stake, "stake")?;
    let bet_id = Uuid::new_v4().to_string();

    tracing::info!(
        user_id = %user.account.id,
        bet_id = %bet_id,
        match_id = %match_id,
        "Bet placed"
    );

    Ok(Json(BetResponse {
        success: true,
        bet_id,
        match_id,
        selection,
        stake,
        placed_at: Utc::now(),
    }))
}
