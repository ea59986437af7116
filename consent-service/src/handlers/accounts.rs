use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use service_core::error::AppError;

use crate::dtos::accounts::{KidsModeRequest, RestrictionsResponse, SignupRequest, SignupResponse};
use crate::middleware::ResolvedUser;
use crate::models::ChildAccount;
use crate::services::gating::effective_kids_mode;
use crate::utils::{required, ValidatedJson};
use crate::AppState;

fn restrictions_view(account: &ChildAccount, effective_kids_mode: bool) -> RestrictionsResponse {
    RestrictionsResponse {
        is_minor: account.is_minor,
        access_restrictions: account.access_restrictions,
        kids_mode: account.kids_mode,
        effective_kids_mode,
        account_restricted: account.account_restricted,
        consent_status: account.consent_status(),
    }
}

pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = required(req.email, "email")?;
    let age = required(req.age, "age")?;

    let mut account = ChildAccount::new(
        email,
        age,
        req.is_minor.unwrap_or(false),
        state.accounts.policy(),
    );
    account.username = req.username;
    account.kids_mode = req.kids_mode.unwrap_or(false);

    let account = state.accounts.create(account).await?;
    tracing::info!(user_id = %account.id, is_minor = account.is_minor, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            id: account.id,
            email: account.email,
            is_minor: account.is_minor,
            access_restrictions: account.access_restrictions,
            kids_mode: account.kids_mode,
        }),
    ))
}

pub async fn get_restrictions(
    Extension(user): Extension<ResolvedUser>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(restrictions_view(&user.account, user.effective_kids_mode)))
}

pub async fn update_kids_mode(
    State(state): State<AppState>,
    Extension(user): Extension<ResolvedUser>,
    ValidatedJson(req): ValidatedJson<KidsModeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kids_mode = required(req.kids_mode, "kidsMode")?;

    let mut account = user.account;
    account.kids_mode = kids_mode;
    state.accounts.save(&mut account).await?;

    tracing::info!(user_id = %account.id, kids_mode, "Kids mode preference updated");

    let effective = effective_kids_mode(false, &account);
    Ok(Json(restrictions_view(&account, effective)))
}
