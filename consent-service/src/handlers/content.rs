use axum::{extract::State, response::IntoResponse, Extension, Json};
use service_core::error::AppError;

use crate::middleware::ResolvedUser;
use crate::AppState;

/// Serves the raw feed. Filtering happens in the content middleware once
/// the response is built.
pub async fn get_content(
    State(state): State<AppState>,
    Extension(user): Extension<ResolvedUser>,
) -> Result<impl IntoResponse, AppError> {
    let feed = state.content.feed().await?;

    tracing::debug!(
        user_id = %user.account.id,
        kids_mode = user.effective_kids_mode,
        "Serving content feed"
    );

    Ok(Json(feed))
}
