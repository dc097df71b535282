use axum::{extract::State, http::HeaderMap, Json};

use crate::error::ApiError;
use crate::models::ValidateResponse;
use crate::AppState;

/// Resolve the caller's identity from the bearer token, falling back to
/// the shared demo user when none is presented or the token is unknown.
pub async fn validate_token(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ValidateResponse>, ApiError> {
    let user = state.auth.user_or_demo(&headers).await?;

    tracing::debug!(user_id = %user.id, is_demo = user.is_demo, "token validated");

    Ok(Json(ValidateResponse { user: user.into() }))
}
