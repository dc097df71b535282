use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};

use crate::error::ApiError;
use crate::models::{
    AccountSummary, AddAccountRequest, DeleteAccountParams, DeleteAccountResponse,
};
use crate::AppState;

/// List the caller's active linked accounts.
pub async fn list_accounts(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<AccountSummary>>, ApiError> {
    let user = state.auth.user_or_demo(&headers).await?;
    let accounts = state.accounts.list_active(&user.id).await?;
    Ok(Json(accounts))
}

/// Link an account from an externally obtained credential pair, bypassing
/// the handshake. Same upsert semantics as a handshake completion.
pub async fn add_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<AddAccountRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    let user = state.auth.user_or_demo(&headers).await?;

    if req.twitter_username.is_empty() || req.access_token.is_empty() {
        return Err(ApiError::BadRequest(
            "twitterUsername and accessToken are required".to_string(),
        ));
    }

    let access_token = state
        .cipher
        .encrypt(&req.access_token)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let access_secret = state
        .cipher
        .encrypt(&req.access_token_secret)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let summary = state
        .accounts
        .upsert(&user.id, &req.twitter_username, access_token, access_secret)
        .await?;

    Ok((StatusCode::CREATED, Json(summary)))
}

/// Unlink an owned account.
pub async fn remove_account(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DeleteAccountParams>,
) -> Result<Json<DeleteAccountResponse>, ApiError> {
    let user = state.auth.user_or_demo(&headers).await?;

    if params.id.is_empty() {
        return Err(ApiError::BadRequest("account id is required".to_string()));
    }

    let removed = state.accounts.delete(&user.id, &params.id).await?;
    if !removed {
        return Err(ApiError::NotFound("twitter account not found".to_string()));
    }

    Ok(Json(DeleteAccountResponse {
        success: true,
        message: "Twitter account disconnected successfully".to_string(),
    }))
}
