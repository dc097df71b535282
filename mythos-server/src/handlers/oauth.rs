use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::Html,
    Json,
};

use crate::error::ApiError;
use crate::models::{AccountSummary, BeginOAuthResponse, CallbackParams, CompleteOAuthRequest};
use crate::services::LinkedAccountGrant;
use crate::AppState;

const SUCCESS_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Account Linked</title>
    <style>
        body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
               background: #111827; display: flex; justify-content: center;
               align-items: center; height: 100vh; }
        .card { background: white; border-radius: 12px; padding: 48px;
                text-align: center; max-width: 400px; }
        .mark { width: 64px; height: 64px; border-radius: 50%; background: #10B981;
                color: white; display: inline-flex; align-items: center;
                justify-content: center; font-size: 32px; margin-bottom: 24px; }
        h1 { color: #1F2937; margin: 0 0 12px 0; font-size: 24px; }
        p { color: #6B7280; margin: 0; line-height: 1.5; }
    </style>
</head>
<body>
    <div class="card">
        <div class="mark">&#10003;</div>
        <h1>Twitter Account Linked</h1>
        <p>@{SCREEN_NAME} is now connected to Mythos. You can close this window.</p>
    </div>
</body>
</html>"#;

const ERROR_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Linking Failed</title>
    <style>
        body { margin: 0; font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
               background: #111827; display: flex; justify-content: center;
               align-items: center; height: 100vh; }
        .card { background: white; border-radius: 12px; padding: 48px;
                text-align: center; max-width: 400px; }
        .mark { width: 64px; height: 64px; border-radius: 50%; background: #EF4444;
                color: white; display: inline-flex; align-items: center;
                justify-content: center; font-size: 32px; margin-bottom: 24px; }
        h1 { color: #1F2937; margin: 0 0 12px 0; font-size: 24px; }
        p { color: #6B7280; margin: 0 0 24px 0; line-height: 1.5; }
        .detail { background: #FEE2E2; border-radius: 8px; padding: 16px;
                  color: #991B1B; font-family: monospace; font-size: 14px; }
    </style>
</head>
<body>
    <div class="card">
        <div class="mark">&#10007;</div>
        <h1>Could Not Link Account</h1>
        <p>There was an error during authorization.</p>
        <div class="detail">{ERROR}</div>
    </div>
</body>
</html>"#;

/// Begin a handshake for the authenticated caller. Returns the URL the
/// user must visit plus the state token to echo back on completion.
pub async fn begin_oauth(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BeginOAuthResponse>, ApiError> {
    let user = state.auth.require_user(&headers).await?;

    let span = tracing::info_span!("begin_oauth", user_id = %user.id);
    let _enter = span.enter();

    let callback_url = format!("{}/api/twitter/oauth/callback", state.public_url);
    let begun = state.flow.begin_authorization(&user.id, &callback_url).await?;

    Ok(Json(BeginOAuthResponse {
        auth_url: begun.auth_url,
        state: begun.state,
    }))
}

/// Complete a handshake with the token/verifier pair from the provider
/// callback and persist the linked account.
pub async fn complete_oauth(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CompleteOAuthRequest>,
) -> Result<(StatusCode, Json<AccountSummary>), ApiError> {
    let user = state.auth.require_user(&headers).await?;

    let span = tracing::info_span!("complete_oauth", user_id = %user.id);
    let _enter = span.enter();

    if req.oauth_token.is_empty() || req.oauth_verifier.is_empty() || req.state.is_empty() {
        return Err(ApiError::BadRequest("missing oauth parameters".to_string()));
    }

    let grant = state
        .flow
        .complete_authorization(&req.state, &req.oauth_token, &req.oauth_verifier)
        .await?;

    // The handshake must have been started by the same user completing it.
    if grant.user_id != user.id {
        return Err(ApiError::BadRequest("user mismatch in oauth flow".to_string()));
    }

    let summary = persist_grant(&state, &grant).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Browser landing page for the provider redirect. Completes the handshake
/// identified by the state token and reports the outcome as HTML.
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<Html<String>, ApiError> {
    if params.denied.is_some() {
        tracing::warn!("user denied twitter authorization");
        if let Some(denied_state) = params.state.as_deref() {
            state.flow.abandon(denied_state).await?;
        }
        return Ok(Html(ERROR_HTML.replace("{ERROR}", "authorization was denied")));
    }

    let oauth_state = params
        .state
        .ok_or_else(|| ApiError::BadRequest("missing state parameter".to_string()))?;
    let oauth_token = params
        .oauth_token
        .ok_or_else(|| ApiError::BadRequest("missing oauth_token parameter".to_string()))?;
    let oauth_verifier = params
        .oauth_verifier
        .ok_or_else(|| ApiError::BadRequest("missing oauth_verifier parameter".to_string()))?;

    let span = tracing::info_span!("oauth_callback", state = %oauth_state);
    let _enter = span.enter();

    match state
        .flow
        .complete_authorization(&oauth_state, &oauth_token, &oauth_verifier)
        .await
    {
        Ok(grant) => {
            let summary = persist_grant(&state, &grant).await?;
            Ok(Html(SUCCESS_HTML.replace("{SCREEN_NAME}", &summary.twitter_username)))
        }
        Err(err) => {
            tracing::warn!(error = %err, "oauth callback failed");
            Ok(Html(ERROR_HTML.replace("{ERROR}", &err.to_string())))
        }
    }
}

async fn persist_grant(
    state: &AppState,
    grant: &LinkedAccountGrant,
) -> Result<AccountSummary, ApiError> {
    let access_token = state
        .cipher
        .encrypt(&grant.access_token)
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let access_secret = state
        .cipher
        .encrypt(&grant.access_secret)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    let summary = state
        .accounts
        .upsert(&grant.user_id, &grant.screen_name, access_token, access_secret)
        .await?;

    tracing::info!(
        user_id = %grant.user_id,
        twitter_username = %summary.twitter_username,
        "linked twitter account"
    );

    Ok(summary)
}
