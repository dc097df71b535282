use serde::{Deserialize, Serialize};

use super::User;

// GET /api/twitter/oauth
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginOAuthResponse {
    pub auth_url: String,
    pub state: String,
}

// POST /api/twitter/oauth
#[derive(Debug, Deserialize)]
pub struct CompleteOAuthRequest {
    pub oauth_token: String,
    pub oauth_verifier: String,
    pub state: String,
}

// GET /api/twitter/oauth/callback
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub oauth_token: Option<String>,
    pub oauth_verifier: Option<String>,
    pub state: Option<String>,
    /// Set by Twitter when the user refuses authorization.
    pub denied: Option<String>,
}

// POST /api/twitter/accounts
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddAccountRequest {
    pub twitter_username: String,
    pub access_token: String,
    pub access_token_secret: String,
}

// DELETE /api/twitter/accounts?id=...
#[derive(Debug, Deserialize)]
pub struct DeleteAccountParams {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

// GET /api/auth/validate
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub user: UserInfo,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub username: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
        }
    }
}

// GET /api/qr
#[derive(Debug, Deserialize)]
pub struct QrParams {
    pub text: String,
    pub size: Option<u32>,
}

// Health check
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
