use async_trait::async_trait;
use chrono::Utc;
use twitter_api::TwitterClient;

use crate::error::FlowError;
use crate::models::PendingAuthorization;

#[derive(Debug, Clone)]
pub struct RequestTokenCredentials {
    pub token: String,
    pub secret: String,
}

/// Result of a completed handshake: permanent credentials plus the
/// authenticated identity.
#[derive(Debug, Clone)]
pub struct AccessTokenGrant {
    pub token: String,
    pub secret: String,
    pub screen_name: String,
    pub external_user_id: String,
}

/// The two provider-facing legs of the handshake, abstracted so the
/// coordinator runs unchanged against the live Twitter API, the demo
/// placeholders, or a test double.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn request_token(
        &self,
        callback_url: &str,
    ) -> Result<RequestTokenCredentials, FlowError>;

    async fn access_token(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<AccessTokenGrant, FlowError>;

    fn authorization_url(&self, pending: &PendingAuthorization) -> String;
}

/// Live provider backed by the Twitter OAuth 1.0a endpoints.
pub struct TwitterProvider {
    client: TwitterClient,
}

impl TwitterProvider {
    pub fn new(client: TwitterClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TokenProvider for TwitterProvider {
    async fn request_token(
        &self,
        callback_url: &str,
    ) -> Result<RequestTokenCredentials, FlowError> {
        let token = self.client.request_token(callback_url).await?;
        Ok(RequestTokenCredentials {
            token: token.token,
            secret: token.token_secret,
        })
    }

    async fn access_token(
        &self,
        pending: &PendingAuthorization,
        verifier: &str,
    ) -> Result<AccessTokenGrant, FlowError> {
        let token = self
            .client
            .access_token(&pending.request_token, &pending.request_secret, verifier)
            .await?;
        Ok(AccessTokenGrant {
            token: token.token,
            secret: token.token_secret,
            screen_name: token.screen_name,
            external_user_id: token.user_id,
        })
    }

    fn authorization_url(&self, pending: &PendingAuthorization) -> String {
        self.client.authorize_url(&pending.request_token)
    }
}

pub const DEMO_VERIFIER: &str = "demo_verifier";
pub const DEMO_SCREEN_NAME: &str = "demo_twitter_user";

/// Demo provider: no network calls, deterministic placeholder identity.
/// Visiting its authorization URL supplies the fixed demo verifier back to
/// the callback.
pub struct DemoProvider;

#[async_trait]
impl TokenProvider for DemoProvider {
    async fn request_token(
        &self,
        _callback_url: &str,
    ) -> Result<RequestTokenCredentials, FlowError> {
        Ok(RequestTokenCredentials {
            token: format!("demo_oauth_token_{}", Utc::now().timestamp_millis()),
            secret: "demo_oauth_secret".to_string(),
        })
    }

    async fn access_token(
        &self,
        pending: &PendingAuthorization,
        _verifier: &str,
    ) -> Result<AccessTokenGrant, FlowError> {
        let now = Utc::now().timestamp_millis();
        Ok(AccessTokenGrant {
            token: format!("demo_access_token_{now}"),
            secret: format!("demo_access_secret_{now}"),
            screen_name: DEMO_SCREEN_NAME.to_string(),
            external_user_id: format!("demo_twitter_id_{}", pending.user_id),
        })
    }

    fn authorization_url(&self, pending: &PendingAuthorization) -> String {
        format!(
            "{}?oauth_token={}&oauth_verifier={}&state={}",
            pending.callback_url, pending.request_token, DEMO_VERIFIER, pending.state
        )
    }
}
