use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::RngCore;

use crate::error::FlowError;
use crate::models::PendingAuthorization;
use crate::services::provider::TokenProvider;
use crate::services::state_store::StateStore;

/// Output of the begin step: where to send the user, and the state token
/// the caller must echo back.
#[derive(Debug, Clone)]
pub struct BeginAuthorization {
    pub auth_url: String,
    pub state: String,
}

/// Output of a successful completion, ready for the caller to persist as a
/// linked account.
#[derive(Debug, Clone)]
pub struct LinkedAccountGrant {
    pub access_token: String,
    pub access_secret: String,
    pub user_id: String,
    pub screen_name: String,
    pub external_user_id: String,
}

/// Coordinates the three-legged OAuth 1.0a handshake across its two
/// server-side round trips. Which provider and store it talks to is
/// decided once at startup; the flow itself is mode-agnostic.
pub struct OAuthFlow {
    store: Arc<dyn StateStore>,
    provider: Arc<dyn TokenProvider>,
    state_ttl: Duration,
}

impl OAuthFlow {
    pub fn new(
        store: Arc<dyn StateStore>,
        provider: Arc<dyn TokenProvider>,
        state_ttl_seconds: u64,
    ) -> Self {
        Self {
            store,
            provider,
            state_ttl: Duration::seconds(state_ttl_seconds as i64),
        }
    }

    /// 256 bits of randomness, hex-encoded. Unguessable by construction.
    fn generate_state_token() -> String {
        let mut bytes = [0u8; 32];
        rand::rng().fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Step 1: obtain a request token, persist the pending authorization
    /// and hand back the authorization URL.
    pub async fn begin_authorization(
        &self,
        user_id: &str,
        callback_url: &str,
    ) -> Result<BeginAuthorization, FlowError> {
        let credentials = self.provider.request_token(callback_url).await?;

        let pending = PendingAuthorization {
            state: Self::generate_state_token(),
            user_id: user_id.to_string(),
            request_token: credentials.token,
            request_secret: credentials.secret,
            callback_url: callback_url.to_string(),
            expires_at: Utc::now() + self.state_ttl,
        };
        self.store.put(pending.clone()).await?;

        let auth_url = self.provider.authorization_url(&pending);

        tracing::info!(
            user_id = %pending.user_id,
            state = %pending.state,
            "began oauth handshake"
        );

        Ok(BeginAuthorization {
            auth_url,
            state: pending.state,
        })
    }

    /// Step 2: validate the echoed state, exchange the verifier for access
    /// credentials and retire the pending authorization.
    ///
    /// The record is claimed (removed) before the exchange, so a retry
    /// after a transient exchange failure fails with `InvalidState` and the
    /// caller must restart from [`begin_authorization`]. A token mismatch
    /// leaves the record in place for a correctly-matched attempt.
    pub async fn complete_authorization(
        &self,
        state: &str,
        oauth_token: &str,
        oauth_verifier: &str,
    ) -> Result<LinkedAccountGrant, FlowError> {
        let pending = self
            .store
            .get(state)
            .await?
            .ok_or(FlowError::InvalidState)?;

        if pending.is_expired(Utc::now()) {
            self.store.remove(state).await?;
            tracing::warn!(state = %state, "oauth state expired before completion");
            return Err(FlowError::ExpiredState);
        }

        if pending.request_token != oauth_token {
            tracing::warn!(state = %state, "oauth token did not match pending request token");
            return Err(FlowError::TokenMismatch);
        }

        // Claim the record. A concurrent completion racing on the same
        // state loses here and observes InvalidState.
        let pending = self
            .store
            .take(state)
            .await?
            .ok_or(FlowError::InvalidState)?;

        let grant = self.provider.access_token(&pending, oauth_verifier).await?;

        tracing::info!(
            user_id = %pending.user_id,
            screen_name = %grant.screen_name,
            "completed oauth handshake"
        );

        Ok(LinkedAccountGrant {
            access_token: grant.token,
            access_secret: grant.secret,
            user_id: pending.user_id,
            screen_name: grant.screen_name,
            external_user_id: grant.external_user_id,
        })
    }

    /// Retire a handshake the user refused to authorize. The state becomes
    /// invalid immediately instead of lingering until the sweeper runs.
    pub async fn abandon(&self, state: &str) -> Result<(), FlowError> {
        self.store.remove(state).await?;
        tracing::info!(state = %state, "abandoned oauth handshake");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::services::provider::{
        AccessTokenGrant, DemoProvider, RequestTokenCredentials, DEMO_VERIFIER,
    };
    use crate::services::state_store::MemoryStateStore;

    const CALLBACK: &str = "https://app.example/callback";

    fn demo_flow() -> (Arc<MemoryStateStore>, OAuthFlow) {
        let store = Arc::new(MemoryStateStore::new());
        let flow = OAuthFlow::new(store.clone(), Arc::new(DemoProvider), 600);
        (store, flow)
    }

    /// Provider whose exchange leg always fails, for exercising the
    /// claim-before-exchange ordering.
    struct FailingExchangeProvider;

    #[async_trait]
    impl TokenProvider for FailingExchangeProvider {
        async fn request_token(
            &self,
            _callback_url: &str,
        ) -> Result<RequestTokenCredentials, FlowError> {
            Ok(RequestTokenCredentials {
                token: "req-token".to_string(),
                secret: "req-secret".to_string(),
            })
        }

        async fn access_token(
            &self,
            _pending: &PendingAuthorization,
            _verifier: &str,
        ) -> Result<AccessTokenGrant, FlowError> {
            Err(FlowError::Upstream(
                twitter_api::TwitterApiError::MalformedResponse("boom".into()),
            ))
        }

        fn authorization_url(&self, pending: &PendingAuthorization) -> String {
            format!("https://provider.example/authorize?oauth_token={}", pending.request_token)
        }
    }

    #[tokio::test]
    async fn begin_returns_nonempty_unique_states() {
        let (_, flow) = demo_flow();

        let first = flow.begin_authorization("user-1", CALLBACK).await.unwrap();
        let second = flow.begin_authorization("user-1", CALLBACK).await.unwrap();

        assert!(!first.state.is_empty());
        assert_eq!(first.state.len(), 64);
        assert_ne!(first.state, second.state);
    }

    #[tokio::test]
    async fn demo_auth_url_carries_token_verifier_and_state() {
        let (store, flow) = demo_flow();

        let begun = flow.begin_authorization("user-1", CALLBACK).await.unwrap();
        let pending = store.get(&begun.state).await.unwrap().unwrap();

        assert!(begun.auth_url.starts_with(CALLBACK));
        assert!(begun.auth_url.contains(&pending.request_token));
        assert!(begun.auth_url.contains(DEMO_VERIFIER));
        assert!(begun.auth_url.contains(&begun.state));
    }

    #[tokio::test]
    async fn complete_with_unknown_state_is_invalid() {
        let (_, flow) = demo_flow();

        let err = flow
            .complete_authorization("never-issued", "tok", "verifier")
            .await
            .unwrap_err();

        assert!(matches!(err, FlowError::InvalidState));
    }

    #[tokio::test]
    async fn state_is_single_use() {
        let (store, flow) = demo_flow();

        let begun = flow.begin_authorization("user-1", CALLBACK).await.unwrap();
        let token = store
            .get(&begun.state)
            .await
            .unwrap()
            .unwrap()
            .request_token;

        let grant = flow
            .complete_authorization(&begun.state, &token, DEMO_VERIFIER)
            .await
            .unwrap();
        assert_eq!(grant.user_id, "user-1");
        assert_eq!(grant.screen_name, "demo_twitter_user");
        assert_eq!(grant.external_user_id, "demo_twitter_id_user-1");

        let err = flow
            .complete_authorization(&begun.state, &token, DEMO_VERIFIER)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidState));
    }

    #[tokio::test]
    async fn expired_state_fails_and_is_purged() {
        let (store, flow) = demo_flow();

        let pending = PendingAuthorization {
            state: "expired-state".to_string(),
            user_id: "user-1".to_string(),
            request_token: "req-token".to_string(),
            request_secret: "req-secret".to_string(),
            callback_url: CALLBACK.to_string(),
            expires_at: Utc::now() - chrono::Duration::seconds(1),
        };
        store.put(pending).await.unwrap();

        let err = flow
            .complete_authorization("expired-state", "req-token", DEMO_VERIFIER)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::ExpiredState));

        // Purged: the same state now behaves as never issued.
        let err = flow
            .complete_authorization("expired-state", "req-token", DEMO_VERIFIER)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidState));
    }

    #[tokio::test]
    async fn token_mismatch_does_not_consume_the_state() {
        let (store, flow) = demo_flow();

        let begun = flow.begin_authorization("user-1", CALLBACK).await.unwrap();
        let token = store
            .get(&begun.state)
            .await
            .unwrap()
            .unwrap()
            .request_token;

        let err = flow
            .complete_authorization(&begun.state, "wrong-token", DEMO_VERIFIER)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::TokenMismatch));

        // A correctly matched attempt still succeeds.
        flow.complete_authorization(&begun.state, &token, DEMO_VERIFIER)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn abandoned_state_is_invalid() {
        let (store, flow) = demo_flow();

        let begun = flow.begin_authorization("user-1", CALLBACK).await.unwrap();
        let token = store
            .get(&begun.state)
            .await
            .unwrap()
            .unwrap()
            .request_token;

        flow.abandon(&begun.state).await.unwrap();

        let err = flow
            .complete_authorization(&begun.state, &token, DEMO_VERIFIER)
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidState));
    }

    #[tokio::test]
    async fn exchange_failure_consumes_the_state() {
        let store = Arc::new(MemoryStateStore::new());
        let flow = OAuthFlow::new(store.clone(), Arc::new(FailingExchangeProvider), 600);

        let begun = flow.begin_authorization("user-1", CALLBACK).await.unwrap();

        let err = flow
            .complete_authorization(&begun.state, "req-token", "verifier")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::Upstream(_)));

        // The record was claimed before the exchange; retries must restart
        // the handshake.
        let err = flow
            .complete_authorization(&begun.state, "req-token", "verifier")
            .await
            .unwrap_err();
        assert!(matches!(err, FlowError::InvalidState));
    }
}
