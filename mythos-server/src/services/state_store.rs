use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use thiserror::Error;

use crate::models::PendingAuthorization;

#[derive(Debug, Error)]
#[error("state store error: {0}")]
pub struct StoreError(pub String);

impl From<StoreError> for crate::error::FlowError {
    fn from(err: StoreError) -> Self {
        crate::error::FlowError::Store(err.0)
    }
}

/// Storage for in-flight handshakes, keyed by state token.
///
/// `take` must be atomic with respect to concurrent callers: of two
/// completions racing on the same state, exactly one receives the record.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn put(&self, pending: PendingAuthorization) -> Result<(), StoreError>;

    async fn get(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError>;

    /// Remove and return the record in one step (delete-on-read).
    async fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError>;

    async fn remove(&self, state: &str) -> Result<(), StoreError>;

    /// Delete every record whose expiry is at or before now. Returns the
    /// number of records removed.
    async fn sweep_expired(&self) -> Result<usize, StoreError>;

    /// Current number of pending handshakes, for monitoring.
    async fn len(&self) -> Result<usize, StoreError>;
}

/// In-memory store used in demo mode and in tests.
#[derive(Default)]
pub struct MemoryStateStore {
    entries: DashMap<String, PendingAuthorization>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn put(&self, pending: PendingAuthorization) -> Result<(), StoreError> {
        self.entries.insert(pending.state.clone(), pending);
        Ok(())
    }

    async fn get(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError> {
        Ok(self.entries.get(state).map(|e| e.clone()))
    }

    async fn take(&self, state: &str) -> Result<Option<PendingAuthorization>, StoreError> {
        Ok(self.entries.remove(state).map(|(_, pending)| pending))
    }

    async fn remove(&self, state: &str) -> Result<(), StoreError> {
        self.entries.remove(state);
        Ok(())
    }

    async fn sweep_expired(&self) -> Result<usize, StoreError> {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, pending| !pending.is_expired(now));
        Ok(before.saturating_sub(self.entries.len()))
    }

    async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.entries.len())
    }
}

/// Background task that periodically removes stale pending authorizations.
/// Abandoned handshakes never complete, so without this the store grows
/// without bound.
pub async fn sweep_loop(store: Arc<dyn StateStore>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        match store.sweep_expired().await {
            Ok(0) => {}
            Ok(swept) => {
                let remaining = store.len().await.unwrap_or(0);
                tracing::info!(swept, remaining, "swept expired oauth states");
            }
            Err(err) => {
                tracing::warn!(error = %err, "sweep of expired oauth states failed");
            }
        }
    }
}
