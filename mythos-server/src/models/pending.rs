use chrono::{DateTime, Utc};

/// One in-flight OAuth handshake, keyed by its state token.
///
/// Created by the coordinator's begin step, consumed exactly once by the
/// complete step or removed by the expiry sweeper. No field is mutated
/// after creation.
#[derive(Debug, Clone)]
pub struct PendingAuthorization {
    pub state: String,
    pub user_id: String,
    pub request_token: String,
    pub request_secret: String,
    pub callback_url: String,
    pub expires_at: DateTime<Utc>,
}

impl PendingAuthorization {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
