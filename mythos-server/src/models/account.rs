use chrono::{DateTime, Utc};
use serde::Serialize;

/// Public shape of a linked Twitter account. Credentials never leave the
/// storage layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub id: String,
    pub twitter_username: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
