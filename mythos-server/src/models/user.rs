use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    /// Bearer credential presented by API clients. The demo user carries a
    /// well-known token so the demo flow works without registration.
    pub api_token: Option<String>,
    pub is_demo: bool,
    pub created_at: DateTime<Utc>,
}
