use std::sync::Arc;

use axum::http::{header, HeaderMap};

use crate::error::ApiError;
use crate::models::User;
use crate::storage::UserRepository;

/// Extract the bearer credential from an Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Bearer-token authentication with an optional demo-user fallback.
pub struct AuthService {
    users: Arc<UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<UserRepository>) -> Self {
        Self { users }
    }

    /// Strict policy: a valid token or 401. Used by the OAuth endpoints.
    pub async fn require_user(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
        self.users
            .find_by_token(token)
            .await?
            .ok_or(ApiError::Unauthorized)
    }

    /// Lenient policy: fall back to the shared demo user when the token is
    /// missing or unknown. Used by validate and account listing.
    pub async fn user_or_demo(&self, headers: &HeaderMap) -> Result<User, ApiError> {
        if let Some(token) = bearer_token(headers) {
            if let Some(user) = self.users.find_by_token(token).await? {
                return Ok(user);
            }
        }
        Ok(self.users.get_or_create_demo_user().await?)
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc123");
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn rejects_non_bearer_schemes() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn rejects_empty_token() {
        let headers = headers_with("Bearer ");
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn missing_header_yields_none() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
