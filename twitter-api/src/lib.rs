//! Client for the Twitter OAuth 1.0a token endpoints.
//!
//! Covers the two server-to-server legs of the three-legged flow:
//! obtaining a request token and exchanging an authorized request token
//! plus verifier for access credentials. Request signing is delegated to
//! the `oauth1-request` crate.

mod error;

use std::collections::HashMap;
use std::time::Duration;

use oauth1_request::{Builder, Credentials, HmacSha1};

pub use crate::error::TwitterApiError;

const BASE_URL: &str = "https://api.twitter.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Temporary credential pair returned from `oauth/request_token`.
#[derive(Debug, Clone)]
pub struct RequestToken {
    pub token: String,
    pub token_secret: String,
}

/// Permanent credentials plus identity returned from `oauth/access_token`.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub token_secret: String,
    pub screen_name: String,
    pub user_id: String,
}

pub struct TwitterClient {
    http: reqwest::Client,
    api_key: String,
    api_secret: String,
    base_url: String,
}

impl TwitterClient {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self::with_base_url(api_key, api_secret, BASE_URL)
    }

    /// Point the client at a different host. Used by tests against a mock
    /// server.
    pub fn with_base_url(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The URL the user must visit to authorize a request token.
    pub fn authorize_url(&self, request_token: &str) -> String {
        format!("{}/oauth/authorize?oauth_token={}", self.base_url, request_token)
    }

    /// Obtain a temporary request-token credential pair for the given
    /// callback URL.
    pub async fn request_token(&self, callback_url: &str) -> Result<RequestToken, TwitterApiError> {
        let uri = format!("{}/oauth/request_token", self.base_url);

        let client = Credentials::new(self.api_key.as_str(), self.api_secret.as_str());
        let mut builder = Builder::<_, _>::new(client, HmacSha1::new());
        builder.callback(callback_url);
        let authorization = builder.post(&uri, &());

        let fields = self.send_signed(&uri, authorization).await?;

        if fields.get("oauth_callback_confirmed").map(String::as_str) != Some("true") {
            return Err(TwitterApiError::CallbackRejected);
        }

        Ok(RequestToken {
            token: required_field(&fields, "oauth_token")?,
            token_secret: required_field(&fields, "oauth_token_secret")?,
        })
    }

    /// Exchange an authorized request token and verifier for access
    /// credentials.
    pub async fn access_token(
        &self,
        request_token: &str,
        request_secret: &str,
        verifier: &str,
    ) -> Result<AccessToken, TwitterApiError> {
        let uri = format!("{}/oauth/access_token", self.base_url);

        let client = Credentials::new(self.api_key.as_str(), self.api_secret.as_str());
        let token = Credentials::new(request_token, request_secret);
        let mut builder = Builder::<_, _>::new(client, HmacSha1::new());
        builder.token(token);
        builder.verifier(verifier);
        let authorization = builder.post(&uri, &());

        let fields = self.send_signed(&uri, authorization).await?;

        Ok(AccessToken {
            token: required_field(&fields, "oauth_token")?,
            token_secret: required_field(&fields, "oauth_token_secret")?,
            screen_name: required_field(&fields, "screen_name")?,
            user_id: required_field(&fields, "user_id")?,
        })
    }

    async fn send_signed(
        &self,
        uri: &str,
        authorization: String,
    ) -> Result<HashMap<String, String>, TwitterApiError> {
        let response = self
            .http
            .post(uri)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(TwitterApiError::Status(status, body));
        }

        Ok(parse_form(&body))
    }
}

/// Parse a `key=value&key=value` response body.
fn parse_form(body: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(body.as_bytes())
        .into_owned()
        .collect()
}

fn required_field(
    fields: &HashMap<String, String>,
    name: &str,
) -> Result<String, TwitterApiError> {
    fields
        .get(name)
        .cloned()
        .ok_or_else(|| TwitterApiError::MalformedResponse(format!("missing field `{name}`")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_form_encoded_body() {
        let fields =
            parse_form("oauth_token=abc&oauth_token_secret=def&oauth_callback_confirmed=true");
        assert_eq!(fields.get("oauth_token").unwrap(), "abc");
        assert_eq!(fields.get("oauth_token_secret").unwrap(), "def");
        assert_eq!(fields.get("oauth_callback_confirmed").unwrap(), "true");
    }

    #[test]
    fn decodes_percent_encoded_values() {
        let fields = parse_form("screen_name=demo%5Fuser&user_id=12345");
        assert_eq!(fields.get("screen_name").unwrap(), "demo_user");
        assert_eq!(fields.get("user_id").unwrap(), "12345");
    }

    #[test]
    fn missing_field_is_an_error() {
        let fields = parse_form("oauth_token=abc");
        let err = required_field(&fields, "oauth_token_secret").unwrap_err();
        assert!(matches!(err, TwitterApiError::MalformedResponse(_)));
    }

    #[test]
    fn authorize_url_embeds_the_request_token() {
        let client = TwitterClient::new("key", "secret");
        assert_eq!(
            client.authorize_url("tok123"),
            "https://api.twitter.com/oauth/authorize?oauth_token=tok123"
        );
    }
}
