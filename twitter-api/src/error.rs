use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TwitterApiError {
    #[error("request to twitter failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("twitter returned {0}: {1}")]
    Status(StatusCode, String),

    #[error("malformed twitter response: {0}")]
    MalformedResponse(String),

    #[error("callback url was not confirmed by twitter")]
    CallbackRejected,
}
