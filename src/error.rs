//! Error taxonomy shared by every feed backend.
//!
//! Backends map their native failures (store lookups, HTTP status codes,
//! tRPC error codes) onto [`FeedError`] so the app can decide how to surface
//! each one without knowing which backend produced it.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Bad input shape or length (empty post, 281 characters, bad username).
    #[error("validation error: {0}")]
    Validation(String),

    /// The author exceeded the posting quota.
    #[error("rate limit exceeded")]
    RateLimitExceeded,

    /// Missing post, user, or pagination cursor.
    #[error("not found: {0}")]
    NotFound(String),

    /// A post references an author the directory cannot resolve, or one
    /// without a username.  Fatal for the request that hit it.
    #[error("author not found for post {0}")]
    AuthorNotFound(String),

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with something we could not interpret.
    #[error("protocol error: {0}")]
    Protocol(String),
}

impl FeedError {
    /// Short text for the status bar.
    pub fn user_message(&self) -> String {
        match self {
            FeedError::Validation(msg) => msg.clone(),
            FeedError::RateLimitExceeded => {
                "You are posting too fast, try again later".to_string()
            }
            FeedError::NotFound(what) => format!("Not found: {what}"),
            FeedError::AuthorNotFound(_) => "Something went wrong loading posts".to_string(),
            FeedError::Network(e) => format!("Network error: {e}"),
            FeedError::Protocol(e) => format!("Unexpected response: {e}"),
        }
    }
}

impl From<reqwest::Error> for FeedError {
    fn from(e: reqwest::Error) -> Self {
        FeedError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(e: serde_json::Error) -> Self {
        FeedError::Protocol(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FeedError>;
