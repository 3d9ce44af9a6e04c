//! Request and startup errors.

use lambda_http::http::StatusCode;
use thiserror::Error;

/// Errors that end processing of a single slash command.
///
/// Detail is for logs only; the chat user sees the bare status code.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Missing, malformed, stale or mismatched Slack signature.
    #[error("invalid Slack signature: {0}")]
    SignatureInvalid(String),

    /// Body is not a valid slash-command form payload.
    #[error("malformed slash command payload: {0}")]
    PayloadMalformed(String),

    /// Token endpoint unreachable, timed out or returned a non-success status.
    #[error("token endpoint unavailable: {0}")]
    UpstreamUnavailable(String),
}

impl HandlerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::SignatureInvalid(_) => StatusCode::UNAUTHORIZED,
            Self::PayloadMalformed(_) | Self::UpstreamUnavailable(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<reqwest::Error> for HandlerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::UpstreamUnavailable(format!("request timed out: {err}"))
        } else {
            Self::UpstreamUnavailable(err.to_string())
        }
    }
}

/// Errors raised while building configuration at process start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
