//! Error types for the extraction client.

use qassist_core::ExtractionError;
use thiserror::Error;

/// Errors that can occur while talking to the extraction service.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service returned a non-success status.
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    /// The service answered 429.
    #[error("rate limited by extraction service")]
    RateLimited,

    /// The body was not valid JSON for an extraction response.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The body parsed but does not describe a usable result.
    #[error("invalid extraction response: {0}")]
    Invalid(#[from] ExtractionError),

    /// The configured API key variable is not set.
    #[error("API key variable {0} is not set")]
    MissingApiKey(String),
}

impl From<ClientError> for ExtractionError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Http(e) => ExtractionError::Transport(e.to_string()),
            ClientError::Server { status, body } => ExtractionError::Service { status, body },
            ClientError::RateLimited => ExtractionError::RateLimited,
            ClientError::Json(e) => ExtractionError::MalformedResponse(e.to_string()),
            ClientError::Invalid(e) => e,
            ClientError::MissingApiKey(var) => {
                ExtractionError::Transport(format!("API key variable {} is not set", var))
            }
        }
    }
}
