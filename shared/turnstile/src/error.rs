use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned when a token could not be checked.
///
/// A token the service rejects is reported through
/// [`SiteVerifyResponse::success`](crate::SiteVerifyResponse::success), not
/// through this type. The only exception is [`TurnstileError::Rejected`], which
/// is produced on request by
/// [`SiteVerifyResponse::into_result`](crate::SiteVerifyResponse::into_result).
#[derive(Debug, Error)]
pub enum TurnstileError {
    /// The outbound request could not be serialized. No request was sent.
    #[error("Failed to encode siteverify request: {0}")]
    Encode(#[source] serde_json::Error),

    /// The round trip to the siteverify endpoint did not complete
    #[error("Siteverify request failed: {0}")]
    Transport(#[from] reqwest_middleware::Error),

    /// The response body was not the expected JSON document
    #[error("Failed to decode siteverify response (status {status}): {source}")]
    Decode {
        /// HTTP status of the undecodable response
        status: StatusCode,
        /// The underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// The caller-supplied deadline elapsed before the service answered
    #[error("Siteverify request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller cancelled the request
    #[error("Siteverify request was cancelled")]
    Cancelled,

    /// The service rejected the token
    #[error("Token rejected: {}", error_codes.join(", "))]
    Rejected {
        /// Error codes reported by the service
        error_codes: Vec<String>,
    },
}

impl From<reqwest::Error> for TurnstileError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.into())
    }
}

/// Result type for verification operations
pub type TurnstileResult<T, E = TurnstileError> = Result<T, E>;
