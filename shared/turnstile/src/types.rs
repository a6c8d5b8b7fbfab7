//! Siteverify wire types.
//!
//! [Siteverify API reference](https://developers.cloudflare.com/turnstile/get-started/server-side-validation/)

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum::{Display, EnumString};

use crate::error::{TurnstileError, TurnstileResult};

/// Body POSTed to the siteverify endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct SiteVerifyRequest<'a> {
    /// The widget's secret key
    pub secret: &'a str,
    /// The token produced by the widget
    pub response: &'a str,
    /// IP address of the visitor that solved the challenge
    #[serde(rename = "remoteip", skip_serializing_if = "Option::is_none")]
    pub remote_ip: Option<&'a str>,
    /// Lets the service recognise a retried submission of the same token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<&'a str>,
}

impl<'a> SiteVerifyRequest<'a> {
    /// Builds a request. Empty optional values are treated as absent so they
    /// are left out of the JSON body.
    pub fn new(
        secret: &'a str,
        token: &'a str,
        remote_ip: Option<&'a str>,
        idempotency_key: Option<&'a str>,
    ) -> Self {
        Self {
            secret,
            response: token,
            remote_ip: remote_ip.filter(|ip| !ip.is_empty()),
            idempotency_key: idempotency_key.filter(|key| !key.is_empty()),
        }
    }
}

/// Verdict returned by the siteverify endpoint.
///
/// Every field is taken as-is from the service. Missing or `null` fields decode
/// to their empty value and unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteVerifyResponse {
    /// Whether the token is valid
    #[serde(default, deserialize_with = "null_as_default")]
    pub success: bool,

    /// Error codes reported by the service, in the order it sent them
    #[serde(
        rename = "error-codes",
        default,
        deserialize_with = "null_as_default"
    )]
    pub error_codes: Vec<String>,

    /// When the challenge was solved. `None` if the service omitted the field
    /// or sent something that is not an RFC 3339 timestamp.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub challenge_ts: Option<DateTime<Utc>>,

    /// Hostname of the site where the challenge was solved
    #[serde(default, deserialize_with = "null_as_default")]
    pub hostname: String,

    /// Action label configured on the widget
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,

    /// Customer data passed to the widget on the client side
    #[serde(rename = "cdata", default, deserialize_with = "null_as_default")]
    pub client_data: String,
}

impl SiteVerifyResponse {
    /// The error codes mapped to [`ErrorCode`], preserving order.
    #[must_use]
    pub fn error_code_kinds(&self) -> Vec<ErrorCode> {
        self.error_codes.iter().map(|code| ErrorCode::parse(code)).collect()
    }

    /// Whether the token had already been redeemed or was too old.
    #[must_use]
    pub fn is_duplicate_or_expired(&self) -> bool {
        self.error_code_kinds()
            .contains(&ErrorCode::TimeoutOrDuplicate)
    }

    /// Turns a rejected verdict into [`TurnstileError::Rejected`].
    ///
    /// # Errors
    /// Returns `Rejected` with the reported error codes when `success` is false.
    pub fn into_result(self) -> TurnstileResult<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(TurnstileError::Rejected {
                error_codes: self.error_codes,
            })
        }
    }
}

/// Error codes documented for the siteverify endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorCode {
    /// The secret parameter was not passed
    MissingInputSecret,
    /// The secret parameter was invalid or did not exist
    InvalidInputSecret,
    /// The response parameter (token) was not passed
    MissingInputResponse,
    /// The response parameter (token) is invalid or has expired
    InvalidInputResponse,
    /// The widget ID extracted from the token is malformed
    InvalidWidgetId,
    /// The secret extracted from the token is malformed
    InvalidParsedSecret,
    /// The request was rejected because it was malformed
    BadRequest,
    /// The token has already been redeemed, or is too old
    TimeoutOrDuplicate,
    /// An internal error happened while validating the token
    InternalError,
    /// A code this crate does not know about
    #[strum(default)]
    Other(String),
}

impl ErrorCode {
    /// Maps a raw error code, falling back to [`ErrorCode::Other`].
    #[must_use]
    pub fn parse(code: &str) -> Self {
        Self::from_str(code).unwrap_or_else(|_| Self::Other(code.to_string()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Tolerates a missing, null or malformed `challenge_ts` instead of failing
/// the whole response.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(raw)) => match DateTime::parse_from_rfc3339(&raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!("Ignoring unparseable challenge_ts {raw:?}: {e}");
                None
            }
        },
        Some(other) => {
            tracing::warn!("Ignoring non-string challenge_ts: {other}");
            None
        }
    })
}
