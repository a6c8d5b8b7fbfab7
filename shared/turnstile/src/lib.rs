//! Server-side validation of Cloudflare Turnstile tokens.
//!
//! A browser that passes the Turnstile challenge receives a single-use token.
//! The application forwards that token here and [`Verifier`] checks it against
//! the siteverify endpoint, returning the service's verdict as a
//! [`SiteVerifyResponse`].
//!
//! A rejected token is *not* an error: `verify` returns `Ok` with
//! `success == false` and the reported error codes. `Err` means the token could
//! not be checked at all (encoding, transport or decoding failure).
//!
//! [Server-side validation docs](https://developers.cloudflare.com/turnstile/get-started/server-side-validation/)

/// Endpoint and transport defaults
pub mod constants;

/// Error taxonomy for verification calls
pub mod error;

/// Request and response types of the siteverify exchange
pub mod types;

/// The verifier client and its trait seam
pub mod verifier;

/// Shared HTTP client used when no client is injected.
mod request;

pub use error::{TurnstileError, TurnstileResult};
pub use request::default_client;
pub use types::{ErrorCode, SiteVerifyResponse};
pub use verifier::{TurnstileVerifier, Verifier};

#[cfg(any(test, feature = "test-utils"))]
pub use verifier::mock;
