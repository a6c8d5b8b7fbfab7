use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::{
    constants::SITEVERIFY_URL,
    error::{TurnstileError, TurnstileResult},
    request::default_client,
    types::{SiteVerifyRequest, SiteVerifyResponse},
};

/// Trait for verifying Turnstile tokens
///
/// Lets applications hold an `Arc<dyn TurnstileVerifier>` and swap in
/// [`mock::MockTurnstileVerifier`] in tests.
#[async_trait::async_trait]
pub trait TurnstileVerifier: Send + Sync {
    /// Verifies `token`. `remote_ip` and `idempotency_key` are optional and
    /// omitted from the request when `None` or empty.
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> TurnstileResult<SiteVerifyResponse>;
}

/// Verifies Turnstile tokens with the siteverify endpoint.
///
/// The verifier holds no per-call state, so one instance can be cloned or
/// shared behind an `Arc` and used concurrently from many tasks. Each call
/// performs exactly one POST and never retries.
#[derive(Clone)]
pub struct Verifier {
    secret: String,
    http_client: ClientWithMiddleware,
    endpoint: String,
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("secret", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Creates a new verifier.
    ///
    /// # Arguments
    /// * `secret` - The secret key of the Turnstile widget
    /// * `http_client` - Client used to post verification requests. When `None`,
    ///   the process-wide [`default_client`](crate::default_client) is used.
    ///
    /// No network activity happens here.
    #[must_use]
    pub fn new(secret: impl Into<String>, http_client: Option<Client>) -> Self {
        let http_client = ClientBuilder::new(http_client.unwrap_or_else(default_client))
            .with(TracingMiddleware::default())
            .build();

        Self {
            secret: secret.into(),
            http_client,
            endpoint: SITEVERIFY_URL.to_string(),
        }
    }

    /// Points the verifier at another endpoint, e.g. a local mock server.
    #[cfg(any(test, feature = "test-utils"))]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The URL verification requests are posted to
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Verifies `token` with the siteverify endpoint.
    ///
    /// # Arguments
    /// * `token` - The token produced by the browser-side widget
    /// * `remote_ip` - Optional IP address of the visitor
    /// * `idempotency_key` - Optional key letting the service detect a retried submission
    ///
    /// # Returns
    /// The service's verdict. A rejected token comes back as `Ok` with
    /// `success == false`.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The request cannot be serialized
    /// - The request fails (connection, DNS, TLS, client timeout)
    /// - The response body is not the expected JSON
    pub async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> TurnstileResult<SiteVerifyResponse> {
        self.send(token, remote_ip, idempotency_key).await
    }

    /// Same as [`Verifier::verify`], bounded by `timeout`.
    ///
    /// # Errors
    /// Returns [`TurnstileError::Timeout`] if the deadline elapses first, and
    /// otherwise the same errors as [`Verifier::verify`].
    pub async fn verify_with_timeout(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
        timeout: Duration,
    ) -> TurnstileResult<SiteVerifyResponse> {
        tokio::time::timeout(timeout, self.send(token, remote_ip, idempotency_key))
            .await
            .map_err(|_| TurnstileError::Timeout(timeout))?
    }

    /// Same as [`Verifier::verify`], aborted as soon as `cancel` fires.
    ///
    /// # Errors
    /// Returns [`TurnstileError::Cancelled`] if the token is cancelled first,
    /// and otherwise the same errors as [`Verifier::verify`].
    pub async fn verify_with_cancellation(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> TurnstileResult<SiteVerifyResponse> {
        tokio::select! {
            () = cancel.cancelled() => Err(TurnstileError::Cancelled),
            result = self.send(token, remote_ip, idempotency_key) => result,
        }
    }

    #[instrument(skip_all, fields(endpoint = %self.endpoint))]
    async fn send(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> TurnstileResult<SiteVerifyResponse> {
        let request = SiteVerifyRequest::new(&self.secret, token, remote_ip, idempotency_key);
        let json_body = serde_json::to_vec(&request).map_err(TurnstileError::Encode)?;

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body)
            .send()
            .await?;

        // The body is read to the end (or dropped on error), releasing the connection
        let status = response.status();
        let body = response.bytes().await?;

        let verdict: SiteVerifyResponse = serde_json::from_slice(&body).map_err(|source| {
            tracing::warn!("Undecodable siteverify response with status {status}");
            TurnstileError::Decode { status, source }
        })?;

        tracing::debug!(
            success = verdict.success,
            error_codes = ?verdict.error_codes,
            hostname = %verdict.hostname,
            "Siteverify responded"
        );

        Ok(verdict)
    }
}

#[async_trait::async_trait]
impl TurnstileVerifier for Verifier {
    async fn verify(
        &self,
        token: &str,
        remote_ip: Option<&str>,
        idempotency_key: Option<&str>,
    ) -> TurnstileResult<SiteVerifyResponse> {
        self.send(token, remote_ip, idempotency_key).await
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    use std::sync::{Mutex, PoisonError};

    use crate::{error::TurnstileResult, types::SiteVerifyResponse};

    use super::TurnstileVerifier;

    /// In-memory stand-in for [`Verifier`](super::Verifier).
    ///
    /// Without an override, non-empty tokens pass and empty tokens fail with
    /// `invalid-input-response`.
    #[derive(Default)]
    pub struct MockTurnstileVerifier {
        override_response: Option<SiteVerifyResponse>,
        seen_tokens: Mutex<Vec<String>>,
    }

    impl MockTurnstileVerifier {
        /// `override_response`, when set, is returned for every token instead
        /// of the default pass/fail behavior.
        #[must_use]
        pub fn new(override_response: Option<SiteVerifyResponse>) -> Self {
            Self {
                override_response,
                seen_tokens: Mutex::new(Vec::new()),
            }
        }

        /// Tokens received so far, in call order
        #[must_use]
        pub fn seen_tokens(&self) -> Vec<String> {
            self.seen_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }
    }

    #[async_trait::async_trait]
    impl TurnstileVerifier for MockTurnstileVerifier {
        async fn verify(
            &self,
            token: &str,
            _remote_ip: Option<&str>,
            _idempotency_key: Option<&str>,
        ) -> TurnstileResult<SiteVerifyResponse> {
            self.seen_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(token.to_string());

            if let Some(response) = &self.override_response {
                return Ok(response.clone());
            }

            Ok(if token.is_empty() {
                SiteVerifyResponse {
                    success: false,
                    error_codes: vec!["invalid-input-response".to_string()],
                    ..SiteVerifyResponse::default()
                }
            } else {
                SiteVerifyResponse {
                    success: true,
                    ..SiteVerifyResponse::default()
                }
            })
        }
    }
}
