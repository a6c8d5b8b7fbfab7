use std::sync::LazyLock;
use std::time::Duration;

use reqwest::Client;

use crate::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, MAX_IDLE_CONNECTIONS_PER_HOST, USER_AGENT};

/// Shared HTTP client with connection pooling for every verifier built without
/// an explicit client. Initialized once, on first use.
static HTTP_CLIENT: LazyLock<Client> = LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS_PER_HOST)
        .user_agent(USER_AGENT)
        .build()
        .expect("Failed to create HTTP client")
});

/// Returns a handle to the process-wide default client.
///
/// `reqwest::Client` is reference counted, so every handle shares the same
/// connection pool.
#[must_use]
pub fn default_client() -> Client {
    HTTP_CLIENT.clone()
}
