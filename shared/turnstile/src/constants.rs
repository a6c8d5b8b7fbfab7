/// Production siteverify endpoint
pub const SITEVERIFY_URL: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Default timeout for siteverify requests made with the shared client
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of idle connections to maintain per host
pub const MAX_IDLE_CONNECTIONS_PER_HOST: usize = 10;

/// User agent sent by the shared client
pub const USER_AGENT: &str = concat!("turnstile/", env!("CARGO_PKG_VERSION"));
