use std::time::Duration;

use clap::Parser;

/// Verify a Cloudflare Turnstile token from the command line
#[derive(Debug, Parser)]
#[command(name = "siteverify", version, about)]
pub struct Args {
    /// Secret key of the Turnstile widget
    #[arg(long, env = "TURNSTILE_SECRET_KEY", hide_env_values = true)]
    pub secret: String,

    /// Token produced by the widget
    #[arg(long)]
    pub token: String,

    /// IP address of the visitor that solved the challenge
    #[arg(long)]
    pub remote_ip: Option<String>,

    /// Idempotency key for retried submissions
    #[arg(long)]
    pub idempotency_key: Option<String>,

    /// Give up after this many seconds
    #[arg(long, env = "TURNSTILE_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl Args {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
