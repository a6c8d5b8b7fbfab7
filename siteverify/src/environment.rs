//! Environment configuration for different deployment stages

use std::env;

use tracing::Level;
use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

/// Application environment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Production environment
    Production,
    /// Staging environment
    Staging,
    /// Development environment
    Development,
}

impl Environment {
    /// Creates an Environment from the `APP_ENV` environment variable
    ///
    /// # Panics
    ///
    /// Panics if `APP_ENV` contains an invalid value
    #[must_use]
    pub fn from_env() -> Self {
        let env = env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .trim()
            .to_lowercase();

        match env.as_str() {
            "production" => Self::Production,
            "staging" => Self::Staging,
            "development" => Self::Development,
            _ => panic!("Invalid environment: {env}"),
        }
    }

    /// Default log level, overridable with `TRACING_LEVEL`
    #[must_use]
    pub fn tracing_level(&self) -> Level {
        env::var("TRACING_LEVEL")
            .ok()
            .and_then(|val| val.parse::<Level>().ok())
            .unwrap_or(match self {
                Self::Production | Self::Staging => Level::INFO,
                Self::Development => Level::DEBUG,
            })
    }

    /// Installs the global tracing subscriber.
    ///
    /// JSON lines for staging/production, human readable output for development.
    /// `RUST_LOG` directives take precedence over [`Self::tracing_level`].
    pub fn init_tracing(&self) {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::from_level(self.tracing_level()).into())
            .from_env_lossy();

        match self {
            Self::Production | Self::Staging => {
                fmt()
                    .json()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
            Self::Development => {
                fmt()
                    .with_env_filter(filter)
                    .with_writer(std::io::stderr)
                    .init();
            }
        }
    }
}
