use anyhow::{bail, Context, Result};
use clap::Parser;
use turnstile::Verifier;

mod cli;
mod environment;

use cli::Args;
use environment::Environment;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env();
    environment.init_tracing();

    let args = Args::parse();
    let verifier = Verifier::new(args.secret.as_str(), None);

    tracing::info!("Verifying token against {}", verifier.endpoint());

    let response = verifier
        .verify_with_timeout(
            &args.token,
            args.remote_ip.as_deref(),
            args.idempotency_key.as_deref(),
            args.timeout(),
        )
        .await
        .context("Could not verify token")?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.success {
        bail!("Token rejected: {}", response.error_codes.join(", "));
    }

    Ok(())
}
