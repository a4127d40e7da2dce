use anyhow::Context;
use hass_energy_provider::{EnergyProvider, ProviderConfig};
use std::{env, time::Duration};
use tracing_subscriber::EnvFilter;

const DEFAULT_POLL_SECONDS: u64 = 5;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ProviderConfig::from_env()?;
    let poll_seconds: u64 = match env::var("HASS_POLL_SECONDS") {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value '{raw}' for HASS_POLL_SECONDS"))?,
        Err(_) => DEFAULT_POLL_SECONDS,
    };

    tracing::info!("Starting Home Assistant energy provider: {config:?}");
    let mut provider = EnergyProvider::new(config)?;

    // Stand-in for the host control loop: poll on a steady cadence, the
    // provider itself decides when the hub actually gets asked
    provider
        .run_until(
            Duration::from_secs(poll_seconds.max(1)),
            tokio::signal::ctrl_c(),
        )
        .await;
    tracing::info!("Shutting down");

    Ok(())
}
