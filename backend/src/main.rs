use anyhow::{anyhow, Result};
use clap::Parser;
use listy::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env must be loaded before clap reads environment fallbacks
    dotenvy::dotenv().ok();
    let config = Config::parse();
    init_tracing(config.debug)?;
    tracing::debug!(?config, "configuration loaded");

    if let Err(err) = listy::serve(config).await {
        tracing::error!("{:#}", err);
        return Err(err);
    }
    Ok(())
}

fn init_tracing(debug: bool) -> Result<()> {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}
