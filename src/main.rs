//! StockDesk server: multi-tenant retail back office.
//!
//! Main entry point that loads configuration, initializes logging, and
//! hands off to the API crate.

use anyhow::Context;
use tracing_subscriber::{EnvFilter, fmt};

use stockdesk_core::config::{AppConfig, LoggingConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("STOCKDESK_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).with_context(|| format!("Failed to load configuration for '{env}'"))?;

    init_logging(&config.logging);
    tracing::info!(environment = %env, "Starting StockDesk v{}", env!("CARGO_PKG_VERSION"));

    stockdesk_api::run_server(config).await.context("Server error")?;
    Ok(())
}

/// Initialize tracing. `RUST_LOG` overrides the configured level.
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt().pretty().with_env_filter(filter).with_target(true).init();
        }
    }
}
