//! Payout Splitter - Main Application Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use config::{ConfigLoader, ConfigValidator, LoggingConfig};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;
mod payout;
#[cfg(test)]
mod testing;

use app::Application;

/// Fee splitting payout service
#[derive(Debug, Parser)]
#[command(name = "payout-splitter", version, about)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "CONFIG_PATH", default_value = "config.yaml")]
    config: PathBuf,

    /// Write an example configuration to this path and exit
    #[arg(long, value_name = "PATH")]
    write_example: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    let cli = Cli::parse();

    if let Some(path) = cli.write_example {
        ConfigLoader::create_example(&path)?;
        println!("Example configuration written to {}", path.display());
        return Ok(());
    }

    let config = ConfigLoader::load(&cli.config).context("Failed to load configuration")?;

    init_logging(&config.logging)?;

    if let Err(e) = dotenv_result {
        if !e.to_string().contains("No such file or directory") {
            warn!("Could not load .env file: {}", e);
        }
    }

    info!("Starting Payout Splitter v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config.display());

    let report = ConfigValidator::validate(&config);
    for warning in &report.warnings {
        warn!(field = %warning.field, "{}", warning.message);
    }

    let app = Application::new(config)
        .await
        .context("Failed to create application")?;

    app.run(shutdown_signal()).await?;

    info!("Payout Splitter shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => tracing::error!("Failed to listen for shutdown signal: {}", e),
    }
}

/// Initialize logging. `RUST_LOG` and `LOG_FORMAT` override the configuration.
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&logging.level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    info!(level = %logging.level, format = %log_format, "Logging initialized");

    if logging.level == "trace" || logging.level == "debug" {
        warn!("Debug/trace logging enabled - may impact performance in production");
    }

    Ok(())
}
