//! perp-signal-router - Main Entry Point
//!
//! Loads configuration, initializes logging, and holds the router core
//! ready for a venue client and webhook frontend to be wired in.

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use perp_signal_router::config;

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Load configuration from environment variables only
    #[arg(long)]
    env_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting perp-signal-router");

    // Load environment variables from .env file if present
    dotenvy::dotenv().ok();

    let cfg = if args.env_only {
        config::load_from_env()?
    } else {
        config::load_config(Some(&args.config))?
    };

    info!(
        max_coins = cfg.guard.max_coins,
        allow_shorts = cfg.guard.allow_shorts,
        fraction = %cfg.sizing.fraction_per_position,
        leverage = %cfg.sizing.leverage,
        dry_run = cfg.settings.dry_run,
        "configuration loaded"
    );

    // The router core is driven through SignalRouter::handle_signal; a
    // venue client implementing the oracle traits and a webhook
    // frontend are wired in by the deployment binary.

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal, cleaning up...");

    Ok(())
}
