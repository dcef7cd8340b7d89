//! Configuration loader

use config::{Config, Environment, File};
use std::path::Path;

use super::types::AppConfig;
use crate::common::errors::{Result, RouterError};

/// Load configuration from file and environment variables
///
/// Priority (highest to lowest):
/// 1. Environment variables (prefixed with ROUTER__)
/// 2. Configuration file (TOML format)
/// 3. Default values
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let mut builder = Config::builder();

    if let Some(path) = config_path {
        if Path::new(path).exists() {
            builder = builder.add_source(File::with_name(path).required(false));
        }
    }

    // e.g. ROUTER__GUARD__MAX_COINS=3, ROUTER__SETTINGS__DRY_RUN=true
    builder = builder.add_source(
        Environment::with_prefix("ROUTER")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| RouterError::Configuration(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| RouterError::Configuration(e.to_string()))?;

    app_config.validate()?;
    Ok(app_config)
}

/// Load configuration from environment variables only
///
/// Accepts the flat variable names the original deployments used
/// (FRACTION_PER_POSITION, MAX_COINS, ALLOW_SHORTS, ...) so existing
/// env files keep working.
pub fn load_from_env() -> Result<AppConfig> {
    // Try to load from .env file
    dotenvy::dotenv().ok();

    let mut cfg = AppConfig::default();

    if let Some(v) = parse_env("FRACTION_PER_POSITION")? {
        cfg.sizing.fraction_per_position = v;
    }
    cfg.sizing.fixed_margin_quote = parse_env("FIXED_MARGIN_QUOTE")?;
    if let Some(v) = parse_env("LEVERAGE")? {
        cfg.sizing.leverage = v;
    }
    if let Some(v) = parse_env("STEP_SIZE")? {
        cfg.sizing.step_size = v;
    }
    if let Some(v) = parse_env("MIN_QUANTITY")? {
        cfg.sizing.min_quantity = v;
    }
    if let Some(v) = parse_env("MIN_NOTIONAL")? {
        cfg.sizing.min_notional = v;
    }
    cfg.sizing.reference_balance_quote = parse_env("REFERENCE_BALANCE_QUOTE")?;

    if let Some(v) = parse_env("MAX_COINS")? {
        cfg.guard.max_coins = v;
    }
    if let Some(v) = parse_env("ALLOW_SHORTS")? {
        cfg.guard.allow_shorts = v;
    }
    if let Some(v) = parse_env("REENTER_ON_OPPOSITE")? {
        cfg.guard.reenter_on_opposite = v;
    }
    if let Some(v) = parse_env("REQUIRE_INTENT_FOR_OPEN")? {
        cfg.guard.require_intent_for_open = v;
    }
    if let Some(v) = parse_env("DEDUPE_WINDOW_SECONDS")? {
        cfg.guard.dedupe_window_seconds = v;
    }
    if let Some(v) = parse_env("BLOCKED_OPEN_TTL_SECONDS")? {
        cfg.guard.blocked_open_ttl_seconds = v;
    }

    if let Ok(v) = std::env::var("LOG_LEVEL") {
        cfg.settings.log_level = v;
    }
    if let Some(v) = parse_env("DRY_RUN")? {
        cfg.settings.dry_run = v;
    }
    if let Some(v) = parse_env("VENUE_TIMEOUT_SECONDS")? {
        cfg.settings.venue_timeout_seconds = v;
    }

    cfg.validate()?;
    Ok(cfg)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| RouterError::Configuration(format!("{}={}: {}", key, raw, e))),
        _ => Ok(None),
    }
}
