//! Configuration types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::errors::{Result, RouterError};
use crate::router::sizing::SizingPolicy;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Position sizing policy
    #[serde(default)]
    pub sizing: SizingConfig,
    /// Portfolio guard limits
    #[serde(default)]
    pub guard: GuardConfig,
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
}

impl AppConfig {
    /// Validate ranges the serde layer cannot express
    pub fn validate(&self) -> Result<()> {
        self.sizing.validate()?;
        self.guard.validate()
    }
}

/// Sizing policy configuration
///
/// Either `fixed_margin_quote` (a constant quote-currency margin per
/// position) or `fraction_per_position` (a fraction of account equity)
/// decides the margin budget; the fixed value wins when both are set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SizingConfig {
    /// Fraction of equity committed as margin per position (0..=1)
    #[serde(default = "default_fraction_per_position")]
    pub fraction_per_position: Decimal,
    /// Fixed quote-currency margin per position; overrides fraction mode
    #[serde(default)]
    pub fixed_margin_quote: Option<Decimal>,
    /// Leverage used to derive notional from margin
    #[serde(default = "default_leverage")]
    pub leverage: Decimal,
    /// Instrument lot size; computed quantities are floored to this
    #[serde(default = "default_step_size")]
    pub step_size: Decimal,
    /// Minimum order quantity in base units
    #[serde(default)]
    pub min_quantity: Decimal,
    /// Minimum order notional in quote currency
    #[serde(default = "default_min_notional")]
    pub min_notional: Decimal,
    /// Fixed equity figure for sizing; when set, the equity oracle is
    /// not consulted and per-position margin stays constant as the
    /// account compounds
    #[serde(default)]
    pub reference_balance_quote: Option<Decimal>,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            fraction_per_position: default_fraction_per_position(),
            fixed_margin_quote: None,
            leverage: default_leverage(),
            step_size: default_step_size(),
            min_quantity: Decimal::ZERO,
            min_notional: default_min_notional(),
            reference_balance_quote: None,
        }
    }
}

impl SizingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.fraction_per_position <= Decimal::ZERO || self.fraction_per_position > Decimal::ONE
        {
            return Err(RouterError::Configuration(format!(
                "fraction_per_position must be in (0, 1], got {}",
                self.fraction_per_position
            )));
        }
        if let Some(fixed) = self.fixed_margin_quote {
            if fixed <= Decimal::ZERO {
                return Err(RouterError::Configuration(format!(
                    "fixed_margin_quote must be positive, got {}",
                    fixed
                )));
            }
        }
        if self.leverage <= Decimal::ZERO {
            return Err(RouterError::Configuration(format!(
                "leverage must be positive, got {}",
                self.leverage
            )));
        }
        if self.step_size <= Decimal::ZERO {
            return Err(RouterError::Configuration(format!(
                "step_size must be positive, got {}",
                self.step_size
            )));
        }
        if self.min_quantity < Decimal::ZERO || self.min_notional < Decimal::ZERO {
            return Err(RouterError::Configuration(
                "min_quantity and min_notional must be >= 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Build the immutable policy object consumed by the size calculator
    pub fn policy(&self) -> SizingPolicy {
        SizingPolicy {
            fraction_per_position: self.fraction_per_position,
            fixed_margin_quote: self.fixed_margin_quote,
            leverage: self.leverage,
            step_size: self.step_size,
            min_quantity: self.min_quantity,
            min_notional: self.min_notional,
            reference_balance_quote: self.reference_balance_quote,
        }
    }
}

fn default_fraction_per_position() -> Decimal {
    dec!(0.05)
}

fn default_leverage() -> Decimal {
    dec!(10)
}

fn default_step_size() -> Decimal {
    dec!(0.001)
}

fn default_min_notional() -> Decimal {
    dec!(5)
}

/// Portfolio guard configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Max distinct symbols with a nonzero open position
    #[serde(default = "default_max_coins")]
    pub max_coins: usize,
    /// Whether fresh short entries are allowed
    #[serde(default = "default_allow_shorts")]
    pub allow_shorts: bool,
    /// Oversized opposite-direction signals: close held quantity then
    /// open the remainder (true), or cap at held and discard (false)
    #[serde(default)]
    pub reenter_on_opposite: bool,
    /// Require an explicit `open` intent hint for fresh entries
    #[serde(default)]
    pub require_intent_for_open: bool,
    /// Window within which identical signals are treated as duplicates
    #[serde(default = "default_dedupe_window_seconds")]
    pub dedupe_window_seconds: u64,
    /// How long a max-coins-blocked symbol stays blocked for fresh opens
    #[serde(default = "default_blocked_open_ttl_seconds")]
    pub blocked_open_ttl_seconds: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_coins: default_max_coins(),
            allow_shorts: default_allow_shorts(),
            reenter_on_opposite: false,
            require_intent_for_open: false,
            dedupe_window_seconds: default_dedupe_window_seconds(),
            blocked_open_ttl_seconds: default_blocked_open_ttl_seconds(),
        }
    }
}

impl GuardConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_coins == 0 {
            return Err(RouterError::Configuration(
                "max_coins must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_max_coins() -> usize {
    5
}

fn default_allow_shorts() -> bool {
    true
}

fn default_dedupe_window_seconds() -> u64 {
    10
}

fn default_blocked_open_ttl_seconds() -> u64 {
    300
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Run the full decision path but never call the venue
    #[serde(default)]
    pub dry_run: bool,
    /// Time budget for each oracle/order-placer call
    #[serde(default = "default_venue_timeout_seconds")]
    pub venue_timeout_seconds: u64,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            dry_run: false,
            venue_timeout_seconds: default_venue_timeout_seconds(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_venue_timeout_seconds() -> u64 {
    10
}
