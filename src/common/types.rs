//! Core types shared across the router

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::errors::{Result, RouterError};

/// Side of an incoming signal (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSide {
    Buy,
    Sell,
}

impl SignalSide {
    /// Exposure direction this side opens when starting from flat
    pub fn opens(self) -> PositionSide {
        match self {
            SignalSide::Buy => PositionSide::Long,
            SignalSide::Sell => PositionSide::Short,
        }
    }
}

impl std::fmt::Display for SignalSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SignalSide::Buy => write!(f, "buy"),
            SignalSide::Sell => write!(f, "sell"),
        }
    }
}

/// Net position direction on a symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
    Flat,
}

impl PositionSide {
    /// The signal side that reduces this position, if any
    pub fn closing_side(self) -> Option<SignalSide> {
        match self {
            PositionSide::Long => Some(SignalSide::Sell),
            PositionSide::Short => Some(SignalSide::Buy),
            PositionSide::Flat => None,
        }
    }
}

impl std::fmt::Display for PositionSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
            PositionSide::Flat => write!(f, "flat"),
        }
    }
}

/// Optional intent hint attached to a signal by the strategy source
///
/// `Auto` (the default) lets the classifier derive the intent from the
/// current position. `Close` means "never increase exposure with this
/// signal". `Open` is required for fresh entries when
/// `require_intent_for_open` is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentHint {
    Open,
    Add,
    Close,
    #[default]
    Auto,
}

/// A directional trade signal, normalized by the inbound boundary
///
/// Created once per inbound webhook and consumed once. The core never
/// sees raw payload shapes; alias-field handling belongs upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// Venue instrument id, already normalized upstream
    pub symbol: String,
    pub side: SignalSide,
    /// Optional size from the source; used only as an upper bound on
    /// reduce-only closes, never for entry sizing
    #[serde(default)]
    pub requested_size: Option<Decimal>,
    #[serde(default)]
    pub hint: IntentHint,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Signal {
    pub fn new(symbol: impl Into<String>, side: SignalSide) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            requested_size: None,
            hint: IntentHint::Auto,
            received_at: Utc::now(),
        }
    }

    pub fn with_size(mut self, size: Decimal) -> Self {
        self.requested_size = Some(size);
        self
    }

    pub fn with_hint(mut self, hint: IntentHint) -> Self {
        self.hint = hint;
        self
    }

    /// Reject malformed signals before they reach the core
    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            return Err(RouterError::Validation("missing symbol".to_string()));
        }
        if let Some(size) = self.requested_size {
            if size < Decimal::ZERO {
                return Err(RouterError::Validation(format!(
                    "negative requested size: {}",
                    size
                )));
            }
        }
        Ok(())
    }
}

/// Net position on a symbol, read fresh from the venue on every signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub side: PositionSide,
    /// Held quantity in base units, always >= 0
    pub quantity: Decimal,
}

impl Position {
    pub fn new(symbol: impl Into<String>, side: PositionSide, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            side,
            quantity,
        }
    }

    /// A flat (no exposure) position
    pub fn flat(symbol: impl Into<String>) -> Self {
        Self::new(symbol, PositionSide::Flat, Decimal::ZERO)
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat || self.quantity == Decimal::ZERO
    }
}

/// A single order the router asks the venue to place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRequest {
    pub symbol: String,
    pub side: SignalSide,
    pub quantity: Decimal,
    /// When true the venue guarantees this order only decreases exposure
    pub reduce_only: bool,
}

/// Venue response for a placed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderResult {
    /// Venue order id; absent for dry-run results
    pub order_id: Option<String>,
    pub symbol: String,
    pub side: SignalSide,
    pub quantity: Decimal,
    pub reduce_only: bool,
    /// True when the decision path ran but no venue call was made
    #[serde(default)]
    pub dry_run: bool,
}

impl OrderResult {
    /// Fabricate a result for a dry-run dispatch
    pub fn dry_run(request: &OrderRequest) -> Self {
        Self {
            order_id: None,
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            reduce_only: request.reduce_only,
            dry_run: true,
        }
    }
}

/// Terminal state for a processed signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Venue accepted the order(s)
    Filled,
    /// Guard rejection, sizing skip, or nothing to do
    Skipped,
    /// Venue declined the order
    Rejected,
    /// Transport failure or timeout talking to the venue
    Failed,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Filled => write!(f, "filled"),
            Action::Skipped => write!(f, "skipped"),
            Action::Rejected => write!(f, "rejected"),
            Action::Failed => write!(f, "failed"),
        }
    }
}

/// Structured outcome returned to the inbound boundary
///
/// Business-logic skips keep `ok: true` so a retrying signal source does
/// not get into a retry storm over expected no-ops; `ok: false` is
/// reserved for venue rejections and transport failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub ok: bool,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderResult>,
    /// Second order of a close-then-flip, when one was placed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entry_order: Option<OrderResult>,
}

impl SignalOutcome {
    pub fn filled(order: OrderResult) -> Self {
        Self {
            ok: true,
            action: Action::Filled,
            reason: None,
            order: Some(order),
            entry_order: None,
        }
    }

    /// Close leg plus flip entry leg
    pub fn filled_pair(close: OrderResult, entry: Option<OrderResult>) -> Self {
        Self {
            ok: true,
            action: Action::Filled,
            reason: None,
            order: Some(close),
            entry_order: entry,
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        Self {
            ok: true,
            action: Action::Skipped,
            reason: Some(reason.into()),
            order: None,
            entry_order: None,
        }
    }

    pub fn venue_rejected(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            action: Action::Rejected,
            reason: Some(detail.into()),
            order: None,
            entry_order: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            action: Action::Failed,
            reason: Some(detail.into()),
            order: None,
            entry_order: None,
        }
    }
}
