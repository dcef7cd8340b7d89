//! perp-signal-router
//!
//! Ingests directional buy/sell signals for perpetual-futures symbols
//! and translates each into a correctly-sized, correctly-flagged order,
//! enforcing portfolio-level risk limits on the way. Venue access
//! (positions, balances, prices, order placement) stays behind the
//! collaborator traits in [`venue`]; HTTP ingestion and payload
//! normalization belong to the caller of
//! [`router::SignalRouter::handle_signal`].

pub mod common;
pub mod config;
pub mod router;
pub mod venue;

// Re-export commonly used types
pub use common::errors::{Result, RouterError};
pub use common::types::{
    Action, IntentHint, OrderRequest, OrderResult, Position, PositionSide, Signal, SignalOutcome,
    SignalSide,
};
pub use config::types::AppConfig;
pub use router::{
    Classification, GuardState, GuardVerdict, Intent, IntentClassifier, OrderDispatcher,
    RejectReason, SignalRouter, SizeCalculator, SizingPolicy, Venue,
};
pub use venue::traits::{EquityOracle, OrderPlacer, PositionOracle, PriceOracle};
