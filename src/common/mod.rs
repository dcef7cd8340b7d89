//! Shared types and errors used across the router

pub mod errors;
pub mod types;

pub use errors::{Result, RouterError};
pub use types::{
    Action, IntentHint, OrderRequest, OrderResult, Position, PositionSide, Signal, SignalOutcome,
    SignalSide,
};
