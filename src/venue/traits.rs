//! Collaborator interfaces implemented by the venue-client layer
//!
//! The router core never talks to a venue directly. It reads state
//! through three read-only oracles and places orders through one
//! placer. Implementations own transport, authentication, and symbol
//! mapping; the core owns the decision logic.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::common::errors::Result;
use crate::common::types::{OrderRequest, OrderResult, Position};

/// Read the current net position state from the venue
///
/// Queried fresh at the start of every per-symbol critical section;
/// the core never caches positions authoritatively.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PositionOracle: Send + Sync {
    /// Net position for one symbol; flat with zero quantity when none
    async fn get_net(&self, symbol: &str) -> Result<Position>;

    /// Number of distinct symbols with a nonzero open position
    ///
    /// Lives on the same oracle because venues answer both questions
    /// from a single positions query.
    async fn count_open_symbols(&self) -> Result<usize>;
}

/// Read the account's quote-currency equity
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EquityOracle: Send + Sync {
    async fn get_equity(&self) -> Result<Decimal>;
}

/// Read the last traded price for a symbol
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceOracle: Send + Sync {
    async fn get_last(&self, symbol: &str) -> Result<Decimal>;
}

/// Place a single order at the venue
///
/// One call per order, no retry; retry policy belongs to the caller of
/// the signal boundary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderPlacer: Send + Sync {
    async fn place(&self, request: &OrderRequest) -> Result<OrderResult>;
}
