//! Signal routing core
//!
//! Turns a directional trade signal into at most two venue orders.
//!
//! ```text
//! Signal
//!   │
//!   ▼
//! IntentClassifier ──── PositionOracle (fresh read, never cached)
//!   │        open / add / close (+ optional flip leg)
//!   ▼
//! PortfolioGuard ────── open-symbol count from the venue
//!   │        max coins, shorts toggle, dedupe, blocked-open memory
//!   ▼
//! SizeCalculator ────── EquityOracle / PriceOracle
//!   │        equal-notional quantity, floored to lot step
//!   ▼
//! OrderDispatcher ───── OrderPlacer (one call, no retry)
//! ```
//!
//! Per signal the whole pipeline runs inside a per-symbol critical
//! section ([`handler::SignalRouter`]), so concurrent signals for one
//! symbol serialize while different symbols proceed in parallel.
//!
//! # Components
//!
//! - [`IntentClassifier`]: position vs. signal side decision table
//! - [`SizeCalculator`]: fixed-fraction sizing with lot-step flooring
//! - [`GuardState`]: portfolio limits and TTL-based signal memory
//! - [`OrderDispatcher`]: single venue call or a no-op skip
//! - [`SignalRouter`]: the boundary tying the four together

pub mod dispatch;
pub mod guard;
pub mod handler;
pub mod intent;
pub mod sizing;

pub use dispatch::{Dispatch, OrderDispatcher};
pub use guard::{GuardState, GuardVerdict, RejectReason};
pub use handler::{SignalRouter, Venue};
pub use intent::{Classification, Intent, IntentClassifier, OrderPlan};
pub use sizing::{SizeCalculator, SizingPolicy};
