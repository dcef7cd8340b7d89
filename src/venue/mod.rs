//! Venue collaborator interfaces

pub mod traits;

pub use traits::{EquityOracle, OrderPlacer, PositionOracle, PriceOracle};
