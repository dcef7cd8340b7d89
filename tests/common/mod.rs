//! Common test utilities and fixtures

use async_trait::async_trait;
use perp_signal_router::{
    EquityOracle, OrderPlacer, OrderRequest, OrderResult, Position, PositionOracle, PositionSide,
    PriceOracle, Result, RouterError, Venue,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Mutable venue state behind the stub oracles
#[derive(Debug)]
pub struct VenueState {
    pub positions: HashMap<String, Position>,
    pub equity: Decimal,
    pub prices: HashMap<String, Decimal>,
    pub placed: Vec<OrderRequest>,
    next_order_id: u64,
}

/// In-memory venue whose positions move when orders fill
///
/// Implements all four collaborator traits so one `Arc<StubVenue>` can
/// be handed to the router as every handle. Fills apply immediately:
/// a reduce-only order shrinks the held quantity toward flat, an entry
/// order opens or adds in the signal direction.
pub struct StubVenue {
    state: Mutex<VenueState>,
    /// Artificial latency applied to every oracle and placer call
    pub call_delay: Mutex<Option<Duration>>,
    /// When set, the place() call with this sequence number fails with
    /// the given venue detail
    fail_place_at: Mutex<Option<(u64, String)>>,
    place_calls: Mutex<u64>,
}

impl StubVenue {
    pub fn new(equity: Decimal) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(VenueState {
                positions: HashMap::new(),
                equity,
                prices: HashMap::new(),
                placed: Vec::new(),
                next_order_id: 1,
            }),
            call_delay: Mutex::new(None),
            fail_place_at: Mutex::new(None),
            place_calls: Mutex::new(0),
        })
    }

    /// Trait-object handles for the router
    pub fn handles(self: &Arc<Self>) -> Venue {
        Venue {
            positions: self.clone(),
            equity: self.clone(),
            prices: self.clone(),
            orders: self.clone(),
        }
    }

    pub async fn set_price(&self, symbol: &str, price: Decimal) {
        self.state
            .lock()
            .await
            .prices
            .insert(symbol.to_string(), price);
    }

    pub async fn open_position(&self, symbol: &str, side: PositionSide, quantity: Decimal) {
        self.state
            .lock()
            .await
            .positions
            .insert(symbol.to_string(), Position::new(symbol, side, quantity));
    }

    pub async fn close_position(&self, symbol: &str) {
        self.state.lock().await.positions.remove(symbol);
    }

    pub async fn placed(&self) -> Vec<OrderRequest> {
        self.state.lock().await.placed.clone()
    }

    pub async fn position(&self, symbol: &str) -> Position {
        self.state
            .lock()
            .await
            .positions
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Position::flat(symbol))
    }

    pub async fn set_call_delay(&self, delay: Duration) {
        *self.call_delay.lock().await = Some(delay);
    }

    pub async fn fail_next_place(&self, detail: &str) {
        let next = *self.place_calls.lock().await + 1;
        self.fail_place_call(next, detail).await;
    }

    /// Fail the nth place() call (1-based) with a venue rejection
    pub async fn fail_place_call(&self, call: u64, detail: &str) {
        *self.fail_place_at.lock().await = Some((call, detail.to_string()));
    }

    async fn maybe_delay(&self) {
        let delay = *self.call_delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }
}

fn apply_fill(state: &mut VenueState, request: &OrderRequest) {
    let position = state
        .positions
        .entry(request.symbol.clone())
        .or_insert_with(|| Position::flat(&request.symbol));

    if request.reduce_only {
        position.quantity = (position.quantity - request.quantity).max(Decimal::ZERO);
        if position.quantity == Decimal::ZERO {
            position.side = PositionSide::Flat;
        }
    } else if position.is_flat() {
        *position = Position::new(&request.symbol, request.side.opens(), request.quantity);
    } else {
        position.quantity += request.quantity;
    }
}

#[async_trait]
impl PositionOracle for StubVenue {
    async fn get_net(&self, symbol: &str) -> Result<Position> {
        self.maybe_delay().await;
        Ok(self.position(symbol).await)
    }

    async fn count_open_symbols(&self) -> Result<usize> {
        self.maybe_delay().await;
        let state = self.state.lock().await;
        Ok(state
            .positions
            .values()
            .filter(|p| !p.is_flat())
            .count())
    }
}

#[async_trait]
impl EquityOracle for StubVenue {
    async fn get_equity(&self) -> Result<Decimal> {
        self.maybe_delay().await;
        Ok(self.state.lock().await.equity)
    }
}

#[async_trait]
impl PriceOracle for StubVenue {
    async fn get_last(&self, symbol: &str) -> Result<Decimal> {
        self.maybe_delay().await;
        let state = self.state.lock().await;
        Ok(state.prices.get(symbol).copied().unwrap_or(dec!(100)))
    }
}

#[async_trait]
impl OrderPlacer for StubVenue {
    async fn place(&self, request: &OrderRequest) -> Result<OrderResult> {
        self.maybe_delay().await;

        let call = {
            let mut calls = self.place_calls.lock().await;
            *calls += 1;
            *calls
        };
        {
            let mut fail = self.fail_place_at.lock().await;
            if matches!(&*fail, Some((at, _)) if *at == call) {
                let (_, detail) = fail.take().unwrap();
                return Err(RouterError::Venue(detail));
            }
        }

        let mut state = self.state.lock().await;
        state.placed.push(request.clone());
        apply_fill(&mut state, request);
        let id = state.next_order_id;
        state.next_order_id += 1;

        Ok(OrderResult {
            order_id: Some(format!("stub-{}", id)),
            symbol: request.symbol.clone(),
            side: request.side,
            quantity: request.quantity,
            reduce_only: request.reduce_only,
            dry_run: false,
        })
    }
}
