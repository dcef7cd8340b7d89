//! Signal boundary and per-symbol serialization
//!
//! One `handle_signal` call per inbound signal. For a single symbol the
//! whole sequence [read position, classify, guard-check, size, dispatch]
//! runs inside a keyed critical section, so two concurrent signals for
//! the same symbol can never both observe "flat" and double-open, or
//! both observe the same held quantity and double-close. Signals for
//! different symbols proceed fully in parallel.

use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, instrument, warn};

use crate::common::errors::{Result, RouterError};
use crate::common::types::{
    OrderRequest, OrderResult, Position, Signal, SignalOutcome,
};
use crate::config::types::AppConfig;
use crate::router::dispatch::{Dispatch, OrderDispatcher};
use crate::router::guard::{GuardState, GuardVerdict, RejectReason};
use crate::router::intent::{Classification, Intent, IntentClassifier, OrderPlan};
use crate::router::sizing::SizeCalculator;
use crate::venue::traits::{EquityOracle, OrderPlacer, PositionOracle, PriceOracle};

/// The four collaborator handles the router needs from the venue layer
#[derive(Clone)]
pub struct Venue {
    pub positions: Arc<dyn PositionOracle>,
    pub equity: Arc<dyn EquityOracle>,
    pub prices: Arc<dyn PriceOracle>,
    pub orders: Arc<dyn OrderPlacer>,
}

/// One async mutex per symbol, created on first use
///
/// The outer lock only protects the map; the per-symbol guard is held
/// across the venue calls.
struct SymbolLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SymbolLocks {
    fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    async fn acquire(&self, symbol: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            // drop entries nobody holds or is waiting on, so the map
            // stays bounded by the set of in-flight symbols
            map.retain(|_, lock| Arc::strong_count(lock) > 1);
            map.entry(symbol.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Routes signals into sized, guarded, correctly-flagged orders
///
/// This is the boundary the (external) HTTP layer calls once per
/// normalized signal. Construction wires configuration into the three
/// core components; the venue collaborators stay behind trait objects.
pub struct SignalRouter {
    venue: Venue,
    classifier: IntentClassifier,
    sizer: SizeCalculator,
    dispatcher: OrderDispatcher,
    guard: Mutex<GuardState>,
    locks: SymbolLocks,
    venue_timeout: Duration,
}

impl SignalRouter {
    pub fn new(config: &AppConfig, venue: Venue) -> Self {
        Self {
            venue,
            classifier: IntentClassifier::new(config.guard.reenter_on_opposite),
            sizer: SizeCalculator::new(config.sizing.policy()),
            dispatcher: OrderDispatcher::new(config.settings.dry_run),
            guard: Mutex::new(GuardState::new(&config.guard)),
            locks: SymbolLocks::new(),
            venue_timeout: Duration::from_secs(config.settings.venue_timeout_seconds),
        }
    }

    /// Process one signal end to end
    ///
    /// Business-level no-ops (guard rejections, sizing skips) come back
    /// as `ok: true` outcomes with a reason. Venue rejections and
    /// transport failures come back as `ok: false` outcomes. Only
    /// malformed input is a hard error.
    #[instrument(skip(self, signal), fields(symbol = %signal.symbol, side = %signal.side))]
    pub async fn handle_signal(&self, signal: Signal) -> Result<SignalOutcome> {
        signal.validate()?;

        let _symbol_guard = self.locks.acquire(&signal.symbol).await;

        let outcome = match self.process(&signal).await {
            Ok(outcome) => outcome,
            Err(RouterError::Venue(detail)) => {
                warn!(%detail, "venue rejected order");
                SignalOutcome::venue_rejected(detail)
            }
            Err(RouterError::Transport(detail)) => {
                warn!(%detail, "transport failure");
                SignalOutcome::failed(detail)
            }
            Err(RouterError::Timeout(detail)) => {
                warn!(%detail, "venue call timed out");
                SignalOutcome::failed(detail)
            }
            Err(other) => return Err(other),
        };

        info!(
            action = %outcome.action,
            reason = outcome.reason.as_deref().unwrap_or("-"),
            "signal processed"
        );
        Ok(outcome)
    }

    /// The critical-section body: fresh venue truth in, orders out
    async fn process(&self, signal: &Signal) -> Result<SignalOutcome> {
        let now = Utc::now();
        let step_size = self.sizer.policy().step_size;

        // Positions are never trusted from a local cache
        let position = self
            .timed("position query", self.venue.positions.get_net(&signal.symbol))
            .await?;

        let plans = match self.classifier.classify(&position, signal) {
            Classification::Skip(reason) => return Ok(SignalOutcome::skipped(reason)),
            Classification::Plans(plans) => plans,
        };

        // Only a fresh open on this symbol faces the portfolio guard;
        // adds, closes, and the flip leg of a close all bypass it.
        if plans[0].intent == Intent::Open {
            let open_symbols = self
                .timed("position count", self.venue.positions.count_open_symbols())
                .await?;
            let mut guard = self.guard.lock().await;
            if let GuardVerdict::Reject(reason) = guard.can_open(
                &signal.symbol,
                signal.side,
                signal.hint,
                !position.is_flat(),
                open_symbols,
                now,
            ) {
                return Ok(SignalOutcome::skipped(reason.as_str()));
            }
        }

        // Dedupe comes after the open rules so a guard-rejected repeat
        // keeps reporting the guard reason; adds and closes reach it too
        {
            let mut guard = self.guard.lock().await;
            if guard.is_duplicate(signal, step_size, now) {
                return Ok(SignalOutcome::skipped(RejectReason::Duplicate.as_str()));
            }
        }

        let outcome = self.execute_plans(signal, &position, plans).await?;

        // Only a signal whose order reached the venue arms the window;
        // a failed or skipped signal may be retried right away
        if outcome.order.is_some() || outcome.entry_order.is_some() {
            self.guard.lock().await.record_signal(signal, step_size, now);
        }
        Ok(outcome)
    }

    async fn execute_plans(
        &self,
        signal: &Signal,
        position: &Position,
        plans: Vec<OrderPlan>,
    ) -> Result<SignalOutcome> {
        let mut close_order: Option<OrderResult> = None;
        let mut entry_order: Option<OrderResult> = None;

        for plan in &plans {
            let quantity = match plan.intent {
                Intent::Close => plan.close_cap.unwrap_or(position.quantity),
                Intent::Open | Intent::Add => match self.entry_quantity(&signal.symbol).await {
                    Ok(quantity) => quantity,
                    Err(err) if close_order.is_some() => {
                        return Ok(Self::entry_leg_failed(close_order.take(), err));
                    }
                    Err(err) => return Err(err),
                },
            };

            let request = OrderRequest {
                symbol: signal.symbol.clone(),
                side: signal.side,
                quantity,
                reduce_only: plan.reduce_only,
            };

            let dispatched = match self
                .timed("order placement", self.dispatcher.dispatch(&*self.venue.orders, &request))
                .await
            {
                Ok(dispatched) => dispatched,
                Err(err) if close_order.is_some() => {
                    return Ok(Self::entry_leg_failed(close_order.take(), err));
                }
                Err(err) => return Err(err),
            };

            match dispatched {
                Dispatch::Placed(result) => {
                    if plan.reduce_only {
                        close_order = Some(result);
                    } else {
                        entry_order = Some(result);
                    }
                }
                Dispatch::Skipped { reason } => {
                    // A skipped flip leg still leaves a completed close
                    if close_order.is_none() && entry_order.is_none() {
                        return Ok(SignalOutcome::skipped(reason));
                    }
                }
            }
        }

        Ok(match (close_order, entry_order) {
            (Some(close), entry) => SignalOutcome::filled_pair(close, entry),
            (None, Some(entry)) => SignalOutcome::filled(entry),
            (None, None) => SignalOutcome::skipped("qty_below_minimum"),
        })
    }

    /// Outcome for a flip whose entry leg died after the close filled
    ///
    /// The filled close stays on the outcome; losing its record would
    /// make the caller believe the position is still held.
    fn entry_leg_failed(close_order: Option<OrderResult>, err: RouterError) -> SignalOutcome {
        warn!(error = %err, "entry leg failed after close leg filled");
        let mut outcome = match err {
            RouterError::Venue(detail) => SignalOutcome::venue_rejected(detail),
            other => SignalOutcome::failed(other.to_string()),
        };
        outcome.order = close_order;
        outcome
    }

    /// Equal-notional entry quantity for the symbol at the current price
    async fn entry_quantity(&self, symbol: &str) -> Result<Decimal> {
        let price = self
            .timed("price query", self.venue.prices.get_last(symbol))
            .await?;
        if price <= Decimal::ZERO {
            return Ok(Decimal::ZERO);
        }

        let equity = match self.sizer.policy().reference_balance_quote {
            Some(reference) if reference > Decimal::ZERO => reference,
            _ => {
                let oracle_equity = self
                    .timed("equity query", self.venue.equity.get_equity())
                    .await?;
                self.sizer.sizing_equity(oracle_equity)
            }
        };

        Ok(self.sizer.compute_entry_qty(equity, price))
    }

    /// Run a venue call under the configured time budget
    async fn timed<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.venue_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(RouterError::Timeout(format!(
                "{} exceeded {:?}",
                what, self.venue_timeout
            ))),
        }
    }
}
