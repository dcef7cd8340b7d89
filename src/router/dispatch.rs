//! Order dispatch
//!
//! The last step of the decision path: turn an approved, sized order
//! into exactly one venue call, or a no-op when there is nothing worth
//! placing.

use tracing::info;

use crate::common::errors::Result;
use crate::common::types::{OrderRequest, OrderResult};
use crate::venue::traits::OrderPlacer;

/// Outcome of a dispatch attempt
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Nothing placed; the quantity was not worth an order
    Skipped { reason: &'static str },
    /// The venue accepted the order (or dry-run fabricated a result)
    Placed(OrderResult),
}

/// Sends approved orders to the venue, once each, with no retry
///
/// In dry-run mode the full decision path still runs but the venue is
/// never contacted.
#[derive(Debug, Clone)]
pub struct OrderDispatcher {
    dry_run: bool,
}

impl OrderDispatcher {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    pub async fn dispatch(
        &self,
        placer: &dyn OrderPlacer,
        request: &OrderRequest,
    ) -> Result<Dispatch> {
        if request.quantity <= rust_decimal::Decimal::ZERO {
            return Ok(Dispatch::Skipped {
                reason: "qty_below_minimum",
            });
        }

        if self.dry_run {
            info!(
                symbol = %request.symbol,
                side = %request.side,
                quantity = %request.quantity,
                reduce_only = request.reduce_only,
                "[DRY] order not sent"
            );
            return Ok(Dispatch::Placed(OrderResult::dry_run(request)));
        }

        let result = placer.place(request).await?;
        info!(
            symbol = %request.symbol,
            side = %request.side,
            quantity = %request.quantity,
            reduce_only = request.reduce_only,
            order_id = result.order_id.as_deref().unwrap_or("-"),
            "order placed"
        );
        Ok(Dispatch::Placed(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::errors::RouterError;
    use crate::common::types::SignalSide;
    use crate::venue::traits::MockOrderPlacer;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn request(qty: Decimal) -> OrderRequest {
        OrderRequest {
            symbol: "BTCUSDT".to_string(),
            side: SignalSide::Buy,
            quantity: qty,
            reduce_only: false,
        }
    }

    #[tokio::test]
    async fn test_zero_quantity_skips_without_venue_call() {
        let mut placer = MockOrderPlacer::new();
        placer.expect_place().times(0);

        let dispatcher = OrderDispatcher::new(false);
        let result = dispatcher.dispatch(&placer, &request(Decimal::ZERO)).await.unwrap();
        assert_eq!(
            result,
            Dispatch::Skipped {
                reason: "qty_below_minimum"
            }
        );
    }

    #[tokio::test]
    async fn test_dry_run_skips_venue_but_reports_order() {
        let mut placer = MockOrderPlacer::new();
        placer.expect_place().times(0);

        let dispatcher = OrderDispatcher::new(true);
        let result = dispatcher.dispatch(&placer, &request(dec!(5))).await.unwrap();
        match result {
            Dispatch::Placed(order) => {
                assert!(order.dry_run);
                assert!(order.order_id.is_none());
                assert_eq!(order.quantity, dec!(5));
            }
            other => panic!("expected placed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_delegates_exactly_once() {
        let mut placer = MockOrderPlacer::new();
        placer
            .expect_place()
            .times(1)
            .returning(|req| {
                let req = req.clone();
                Ok(OrderResult {
                    order_id: Some("ord-1".to_string()),
                    symbol: req.symbol,
                    side: req.side,
                    quantity: req.quantity,
                    reduce_only: req.reduce_only,
                    dry_run: false,
                })
            });

        let dispatcher = OrderDispatcher::new(false);
        let result = dispatcher.dispatch(&placer, &request(dec!(5))).await.unwrap();
        match result {
            Dispatch::Placed(order) => assert_eq!(order.order_id.as_deref(), Some("ord-1")),
            other => panic!("expected placed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_venue_error_propagates_without_retry() {
        let mut placer = MockOrderPlacer::new();
        placer
            .expect_place()
            .times(1)
            .returning(|_| Err(RouterError::Venue("insufficient funds".to_string())));

        let dispatcher = OrderDispatcher::new(false);
        let err = dispatcher.dispatch(&placer, &request(dec!(5))).await.unwrap_err();
        assert_eq!(err.classification(), "venue");
    }
}
