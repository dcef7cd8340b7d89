//! Position-intent classification
//!
//! Decides what an incoming signal means against the current net
//! position: open a fresh position, add to the held one, or close it.
//! Closes are always reduce-only and capped at the held quantity.

use rust_decimal::Decimal;

use crate::common::types::{IntentHint, Position, PositionSide, Signal, SignalSide};

/// What an order is meant to do to exposure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Open,
    Add,
    Close,
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Intent::Open => write!(f, "open"),
            Intent::Add => write!(f, "add"),
            Intent::Close => write!(f, "close"),
        }
    }
}

/// One order the router intends to place for a signal
///
/// Entry plans (`Open`/`Add`) carry no quantity; the size calculator
/// decides it. Close plans carry the hard cap the dispatched quantity
/// may not exceed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderPlan {
    pub intent: Intent,
    /// Exposure direction after the order; for closes, the held
    /// direction being reduced
    pub direction: PositionSide,
    pub reduce_only: bool,
    /// For closes: held quantity, further capped by the signal's
    /// requested size when present
    pub close_cap: Option<Decimal>,
}

impl OrderPlan {
    fn open(direction: PositionSide) -> Self {
        Self {
            intent: Intent::Open,
            direction,
            reduce_only: false,
            close_cap: None,
        }
    }

    fn add(direction: PositionSide) -> Self {
        Self {
            intent: Intent::Add,
            direction,
            reduce_only: false,
            close_cap: None,
        }
    }

    fn close(held: PositionSide, cap: Decimal) -> Self {
        Self {
            intent: Intent::Close,
            direction: held,
            reduce_only: true,
            close_cap: Some(cap),
        }
    }
}

/// Classifier output: either nothing to do, or one-or-two orders to run
/// through the guard, sizer and dispatcher in sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    Skip(&'static str),
    Plans(Vec<OrderPlan>),
}

/// Classifies signals against the current position
///
/// `reenter_on_opposite` picks the policy for an opposite-direction
/// signal that requests more than is held: cap the close at the held
/// quantity and discard the remainder (false), or close the held
/// quantity reduce-only and open the remainder in the new direction
/// (true).
#[derive(Debug, Clone)]
pub struct IntentClassifier {
    reenter_on_opposite: bool,
}

impl IntentClassifier {
    pub fn new(reenter_on_opposite: bool) -> Self {
        Self { reenter_on_opposite }
    }

    /// Map (held side, signal side) to order plans
    ///
    /// | held  | signal | result                         |
    /// |-------|--------|--------------------------------|
    /// | flat  | buy    | open long                      |
    /// | flat  | sell   | open short                     |
    /// | long  | buy    | add long                       |
    /// | long  | sell   | close (reduce-only, capped)    |
    /// | short | sell   | add short                      |
    /// | short | buy    | close (reduce-only, capped)    |
    ///
    /// A `close` hint never increases exposure: it closes when the
    /// signal side reduces the held position and skips otherwise.
    pub fn classify(&self, position: &Position, signal: &Signal) -> Classification {
        let held = if position.is_flat() {
            PositionSide::Flat
        } else {
            position.side
        };

        if signal.hint == IntentHint::Close {
            return match held.closing_side() {
                Some(side) if side == signal.side => {
                    Classification::Plans(vec![self.close_plan(position, signal)])
                }
                _ => Classification::Skip("no_position_to_close"),
            };
        }

        match (held, signal.side) {
            (PositionSide::Flat, side) => {
                Classification::Plans(vec![OrderPlan::open(side.opens())])
            }
            (PositionSide::Long, SignalSide::Buy) => {
                Classification::Plans(vec![OrderPlan::add(PositionSide::Long)])
            }
            (PositionSide::Short, SignalSide::Sell) => {
                Classification::Plans(vec![OrderPlan::add(PositionSide::Short)])
            }
            (PositionSide::Long, SignalSide::Sell) | (PositionSide::Short, SignalSide::Buy) => {
                let mut plans = vec![self.close_plan(position, signal)];
                if self.reenter_on_opposite && self.requests_flip(position, signal) {
                    plans.push(OrderPlan::open(signal.side.opens()));
                }
                Classification::Plans(plans)
            }
        }
    }

    /// Close the held quantity, capped by the requested size when one
    /// was supplied. Never exceeds the held quantity.
    fn close_plan(&self, position: &Position, signal: &Signal) -> OrderPlan {
        let cap = match signal.requested_size {
            Some(requested) => requested.min(position.quantity),
            None => position.quantity,
        };
        OrderPlan::close(position.side, cap)
    }

    /// The flip leg only triggers when the source explicitly asked for
    /// more than is held
    fn requests_flip(&self, position: &Position, signal: &Signal) -> bool {
        matches!(signal.requested_size, Some(requested) if requested > position.quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn long(qty: Decimal) -> Position {
        Position::new("BTCUSDT", PositionSide::Long, qty)
    }

    fn short(qty: Decimal) -> Position {
        Position::new("BTCUSDT", PositionSide::Short, qty)
    }

    fn flat() -> Position {
        Position::flat("BTCUSDT")
    }

    fn buy() -> Signal {
        Signal::new("BTCUSDT", SignalSide::Buy)
    }

    fn sell() -> Signal {
        Signal::new("BTCUSDT", SignalSide::Sell)
    }

    fn single(c: Classification) -> OrderPlan {
        match c {
            Classification::Plans(plans) if plans.len() == 1 => plans.into_iter().next().unwrap(),
            other => panic!("expected one plan, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_buy_opens_long() {
        let plan = single(IntentClassifier::new(false).classify(&flat(), &buy()));
        assert_eq!(plan.intent, Intent::Open);
        assert_eq!(plan.direction, PositionSide::Long);
        assert!(!plan.reduce_only);
    }

    #[test]
    fn test_flat_sell_opens_short() {
        let plan = single(IntentClassifier::new(false).classify(&flat(), &sell()));
        assert_eq!(plan.intent, Intent::Open);
        assert_eq!(plan.direction, PositionSide::Short);
        assert!(!plan.reduce_only);
    }

    #[test]
    fn test_same_direction_adds() {
        let plan = single(IntentClassifier::new(false).classify(&long(dec!(2)), &buy()));
        assert_eq!(plan.intent, Intent::Add);
        assert!(!plan.reduce_only);

        let plan = single(IntentClassifier::new(false).classify(&short(dec!(2)), &sell()));
        assert_eq!(plan.intent, Intent::Add);
        assert_eq!(plan.direction, PositionSide::Short);
    }

    #[test]
    fn test_opposite_direction_closes_reduce_only() {
        let plan = single(IntentClassifier::new(false).classify(&long(dec!(10)), &sell()));
        assert_eq!(plan.intent, Intent::Close);
        assert!(plan.reduce_only);
        assert_eq!(plan.close_cap, Some(dec!(10)));

        let plan = single(IntentClassifier::new(false).classify(&short(dec!(3)), &buy()));
        assert_eq!(plan.intent, Intent::Close);
        assert!(plan.reduce_only);
        assert_eq!(plan.close_cap, Some(dec!(3)));
    }

    #[test]
    fn test_reduce_only_iff_close() {
        // every plan variant: reduce_only exactly when intent is Close
        let classifier = IntentClassifier::new(true);
        for (pos, sig) in [
            (flat(), buy()),
            (flat(), sell()),
            (long(dec!(1)), buy()),
            (long(dec!(1)), sell()),
            (short(dec!(1)), buy()),
            (short(dec!(1)), sell()),
        ] {
            if let Classification::Plans(plans) = classifier.classify(&pos, &sig) {
                for plan in plans {
                    assert_eq!(plan.reduce_only, plan.intent == Intent::Close);
                }
            }
        }
    }

    #[test]
    fn test_oversized_close_caps_at_held() {
        let plan = single(
            IntentClassifier::new(false).classify(&long(dec!(10)), &sell().with_size(dec!(999))),
        );
        assert_eq!(plan.close_cap, Some(dec!(10)));
    }

    #[test]
    fn test_requested_size_below_held_caps_close() {
        let plan = single(
            IntentClassifier::new(false).classify(&long(dec!(10)), &sell().with_size(dec!(4))),
        );
        assert_eq!(plan.close_cap, Some(dec!(4)));
    }

    #[test]
    fn test_oversized_opposite_flips_when_enabled() {
        let c = IntentClassifier::new(true).classify(&long(dec!(10)), &sell().with_size(dec!(15)));
        let plans = match c {
            Classification::Plans(p) => p,
            other => panic!("expected plans, got {:?}", other),
        };
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].intent, Intent::Close);
        assert!(plans[0].reduce_only);
        assert_eq!(plans[0].close_cap, Some(dec!(10)));
        assert_eq!(plans[1].intent, Intent::Open);
        assert_eq!(plans[1].direction, PositionSide::Short);
        assert!(!plans[1].reduce_only);
    }

    #[test]
    fn test_no_flip_without_oversized_request() {
        // no requested size, or requested <= held: plain close even with
        // the flip policy enabled
        let c = IntentClassifier::new(true).classify(&long(dec!(10)), &sell());
        assert_eq!(single(c).intent, Intent::Close);

        let c = IntentClassifier::new(true).classify(&long(dec!(10)), &sell().with_size(dec!(10)));
        assert_eq!(single(c).intent, Intent::Close);
    }

    #[test]
    fn test_close_hint_skips_when_flat() {
        let c = IntentClassifier::new(false)
            .classify(&flat(), &buy().with_hint(IntentHint::Close));
        assert_eq!(c, Classification::Skip("no_position_to_close"));
    }

    #[test]
    fn test_close_hint_never_adds() {
        // long position, buy with a close hint: the add is suppressed
        let c = IntentClassifier::new(false)
            .classify(&long(dec!(5)), &buy().with_hint(IntentHint::Close));
        assert_eq!(c, Classification::Skip("no_position_to_close"));

        // matching close side still closes
        let plan = single(
            IntentClassifier::new(false)
                .classify(&long(dec!(5)), &sell().with_hint(IntentHint::Close)),
        );
        assert_eq!(plan.intent, Intent::Close);
    }

    #[test]
    fn test_zero_quantity_position_treated_as_flat() {
        let stale = Position::new("BTCUSDT", PositionSide::Long, Decimal::ZERO);
        let plan = single(IntentClassifier::new(false).classify(&stale, &sell()));
        assert_eq!(plan.intent, Intent::Open);
        assert_eq!(plan.direction, PositionSide::Short);
    }
}
