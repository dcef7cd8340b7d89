//! Fixed-fraction (equal-notional) position sizing
//!
//! Keeps the quote-currency margin committed per position roughly
//! constant regardless of the traded symbol's price: quantity is derived
//! from equity, leverage and price, never from the signal's own size.

use rust_decimal::Decimal;

/// Immutable sizing policy, built from configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SizingPolicy {
    /// Fraction of equity committed as margin per position
    pub fraction_per_position: Decimal,
    /// Fixed quote-currency margin; overrides the fraction when set
    pub fixed_margin_quote: Option<Decimal>,
    pub leverage: Decimal,
    /// Instrument lot size; quantities are floored to a multiple of this
    pub step_size: Decimal,
    pub min_quantity: Decimal,
    pub min_notional: Decimal,
    /// Fixed equity figure; replaces the equity oracle reading when set
    pub reference_balance_quote: Option<Decimal>,
}

impl SizingPolicy {
    /// Margin budget for one position given current equity
    pub fn target_margin(&self, equity: Decimal) -> Decimal {
        self.fixed_margin_quote
            .unwrap_or(equity * self.fraction_per_position)
    }
}

/// Converts the sizing policy into executable entry quantities
#[derive(Debug, Clone)]
pub struct SizeCalculator {
    policy: SizingPolicy,
}

impl SizeCalculator {
    pub fn new(policy: SizingPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SizingPolicy {
        &self.policy
    }

    /// Equity figure to size against: the configured reference balance
    /// when present, otherwise the oracle reading
    pub fn sizing_equity(&self, oracle_equity: Decimal) -> Decimal {
        match self.policy.reference_balance_quote {
            Some(reference) if reference > Decimal::ZERO => reference,
            _ => oracle_equity,
        }
    }

    /// Entry quantity for an open/add at the given equity and price
    ///
    /// target_margin * leverage / price, floored to the lot step.
    /// Returns zero ("skip, do not place an order") when the inputs are
    /// unusable or the result falls below the instrument minimums.
    /// Never rounds up: rounding up would exceed the margin budget.
    pub fn compute_entry_qty(&self, equity: Decimal, price: Decimal) -> Decimal {
        if price <= Decimal::ZERO || self.policy.leverage <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let target_margin = self.policy.target_margin(equity);
        if target_margin <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let notional = target_margin * self.policy.leverage;
        let raw_qty = notional / price;
        let qty = self.round_down_to_step(raw_qty);

        if qty <= Decimal::ZERO || qty < self.policy.min_quantity {
            return Decimal::ZERO;
        }
        if qty * price < self.policy.min_notional {
            return Decimal::ZERO;
        }
        qty
    }

    /// Floor a quantity to a multiple of the lot step
    pub fn round_down_to_step(&self, qty: Decimal) -> Decimal {
        let step = self.policy.step_size;
        if step <= Decimal::ZERO {
            return qty;
        }
        (qty / step).floor() * step
    }
}
