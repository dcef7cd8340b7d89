//! Portfolio-level guards for fresh position entries
//!
//! Enforces the distinct-symbol cap, the short-selling toggle, signal
//! deduplication, and a short memory of opens that were dropped at the
//! cap. The state here is a cache, never a source of truth: losing it on
//! restart safely reverts to "allow", and position counts always come
//! from the venue.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::debug;

use crate::common::types::{IntentHint, Signal, SignalSide};
use crate::config::types::GuardConfig;

/// Why a fresh open was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    ShortsDisabled,
    MaxCoins,
    RecentlyBlocked,
    Duplicate,
    IntentRequired,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::ShortsDisabled => "shorts_disabled",
            RejectReason::MaxCoins => "max_coins",
            RejectReason::RecentlyBlocked => "recently_blocked",
            RejectReason::Duplicate => "duplicate",
            RejectReason::IntentRequired => "intent_required",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Guard decision for a fresh open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardVerdict {
    Allow,
    Reject(RejectReason),
}

/// Dedupe key: identical (symbol, side, rounded size) within the window
/// count as one signal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DedupeKey {
    symbol: String,
    side: SignalSide,
    size: Decimal,
}

#[derive(Debug, Clone)]
struct BlockedOpen {
    side: SignalSide,
    expires_at: DateTime<Utc>,
}

/// Mutable guard state, owned by the router and passed time explicitly
/// so TTL behavior is testable. Mutated only inside the per-symbol
/// critical section.
#[derive(Debug)]
pub struct GuardState {
    max_coins: usize,
    allow_shorts: bool,
    require_intent_for_open: bool,
    dedupe_window: Duration,
    blocked_open_ttl: Duration,
    recent_signals: HashMap<DedupeKey, DateTime<Utc>>,
    blocked_symbols: HashMap<String, BlockedOpen>,
}

impl GuardState {
    pub fn new(config: &GuardConfig) -> Self {
        Self {
            max_coins: config.max_coins,
            allow_shorts: config.allow_shorts,
            require_intent_for_open: config.require_intent_for_open,
            dedupe_window: Duration::seconds(config.dedupe_window_seconds as i64),
            blocked_open_ttl: Duration::seconds(config.blocked_open_ttl_seconds as i64),
            recent_signals: HashMap::new(),
            blocked_symbols: HashMap::new(),
        }
    }

    /// Whether a fresh OPEN on `symbol` may proceed
    ///
    /// Rules run in order: shorts toggle, intent requirement, the
    /// distinct-symbol cap (recording the blocked symbol on rejection),
    /// then the recently-blocked memory. Only fresh opens on a new
    /// symbol are constrained; adds and closes never reach this check.
    pub fn can_open(
        &mut self,
        symbol: &str,
        side: SignalSide,
        hint: IntentHint,
        already_held: bool,
        open_symbols: usize,
        now: DateTime<Utc>,
    ) -> GuardVerdict {
        if side == SignalSide::Sell && !self.allow_shorts {
            return GuardVerdict::Reject(RejectReason::ShortsDisabled);
        }

        if self.require_intent_for_open && hint != IntentHint::Open {
            return GuardVerdict::Reject(RejectReason::IntentRequired);
        }

        if !already_held && open_symbols >= self.max_coins {
            // Remember the dropped open: once a slot frees up, a repeat
            // of this signal must not be misread as a brand-new entry.
            self.blocked_symbols.insert(
                symbol.to_string(),
                BlockedOpen {
                    side,
                    expires_at: now + self.blocked_open_ttl,
                },
            );
            debug!(symbol, open_symbols, max_coins = self.max_coins, "open blocked at cap");
            return GuardVerdict::Reject(RejectReason::MaxCoins);
        }

        if let Some(blocked) = self.blocked_symbols.get(symbol) {
            if blocked.expires_at > now {
                return GuardVerdict::Reject(RejectReason::RecentlyBlocked);
            }
            self.blocked_symbols.remove(symbol);
        }

        GuardVerdict::Allow
    }

    /// Whether this signal repeats one already recorded inside the
    /// dedupe window
    ///
    /// Applies to every intent, not just opens; checked after the open
    /// rules so a guard-rejected repeat keeps reporting the guard
    /// reason. Eviction happens here, on read.
    pub fn is_duplicate(&mut self, signal: &Signal, step_size: Decimal, now: DateTime<Utc>) -> bool {
        self.evict_expired(now);

        if self.dedupe_window <= Duration::zero() {
            return false;
        }

        let key = dedupe_key(signal, step_size);
        matches!(
            self.recent_signals.get(&key),
            Some(seen) if now - *seen < self.dedupe_window
        )
    }

    /// Arm the dedupe window for a signal whose order reached the venue
    ///
    /// Signals that were guard-rejected, sized to zero, or failed in
    /// transit are never recorded, so the caller is free to retry them.
    pub fn record_signal(&mut self, signal: &Signal, step_size: Decimal, now: DateTime<Utc>) {
        if self.dedupe_window <= Duration::zero() {
            return;
        }
        self.recent_signals.insert(dedupe_key(signal, step_size), now);
    }

    /// Drop expired dedupe entries and blocked-open records
    fn evict_expired(&mut self, now: DateTime<Utc>) {
        let window = self.dedupe_window;
        self.recent_signals.retain(|_, seen| now - *seen < window);
        self.blocked_symbols.retain(|_, b| b.expires_at > now);
    }

    /// Blocked side for a symbol still inside its TTL, for logging
    pub fn blocked_side(&self, symbol: &str, now: DateTime<Utc>) -> Option<SignalSide> {
        self.blocked_symbols
            .get(symbol)
            .filter(|b| b.expires_at > now)
            .map(|b| b.side)
    }
}

fn dedupe_key(signal: &Signal, step_size: Decimal) -> DedupeKey {
    DedupeKey {
        symbol: signal.symbol.clone(),
        side: signal.side,
        size: rounded_size(signal.requested_size, step_size),
    }
}

fn rounded_size(size: Option<Decimal>, step_size: Decimal) -> Decimal {
    let size = size.unwrap_or(Decimal::ZERO);
    if step_size <= Decimal::ZERO {
        return size;
    }
    (size / step_size).floor() * step_size
}
