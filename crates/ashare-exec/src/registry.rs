//! Order runtime registry.
//!
//! One runtime per security tracks expected/remaining volume and the
//! currently associated order of each kind (at most one live order per
//! kind per stock). Runtimes are created lazily on the first order request
//! and never deleted for the lifetime of the run; a stale entry is
//! harmless once its stock leaves the active indexes.
//!
//! The book itself carries no lock: the executor guards it, together with
//! the active indexes, behind its single reader-writer lock.

use std::collections::HashMap;

use ashare_core::{OrderTicket, SecurityCode};

use crate::error::ExecError;

/// Per-security order bookkeeping.
#[derive(Debug, Clone)]
pub struct OrderRuntime {
    /// Security code (also the book key).
    pub code: SecurityCode,
    /// Security display name.
    pub name: String,
    /// Volume expected at order creation.
    pub expected: u64,
    /// Volume not yet filled. Non-increasing, floor 0.
    pub remaining: u64,
    /// Live buy order, if any.
    pub buy_order: Option<OrderTicket>,
    /// Live protective stoploss order, if any.
    pub stoploss_order: Option<OrderTicket>,
    /// Live sell order, if any.
    pub sell_order: Option<OrderTicket>,
}

impl OrderRuntime {
    pub fn new(code: SecurityCode, name: impl Into<String>, volume: u64) -> Self {
        Self {
            code,
            name: name.into(),
            expected: volume,
            remaining: volume,
            buy_order: None,
            stoploss_order: None,
            sell_order: None,
        }
    }

    /// Whether a buy order is currently associated.
    #[must_use]
    pub fn has_live_buy(&self) -> bool {
        self.buy_order.is_some()
    }

    /// Whether any exit-side order (sell or stoploss) is live.
    #[must_use]
    pub fn has_exit_order(&self) -> bool {
        self.sell_order.is_some() || self.stoploss_order.is_some()
    }

    /// Apply a stoploss fill, checking order identity and the volume floor.
    ///
    /// One protective order may fill partially and repeatedly; it stays
    /// associated across partial fills (so the sweep never pairs a second
    /// order with it) and is retired only once the position is flat.
    /// Returns the new remaining volume. Both failure variants are
    /// invariant violations, not recoverable conditions, and leave the
    /// runtime untouched.
    pub fn apply_stoploss_fill(
        &mut self,
        ticket: &OrderTicket,
        volume: u64,
    ) -> Result<u64, ExecError> {
        let live = self
            .stoploss_order
            .as_ref()
            .ok_or_else(|| ExecError::OrderMismatch {
                code: self.code.clone(),
                order_id: ticket.id,
            })?;

        if live.id != ticket.id {
            return Err(ExecError::OrderMismatch {
                code: self.code.clone(),
                order_id: ticket.id,
            });
        }

        self.remaining = self
            .remaining
            .checked_sub(volume)
            .ok_or(ExecError::VolumeUnderflow {
                code: self.code.clone(),
                remaining: self.remaining,
                fill: volume,
            })?;
        if self.remaining == 0 {
            self.stoploss_order = None;
        }

        Ok(self.remaining)
    }
}

/// All runtimes of the run, keyed by security code.
#[derive(Debug, Default)]
pub struct RuntimeBook {
    runtimes: HashMap<SecurityCode, OrderRuntime>,
}

impl RuntimeBook {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, code: &SecurityCode) -> Option<&OrderRuntime> {
        self.runtimes.get(code)
    }

    /// Whether the stock has a live buy order.
    #[must_use]
    pub fn has_live_buy(&self, code: &SecurityCode) -> bool {
        self.runtimes.get(code).is_some_and(OrderRuntime::has_live_buy)
    }

    /// Get or lazily create the runtime for `code`.
    ///
    /// A fresh runtime starts with `expected = remaining = volume`; an
    /// existing one is returned untouched.
    pub fn ensure(
        &mut self,
        code: &SecurityCode,
        name: &str,
        volume: u64,
    ) -> &mut OrderRuntime {
        self.runtimes
            .entry(code.clone())
            .or_insert_with(|| OrderRuntime::new(code.clone(), name, volume))
    }

    /// Apply a stoploss fill to the matching runtime.
    pub fn apply_stoploss_fill(
        &mut self,
        ticket: &OrderTicket,
        volume: u64,
    ) -> Result<u64, ExecError> {
        let runtime = self
            .runtimes
            .get_mut(&ticket.code)
            .ok_or_else(|| ExecError::UnknownRuntime(ticket.code.clone()))?;
        runtime.apply_stoploss_fill(ticket, volume)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut OrderRuntime> {
        self.runtimes.values_mut()
    }

    /// Cloned snapshot of every runtime, for bulk introspection.
    #[must_use]
    pub fn snapshot(&self) -> Vec<OrderRuntime> {
        self.runtimes.values().cloned().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.runtimes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.runtimes.is_empty()
    }
}
