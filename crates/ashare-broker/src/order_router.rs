//! Order routing and fill delivery seams.
//!
//! The router owns its callback threads: `FillSink::on_fill` is invoked
//! zero or more times per registered ticket, once per partial or full
//! fill, on threads the executor does not control. The router may hold
//! internal locks while calling back, which is why the executor never
//! mutates its registry inline from a fill callback.

use mockall::automock;

use ashare_core::{OrderTicket, Price};

/// Order routing engine.
#[automock]
pub trait OrderRouter: Send + Sync {
    /// Hand an order to the routing engine.
    fn register_order(&self, ticket: OrderTicket);

    /// Withdraw a previously registered order. Idempotent.
    fn unregister_order(&self, ticket: &OrderTicket);
}

/// Receiver of fill events, implemented by the executor.
pub trait FillSink: Send + Sync {
    /// One partial or full fill of `ticket`.
    fn on_fill(&self, ticket: &OrderTicket, price: Price, volume: u64);
}
