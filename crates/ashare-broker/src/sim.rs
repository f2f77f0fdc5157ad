//! In-process simulated broker.
//!
//! Implements all three collaborator seams against in-memory state: quote
//! batches and fills are pushed by the caller (paper-trading binary or
//! tests), registrations and cancellations are recorded for inspection.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rust_decimal::Decimal;
use tracing::debug;

use ashare_core::{OrderId, OrderTicket, Price, QuoteResult, SecurityCode};

use crate::capital::CapitalQuery;
use crate::error::BrokerError;
use crate::order_router::{FillSink, OrderRouter};
use crate::quote_feed::{QuoteChannel, QuoteFeed, QuoteSink};

/// Simulated quote feed, capital account, and order router in one.
#[derive(Default)]
pub struct SimBroker {
    subscriptions: Mutex<HashSet<(SecurityCode, QuoteChannel)>>,
    registered: Mutex<Vec<OrderTicket>>,
    unregistered: Mutex<Vec<OrderTicket>>,
    capital: Mutex<Decimal>,
    capital_unavailable: Mutex<bool>,
    quote_sink: RwLock<Option<Arc<dyn QuoteSink>>>,
    fill_sink: RwLock<Option<Arc<dyn FillSink>>>,
}

impl SimBroker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach the quote receiver (the executor).
    pub fn attach_quote_sink(&self, sink: Arc<dyn QuoteSink>) {
        *self.quote_sink.write() = Some(sink);
    }

    /// Attach the fill receiver (the executor).
    pub fn attach_fill_sink(&self, sink: Arc<dyn FillSink>) {
        *self.fill_sink.write() = Some(sink);
    }

    /// Set the usable capital returned to capital queries.
    pub fn set_capital(&self, capital: Decimal) {
        *self.capital.lock() = capital;
    }

    /// Make subsequent capital queries fail (or recover).
    pub fn set_capital_unavailable(&self, unavailable: bool) {
        *self.capital_unavailable.lock() = unavailable;
    }

    /// Deliver a quote batch on `channel`, restricted to subscribed codes.
    pub fn push_quotes(&self, channel: QuoteChannel, batch: &[QuoteResult]) {
        let sink = self.quote_sink.read().clone();
        let Some(sink) = sink else { return };

        let delivered: Vec<QuoteResult> = {
            let subs = self.subscriptions.lock();
            batch
                .iter()
                .filter(|r| subs.contains(&(r.code.clone(), channel)))
                .cloned()
                .collect()
        };

        if !delivered.is_empty() {
            sink.on_quotes(channel, &delivered);
        }
    }

    /// Report a fill for a registered order.
    pub fn fill(&self, id: OrderId, price: Price, volume: u64) {
        let ticket = {
            let registered = self.registered.lock();
            registered.iter().find(|t| t.id == id).cloned()
        };
        let sink = self.fill_sink.read().clone();

        if let (Some(ticket), Some(sink)) = (ticket, sink) {
            sink.on_fill(&ticket, price, volume);
        }
    }

    /// All orders handed to the router, in registration order.
    #[must_use]
    pub fn registered_orders(&self) -> Vec<OrderTicket> {
        self.registered.lock().clone()
    }

    /// All orders withdrawn from the router, in cancellation order.
    #[must_use]
    pub fn unregistered_orders(&self) -> Vec<OrderTicket> {
        self.unregistered.lock().clone()
    }

    /// Whether `code` is currently subscribed on `channel`.
    #[must_use]
    pub fn is_subscribed(&self, code: &SecurityCode, channel: QuoteChannel) -> bool {
        self.subscriptions.lock().contains(&(code.clone(), channel))
    }
}

impl QuoteFeed for SimBroker {
    fn subscribe(&self, code: SecurityCode, channel: QuoteChannel) {
        debug!(%code, ?channel, "sim: subscribe");
        self.subscriptions.lock().insert((code, channel));
    }

    fn unsubscribe(&self, code: &SecurityCode, channel: QuoteChannel) {
        debug!(%code, ?channel, "sim: unsubscribe");
        self.subscriptions.lock().remove(&(code.clone(), channel));
    }
}

impl CapitalQuery for SimBroker {
    fn usable_capital(&self) -> Result<Decimal, BrokerError> {
        if *self.capital_unavailable.lock() {
            return Err(BrokerError::CapitalQuery("account unavailable".into()));
        }
        Ok(*self.capital.lock())
    }
}

impl OrderRouter for SimBroker {
    fn register_order(&self, ticket: OrderTicket) {
        debug!(order = %ticket, "sim: register order");
        self.registered.lock().push(ticket);
    }

    fn unregister_order(&self, ticket: &OrderTicket) {
        debug!(order = %ticket, "sim: unregister order");
        self.unregistered.lock().push(ticket.clone());
    }
}
