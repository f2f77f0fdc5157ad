//! Broker collaborator seams for the A-share execution bot.
//!
//! The executor never talks to a transport directly; it works against the
//! traits in this crate:
//! - `QuoteFeed` / `QuoteSink`: quote subscription and delivery
//! - `CapitalQuery`: usable-capital lookups
//! - `OrderRouter` / `FillSink`: order registration and asynchronous fills
//!
//! `SimBroker` is the in-process implementation used by the paper-trading
//! binary and by tests.

pub mod capital;
pub mod error;
pub mod order_router;
pub mod quote_feed;
pub mod sim;

pub use capital::{CapitalQuery, MockCapitalQuery};
pub use error::BrokerError;
pub use order_router::{FillSink, MockOrderRouter, OrderRouter};
pub use quote_feed::{MockQuoteFeed, QuoteChannel, QuoteFeed, QuoteSink};
pub use sim::SimBroker;
