//! Error types for broker collaborators.

use thiserror::Error;

/// Broker-side failures surfaced to the executor.
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("Capital query failed: {0}")]
    CapitalQuery(String),

    #[error("Quote feed error: {0}")]
    QuoteFeed(String),

    #[error("Order routing error: {0}")]
    Routing(String),
}
