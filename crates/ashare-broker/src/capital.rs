//! Usable-capital query seam.

use mockall::automock;
use rust_decimal::Decimal;

use crate::error::BrokerError;

/// Account capital lookup.
///
/// Queried on demand by the capital tracker; a failed query is treated by
/// the caller as zero usable capital for that cycle.
#[automock]
pub trait CapitalQuery: Send + Sync {
    /// Currently usable capital in account currency.
    fn usable_capital(&self) -> Result<Decimal, BrokerError>;
}
