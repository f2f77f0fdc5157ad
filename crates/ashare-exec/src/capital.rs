//! Usable-capital tracker.
//!
//! A lock-guarded scalar refreshed on demand from the broker's capital
//! query. A failed query stores zero rather than keeping a stale value:
//! under-estimating buying power is safe, over-estimating is not.

use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;
use tracing::{debug, error};

use ashare_broker::CapitalQuery;

/// Last-known usable capital, refreshed on demand.
pub struct CapitalTracker {
    query: Arc<dyn CapitalQuery>,
    current: Mutex<Decimal>,
}

impl CapitalTracker {
    pub fn new(query: Arc<dyn CapitalQuery>) -> Self {
        Self {
            query,
            current: Mutex::new(Decimal::ZERO),
        }
    }

    /// Query the broker and store the result.
    ///
    /// The lock is held across the query so concurrent refreshes are
    /// serialized and the stored value always reflects a whole response.
    pub fn refresh(&self) {
        let mut current = self.current.lock();

        match self.query.usable_capital() {
            Ok(capital) => {
                debug!(%capital, "usable capital refreshed");
                *current = capital;
            }
            Err(e) => {
                error!(error = %e, "capital query failed, treating usable capital as zero");
                *current = Decimal::ZERO;
            }
        }
    }

    /// Last stored value. Callers needing freshness call `refresh()` first.
    #[must_use]
    pub fn current(&self) -> Decimal {
        *self.current.lock()
    }
}
