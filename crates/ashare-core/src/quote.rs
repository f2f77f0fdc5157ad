//! Market quote delivery types.
//!
//! Quotes arrive in batches of per-code results; each entry is either a
//! valid snapshot or an error marker that must be filtered out before use.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::price::Price;
use crate::security::SecurityCode;

/// A single per-code market quote snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Security code.
    pub code: SecurityCode,
    /// Security display name.
    pub name: String,
    /// Quote timestamp (exchange local time).
    pub timestamp: NaiveDateTime,
    /// Yesterday's closing price.
    pub prev_close: Price,
    /// Today's opening price.
    pub today_open: Price,
    /// Current (last traded) price.
    pub last: Price,
}

/// One entry of a quote delivery batch: a quote or an error marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    /// Security code the result refers to.
    pub code: SecurityCode,
    /// Valid snapshot, or `None` when the feed reported an error.
    pub quote: Option<QuoteSnapshot>,
    /// Error description from the feed, if any.
    pub error: Option<String>,
}

impl QuoteResult {
    /// A successful quote result.
    pub fn ok(quote: QuoteSnapshot) -> Self {
        Self {
            code: quote.code.clone(),
            quote: Some(quote),
            error: None,
        }
    }

    /// An erroneous quote result carrying no snapshot.
    pub fn err(code: SecurityCode, error: impl Into<String>) -> Self {
        Self {
            code,
            quote: None,
            error: Some(error.into()),
        }
    }

    /// Whether this entry carries a usable quote.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.quote.is_some() && self.error.is_none()
    }

    /// The snapshot, if valid.
    #[must_use]
    pub fn valid_quote(&self) -> Option<&QuoteSnapshot> {
        if self.is_valid() {
            self.quote.as_ref()
        } else {
            None
        }
    }
}
