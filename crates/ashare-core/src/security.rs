//! Security identifiers and regulatory daily price limits.
//!
//! A-share securities carry a daily price band derived from the previous
//! close. The band ratio depends on the listing board and on special
//! treatment ("ST") status:
//! - STAR Market (688/689) and ChiNext (300/301): 20%
//! - Main board, ST-flagged name: 5%
//! - Main board otherwise: 10%

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::price::Price;

/// Exchange security code (e.g. "600000", "300750").
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityCode(String);

impl SecurityCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Classify the listing board from the code prefix.
    #[must_use]
    pub fn board(&self) -> Board {
        if self.0.starts_with("688") || self.0.starts_with("689") {
            Board::Star
        } else if self.0.starts_with("300") || self.0.starts_with("301") {
            Board::ChiNext
        } else {
            Board::Main
        }
    }
}

impl fmt::Display for SecurityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecurityCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Listing board of a security.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Board {
    /// Shanghai/Shenzhen main board.
    Main,
    /// Shenzhen ChiNext (300/301 prefixes).
    ChiNext,
    /// Shanghai STAR Market (688/689 prefixes).
    Star,
}

/// Daily price-limit percentage for a security.
///
/// The display name decides ST status on the main board; the growth boards
/// keep their 20% band regardless of ST flags.
#[must_use]
pub fn price_limit_pct(code: &SecurityCode, name: &str) -> Decimal {
    match code.board() {
        Board::Star | Board::ChiNext => dec!(20),
        Board::Main => {
            if name.contains("ST") {
                dec!(5)
            } else {
                dec!(10)
            }
        }
    }
}

/// Regulatory daily up-limit price derived from the previous close.
#[must_use]
pub fn limit_up_price(code: &SecurityCode, name: &str, prev_close: Price, dp: u32) -> Price {
    prev_close.apply_pct(price_limit_pct(code, name), dp)
}

/// Regulatory daily down-limit price derived from the previous close.
#[must_use]
pub fn limit_down_price(code: &SecurityCode, name: &str, prev_close: Price, dp: u32) -> Price {
    prev_close.apply_pct(-price_limit_pct(code, name), dp)
}
