//! Order ticket types.
//!
//! A ticket describes one order request handed to the order router. The
//! router reports fills asynchronously, zero or more times per ticket,
//! so every ticket carries a stable unique identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::price::Price;
use crate::security::SecurityCode;

/// Unique order identity, assigned at ticket construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(Uuid);

impl OrderId {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of order request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    /// Same-day purchase of a candidate.
    Buy,
    /// Protective exit at the stoploss price.
    Stoploss,
    /// Opportunistic sell.
    Sell,
}

impl fmt::Display for OrderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => write!(f, "BUY"),
            Self::Stoploss => write!(f, "STOPLOSS"),
            Self::Sell => write!(f, "SELL"),
        }
    }
}

/// An order request handed to the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTicket {
    /// Stable order identity.
    pub id: OrderId,
    /// Order kind.
    pub kind: OrderKind,
    /// Security code.
    pub code: SecurityCode,
    /// Security display name.
    pub name: String,
    /// Target price (for buys: the upper bound actually targeted).
    pub price: Price,
    /// Lower acceptable price for buys; `None` for other kinds.
    pub floor_price: Option<Price>,
    /// Requested volume in shares.
    pub volume: u64,
}

impl OrderTicket {
    /// A buy ticket bounded to `[floor, target]`, targeting `target`.
    pub fn buy(
        code: SecurityCode,
        name: impl Into<String>,
        floor: Price,
        target: Price,
        volume: u64,
    ) -> Self {
        Self {
            id: OrderId::new(),
            kind: OrderKind::Buy,
            code,
            name: name.into(),
            price: target,
            floor_price: Some(floor),
            volume,
        }
    }

    /// A protective stoploss ticket.
    pub fn stoploss(
        code: SecurityCode,
        name: impl Into<String>,
        price: Price,
        volume: u64,
    ) -> Self {
        Self {
            id: OrderId::new(),
            kind: OrderKind::Stoploss,
            code,
            name: name.into(),
            price,
            floor_price: None,
            volume,
        }
    }

    /// An opportunistic sell ticket.
    pub fn sell(code: SecurityCode, name: impl Into<String>, price: Price, volume: u64) -> Self {
        Self {
            id: OrderId::new(),
            kind: OrderKind::Sell,
            code,
            name: name.into(),
            price,
            floor_price: None,
            volume,
        }
    }
}

impl fmt::Display for OrderTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{} price {} volume {} (id {})",
            self.kind, self.code, self.name, self.price, self.volume, self.id
        )
    }
}
