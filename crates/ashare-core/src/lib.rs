//! Core domain types for the A-share execution bot.
//!
//! This crate provides fundamental types used throughout the system:
//! - `Price`: precision-safe decimal price
//! - `SecurityCode`: exchange security identifier with board classification
//! - `QuoteSnapshot` / `QuoteResult`: per-code market quote delivery
//! - `OrderTicket`: buy / stoploss / sell order requests
//! - `TradingWindow`: inclusive wall-clock interval gate

pub mod error;
pub mod order;
pub mod price;
pub mod quote;
pub mod security;
pub mod window;

pub use error::{CoreError, Result};
pub use order::{OrderId, OrderKind, OrderTicket};
pub use price::Price;
pub use quote::{QuoteResult, QuoteSnapshot};
pub use security::{limit_down_price, limit_up_price, price_limit_pct, Board, SecurityCode};
pub use window::TradingWindow;

/// Decimal places used for A-share price rounding.
pub const PRICE_DECIMALS: u32 = 2;
