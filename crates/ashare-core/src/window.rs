//! Wall-clock trading window gate.
//!
//! A window is an inclusive-inclusive interval of times of day. It has no
//! state and no side effects; callers decide which timestamp to test
//! (quote timestamp for event gating, the current clock for loop gating).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive wall-clock interval, e.g. 09:30:00..=14:56:00.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingWindow {
    /// Window opening time (inclusive).
    pub start: NaiveTime,
    /// Window closing time (inclusive).
    pub end: NaiveTime,
}

impl TradingWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build from "HH:MM" / "HH:MM:SS" strings. Panics on malformed input,
    /// so it is only used for compiled-in defaults.
    #[must_use]
    pub fn from_hms(start: &str, end: &str) -> Self {
        Self {
            start: parse_time(start),
            end: parse_time(end),
        }
    }

    /// Whether `t` falls inside the window (both ends inclusive).
    #[must_use]
    pub fn contains(&self, t: NaiveTime) -> bool {
        t >= self.start && t <= self.end
    }

    /// Whether `t` is already past the window's close.
    #[must_use]
    pub fn is_past(&self, t: NaiveTime) -> bool {
        t > self.end
    }
}

impl fmt::Display for TradingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

fn parse_time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .unwrap_or_else(|e| panic!("invalid time-of-day '{s}': {e}"))
}
