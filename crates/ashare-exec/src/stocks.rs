//! Candidate and holding records.
//!
//! Candidates are new stocks eligible for a same-day buy; holdings are
//! existing positions under protective management. Both are loaded once at
//! startup; the executor's active indexes own them for the rest of the run.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use ashare_core::{limit_down_price, Price, QuoteSnapshot, SecurityCode};

/// Open-price discovery result, recorded at most once per candidate per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenDiscovery {
    /// Today's opening price as observed in the accepting quote.
    pub open: Price,
    /// Lowest acceptable open, from the configured down percentage.
    pub low: Price,
    /// Highest acceptable open, from the configured up percentage.
    pub high: Price,
    /// Maximum buy price: open inflated by the configured increase.
    pub max_buy: Price,
    /// Minimum buy price: max(stoploss, regulatory down limit).
    pub min_buy: Price,
}

/// Outcome of an open-price discovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Discovery already ran; the recorded fields are untouched.
    AlreadyRecorded,
    /// Open price accepted and derived fields recorded.
    Recorded,
    /// Open price out of range (or below stoploss); candidate is done.
    Rejected {
        low: Price,
        high: Price,
    },
}

/// A new stock eligible for purchase on its target date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    /// Security code.
    pub code: SecurityCode,
    /// Security display name.
    pub name: String,
    /// The one calendar day this candidate may be bought.
    pub buy_date: NaiveDate,
    /// Capital allotted to this candidate, in account currency.
    pub capital: Decimal,
    /// Protective stop price; an open below it disqualifies the buy.
    pub stoploss_price: Price,
    /// Upper bound on today's open, percent above yesterday's close.
    pub open_up_pct: Decimal,
    /// Lower bound on today's open, percent below yesterday's close
    /// (negative, e.g. -5.0).
    pub open_down_pct: Decimal,
    /// How far above the open a buy may still be priced, in percent.
    pub max_buy_increase_pct: Decimal,

    #[serde(skip)]
    open: Option<OpenDiscovery>,
    #[serde(skip)]
    buyable: bool,
}

impl Candidate {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        code: SecurityCode,
        name: impl Into<String>,
        buy_date: NaiveDate,
        capital: Decimal,
        stoploss_price: Price,
        open_up_pct: Decimal,
        open_down_pct: Decimal,
        max_buy_increase_pct: Decimal,
    ) -> Self {
        Self {
            code,
            name: name.into(),
            buy_date,
            capital,
            stoploss_price,
            open_up_pct,
            open_down_pct,
            max_buy_increase_pct,
            open: None,
            buyable: false,
        }
    }

    /// Recorded open discovery, if it has run and accepted.
    #[must_use]
    pub fn open(&self) -> Option<&OpenDiscovery> {
        self.open.as_ref()
    }

    /// Validate and record today's open price from `quote`.
    ///
    /// Idempotent: once the derived fields are set they are never
    /// overwritten, however many quotes arrive afterwards.
    pub fn try_discover_open(&mut self, quote: &QuoteSnapshot, dp: u32) -> OpenOutcome {
        if self.open.is_some() {
            return OpenOutcome::AlreadyRecorded;
        }

        let low = quote.prev_close.apply_pct(self.open_down_pct, dp);
        let high = quote.prev_close.apply_pct(self.open_up_pct, dp);
        let open = quote.today_open;

        if open < low || open > high || open < self.stoploss_price {
            return OpenOutcome::Rejected { low, high };
        }

        let max_buy = open.apply_pct(self.max_buy_increase_pct, dp);
        let down_limit = limit_down_price(&self.code, &self.name, quote.prev_close, dp);
        let min_buy = self.stoploss_price.max(down_limit);

        self.open = Some(OpenDiscovery {
            open,
            low,
            high,
            max_buy,
            min_buy,
        });

        OpenOutcome::Recorded
    }

    /// Latch buyability. One-shot: never unset for the rest of the run.
    pub fn mark_buyable(&mut self) {
        self.buyable = true;
    }

    #[must_use]
    pub fn is_buyable(&self) -> bool {
        self.buyable
    }
}

/// An existing position requiring protective/exit management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Holding {
    /// Security code.
    pub code: SecurityCode,
    /// Security display name.
    pub name: String,
    /// Held volume in shares.
    pub volume: u64,
    /// Protective stop price.
    pub stoploss_price: Price,
    /// Calendar days the position has been held.
    pub hold_days: u32,
}
