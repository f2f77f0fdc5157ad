//! Application configuration.
//!
//! The day's candidate and holding universe is declared inline in the TOML
//! file alongside the session windows and the buy cap.

use std::path::Path;

use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use ashare_core::{Price, SecurityCode};
use ashare_exec::{
    Candidate, ExecutorConfig, Holding, SessionWindows, DEFAULT_BUY_CAP,
};

use crate::error::{AppError, AppResult};

/// One buy-candidate row of the day's universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateConfig {
    /// Security code.
    pub code: SecurityCode,
    /// Display name, also used for special-treatment board detection.
    pub name: String,
    /// The day this candidate was selected for.
    pub buy_date: NaiveDate,
    /// Capital allotted to this candidate.
    pub capital: Decimal,
    /// Protective floor price.
    pub stoploss_price: Price,
    /// Open acceptance band upper bound, percent over previous close.
    #[serde(default = "default_open_up_pct")]
    pub open_up_pct: Decimal,
    /// Open acceptance band lower bound, percent (negative) of previous close.
    #[serde(default = "default_open_down_pct")]
    pub open_down_pct: Decimal,
    /// How far above the open a buy may still be priced, in percent.
    #[serde(default = "default_max_buy_increase_pct")]
    pub max_buy_increase_pct: Decimal,
}

fn default_open_up_pct() -> Decimal {
    dec!(5)
}

fn default_open_down_pct() -> Decimal {
    dec!(-5)
}

fn default_max_buy_increase_pct() -> Decimal {
    dec!(2)
}

impl From<CandidateConfig> for Candidate {
    fn from(cfg: CandidateConfig) -> Self {
        Candidate::new(
            cfg.code,
            cfg.name,
            cfg.buy_date,
            cfg.capital,
            cfg.stoploss_price,
            cfg.open_up_pct,
            cfg.open_down_pct,
            cfg.max_buy_increase_pct,
        )
    }
}

/// One existing-position row of the day's universe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingConfig {
    /// Security code.
    pub code: SecurityCode,
    /// Display name.
    pub name: String,
    /// Held volume in shares.
    pub volume: u64,
    /// Protective floor price.
    pub stoploss_price: Price,
    /// Age of the position in trading days.
    #[serde(default = "default_hold_days")]
    pub hold_days: u32,
}

fn default_hold_days() -> u32 {
    1
}

impl From<HoldingConfig> for Holding {
    fn from(cfg: HoldingConfig) -> Self {
        Holding {
            code: cfg.code,
            name: cfg.name,
            volume: cfg.volume,
            stoploss_price: cfg.stoploss_price,
            hold_days: cfg.hold_days,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Concurrent-buy cap.
    #[serde(default = "default_buy_cap")]
    pub buy_cap: usize,
    /// Trading day override; defaults to the local calendar date.
    #[serde(default)]
    pub trading_day: Option<NaiveDate>,
    /// Usable capital seeded into the simulated broker account.
    #[serde(default = "default_capital")]
    pub capital: Decimal,
    /// Session windows; every field falls back to the exchange defaults.
    #[serde(default)]
    pub windows: SessionWindows,
    /// Buy candidates for the day.
    #[serde(default)]
    pub candidates: Vec<CandidateConfig>,
    /// Existing positions under protective management.
    #[serde(default)]
    pub holdings: Vec<HoldingConfig>,
}

fn default_buy_cap() -> usize {
    DEFAULT_BUY_CAP
}

fn default_capital() -> Decimal {
    dec!(100000)
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            buy_cap: default_buy_cap(),
            trading_day: None,
            capital: default_capital(),
            windows: SessionWindows::default(),
            candidates: Vec::new(),
            holdings: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file.
    pub fn load() -> AppResult<Self> {
        let config_path =
            std::env::var("ASHARE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if Path::new(&config_path).exists() {
            Self::from_file(&config_path)
        } else {
            tracing::warn!(path = %config_path, "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Load from a specific file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("failed to parse config: {e}")))
    }

    /// The effective trading day.
    #[must_use]
    pub fn trading_day(&self) -> NaiveDate {
        self.trading_day
            .unwrap_or_else(|| Local::now().date_naive())
    }

    /// Executor construction parameters derived from this configuration.
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            windows: self.windows.clone(),
            trading_day: self.trading_day(),
            buy_cap: self.buy_cap,
        }
    }

    /// The candidate universe as domain values.
    #[must_use]
    pub fn candidates(&self) -> Vec<Candidate> {
        self.candidates.iter().cloned().map(Into::into).collect()
    }

    /// The holding universe as domain values.
    #[must_use]
    pub fn holdings(&self) -> Vec<Holding> {
        self.holdings.iter().cloned().map(Into::into).collect()
    }
}
