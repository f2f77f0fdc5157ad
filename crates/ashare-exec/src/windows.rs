//! Session windows and window waiting.
//!
//! Six distinct wall-clock windows gate distinct behaviors. The defaults
//! follow the exchange session: quotes are accepted and protective orders
//! published through most of the continuous session, buys close a minute
//! earlier, and the (unimplemented) general sell evaluation has its own
//! late two-minute slot.

use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};

use ashare_core::TradingWindow;

/// The six session windows driving the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionWindows {
    /// Overall run window: `run()` waits for it and fails once it is past.
    #[serde(default = "default_run")]
    pub run: TradingWindow,
    /// Overall execute window: the sweep loop exits when it closes.
    #[serde(default = "default_execute")]
    pub execute: TradingWindow,
    /// Quotes timestamped outside this window are ignored.
    #[serde(default = "default_accept_quote")]
    pub accept_quote: TradingWindow,
    /// Protective sweep only publishes stoploss orders inside this window.
    #[serde(default = "default_publish_stoploss")]
    pub publish_stoploss: TradingWindow,
    /// Buy orders are only requested inside this window.
    #[serde(default = "default_publish_buy")]
    pub publish_buy: TradingWindow,
    /// Window for the general sell evaluation (currently never acted on).
    #[serde(default = "default_publish_sell")]
    pub publish_sell: TradingWindow,
}

fn default_run() -> TradingWindow {
    TradingWindow::from_hms("09:29", "14:50")
}

fn default_execute() -> TradingWindow {
    TradingWindow::from_hms("09:29", "15:30")
}

fn default_accept_quote() -> TradingWindow {
    TradingWindow::from_hms("09:30", "14:56")
}

fn default_publish_stoploss() -> TradingWindow {
    TradingWindow::from_hms("09:30", "14:56")
}

fn default_publish_buy() -> TradingWindow {
    TradingWindow::from_hms("09:30", "14:55")
}

fn default_publish_sell() -> TradingWindow {
    TradingWindow::from_hms("14:55", "14:57")
}

impl Default for SessionWindows {
    fn default() -> Self {
        Self {
            run: default_run(),
            execute: default_execute(),
            accept_quote: default_accept_quote(),
            publish_stoploss: default_publish_stoploss(),
            publish_buy: default_publish_buy(),
            publish_sell: default_publish_sell(),
        }
    }
}

/// Block until `window` opens, polling at 1-second resolution.
///
/// Returns `false` without waiting further once the current time is
/// already past the window's close.
pub async fn wait_for(window: &TradingWindow) -> bool {
    loop {
        let now = Local::now().time();

        if window.contains(now) {
            return true;
        }
        if window.is_past(now) {
            return false;
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
