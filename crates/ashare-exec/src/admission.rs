//! Buy admission control.
//!
//! Tracks which candidates have been successfully bought and enforces the
//! hard cap on concurrent purchases. The set sits behind its own mutex,
//! deliberately independent of the registry lock: the fill path that feeds
//! it may run on a router callback stack that already holds router locks,
//! so this lock must never be held while acquiring the registry lock.

use std::collections::HashSet;

use parking_lot::Mutex;
use tracing::{info, warn};

use ashare_core::SecurityCode;

/// Maximum number of distinct candidates bought in one run.
pub const DEFAULT_BUY_CAP: usize = 3;

/// Outcome of recording a buy fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FillAdmission {
    /// The cap was already reached before this fill; nothing recorded.
    Rejected,
    /// The candidate was recorded (or already present) below the cap.
    Admitted,
    /// This fill closed the cap. Carries the snapshot of the full bought
    /// set for the cascade cancel; produced exactly once per run.
    CapReached(HashSet<SecurityCode>),
}

/// Bounded set of bought candidates.
pub struct AdmissionController {
    cap: usize,
    bought: Mutex<HashSet<SecurityCode>>,
}

impl AdmissionController {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            bought: Mutex::new(HashSet::new()),
        }
    }

    /// Record a successful buy fill for `code`.
    ///
    /// The check-then-act runs under the lock, so exactly one fill can
    /// transition the set from below-cap to at-cap; that fill gets the
    /// snapshot, every later fill is rejected before insertion.
    pub fn record_fill(&self, code: SecurityCode) -> FillAdmission {
        let mut bought = self.bought.lock();

        if bought.len() >= self.cap {
            warn!(%code, cap = self.cap, "buy cap already reached, fill not recorded");
            return FillAdmission::Rejected;
        }

        let inserted = bought.insert(code);

        if inserted && bought.len() == self.cap {
            info!(cap = self.cap, "buy cap reached");
            FillAdmission::CapReached(bought.clone())
        } else {
            FillAdmission::Admitted
        }
    }

    /// Whether the cap has been reached.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.bought.lock().len() >= self.cap
    }

    /// Number of candidates recorded as bought.
    #[must_use]
    pub fn bought_count(&self) -> usize {
        self.bought.lock().len()
    }
}
