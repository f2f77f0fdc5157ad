//! Real-time trading-execution coordinator.
//!
//! Given the day's universe of buy candidates and protected holdings, the
//! executor consumes live quote events and turns them into buy, protective
//! stoploss, and opportunistic sell orders, under capital limits, a bounded
//! concurrent-purchase cap, and wall-clock trading windows.
//!
//! Concurrency model: quote delivery and fill delivery happen on threads
//! owned by the broker collaborators; a single `RwLock` serializes every
//! decision that touches the active indexes or the order runtime book. The
//! admission set and the capital scalar sit behind their own locks, and the
//! only cross-domain effect (cap-closing cascade cancel) travels through a
//! worker queue so it never runs on a router callback stack.

pub mod admission;
pub mod capital;
pub mod error;
pub mod executor;
pub mod registry;
pub mod stocks;
pub mod windows;

pub use admission::{AdmissionController, FillAdmission, DEFAULT_BUY_CAP};
pub use capital::CapitalTracker;
pub use error::ExecError;
pub use executor::{CascadeCancel, Executor, ExecutorConfig};
pub use registry::{OrderRuntime, RuntimeBook};
pub use stocks::{Candidate, Holding, OpenDiscovery, OpenOutcome};
pub use windows::SessionWindows;
