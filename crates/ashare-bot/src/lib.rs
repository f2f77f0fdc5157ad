//! Binary crate surface: configuration, logging, error types.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, CandidateConfig, HoldingConfig};
pub use error::{AppError, AppResult};
pub use logging::init_logging;
