//! Error types for the execution coordinator.

use thiserror::Error;

use ashare_core::{OrderId, SecurityCode};

/// Executor error types.
///
/// The `OrderMismatch` and `VolumeUnderflow` variants are invariant
/// violations: they indicate a bug in the concurrency protocol and stop
/// processing for the affected security rather than being recovered.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Run window already closed before execution could start")]
    RunWindowMissed,

    #[error("No order runtime for {0} on fill")]
    UnknownRuntime(SecurityCode),

    #[error("Fill for order {order_id} on {code} does not match the live order")]
    OrderMismatch {
        code: SecurityCode,
        order_id: OrderId,
    },

    #[error("Fill volume {fill} exceeds remaining volume {remaining} for {code}")]
    VolumeUnderflow {
        code: SecurityCode,
        remaining: u64,
        fill: u64,
    },
}
