//! Quote subscription and delivery seams.
//!
//! The feed owns its delivery threads: `QuoteSink::on_quotes` may be
//! invoked concurrently, for the same or different codes, at any time
//! between subscribe and unsubscribe.

use mockall::automock;

use ashare_core::{QuoteResult, SecurityCode};

/// Which decision engine a subscription feeds.
///
/// A code can be subscribed on both channels at once (a candidate that is
/// also a holding); unsubscription is per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuoteChannel {
    /// New-stock candidates (buy decisions).
    Candidate,
    /// Existing holdings (protective/exit decisions).
    Holding,
}

/// Quote transport: subscribe/unsubscribe per code and channel.
#[automock]
pub trait QuoteFeed: Send + Sync {
    /// Start delivering quotes for `code` on `channel`.
    fn subscribe(&self, code: SecurityCode, channel: QuoteChannel);

    /// Stop delivering quotes for `code` on `channel`. Idempotent.
    fn unsubscribe(&self, code: &SecurityCode, channel: QuoteChannel);
}

/// Receiver of quote batches, implemented by the executor.
pub trait QuoteSink: Send + Sync {
    /// Deliver a finite batch of per-code results for one channel.
    ///
    /// Entries may be error markers; the sink filters them.
    fn on_quotes(&self, channel: QuoteChannel, batch: &[QuoteResult]);
}
