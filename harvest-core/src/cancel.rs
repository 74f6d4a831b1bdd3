//! Cooperative cancellation for build passes.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Error returned when a build pass observed a cancellation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("build pass was cancelled")]
pub struct Cancelled;

/// A shared cancellation flag.
///
/// The host scheduler keeps one clone and hands others to every stage of a
/// pass. Stages call [`CancellationToken::check`] at the start of each
/// node-level unit of work so a stale pass stops promptly.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Every clone observes it.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Return `Err(Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), Cancelled> {
        if self.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}
