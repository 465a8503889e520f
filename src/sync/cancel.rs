//! Cooperative cancellation token
//!
//! Worker threads cannot be torn down asynchronously; a cancellation
//! request sets this flag and the worker observes it at its defined
//! suspension points (stream read, gate wait, batch-file loop).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Returned by cancellation-aware operations when the token has fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

/// Shared cancellation flag for one worker thread.
///
/// Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}
