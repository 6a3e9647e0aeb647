//! # Cooperative Cancellation
//!
//! A SIGINT handler flips a shared flag; every chunk loop in the core
//! checks it between chunks.
//!
//! ## Contract
//!
//! Cancellation stops further I/O promptly, the output guard deletes any
//! file created in this session, and the process exits nonzero.
//! Pre-existing containers already written to are reported as damaged, not
//! restored.
//!
//! ## Granularity
//!
//! Checks sit between 128 KiB chunks, so cancellation latency is one chunk
//! of I/O. The Argon2 derivation is the exception: it is compute-bound and
//! uninterruptible by design, and the flag is honored immediately after it
//! returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::CoreError;

/// Shared cancellation flag checked between chunks
///
/// Clones share one flag; the signal handler holds one clone and every
/// operation another.
#[derive(Clone, Default)]
pub struct CancelToken {
    /// The shared flag.
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation
    ///
    /// Safe to call from a signal handler thread; every clone observes the
    /// request.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Returns whether cancellation has been requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Fails with [`CoreError::Cancelled`] once cancellation is requested
    ///
    /// # Errors
    ///
    /// [`CoreError::Cancelled`] after [`cancel`](Self::cancel) has been
    /// called on any clone.
    pub fn check(&self) -> Result<(), CoreError> {
        if self.is_cancelled() { Err(CoreError::Cancelled) } else { Ok(()) }
    }
}
