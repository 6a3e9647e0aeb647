//! # Typed Error Kinds
//!
//! Every failure the codec can produce is one of these kinds. They
//! propagate unchanged to the caller; nothing is recovered locally. The
//! application layer wraps them in `anyhow` context for display.
//!
//! ## Reporting Policy
//!
//! The messages are part of the security posture. MAC failure is
//! deliberately ambiguous (wrong keys, wrong time cost, wrong custom
//! parameters, corruption, and a fake tag are one indistinguishable
//! outcome); length mismatch is deliberately definite (the span is not a
//! valid cryptoblob, full stop). Nothing ever narrows the ambiguity.

use thiserror::Error;

/// Errors surfaced by the cryptoblob core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Any read, write, seek, or fsync failure.
    #[error("i/o failure")]
    Io(#[from] std::io::Error),

    /// The span does not describe a valid cryptoblob: the input is below the
    /// minimum blob size, or no payload size reproduces `end - start` under
    /// the derived pad keys. Definite: this is not a valid blob of the
    /// specified span.
    #[error("the specified span is not a valid cryptoblob")]
    LengthMismatch,

    /// The computed tag differs from the stored tag. Deliberately ambiguous:
    /// wrong keys, wrong time cost, wrong custom parameters, corruption, and
    /// a fake tag are indistinguishable.
    #[error(
        "MAC verification failed: wrong keys, wrong time cost, wrong custom \
         parameters, data corruption, or a fake tag (indistinguishable)"
    )]
    MacFail,

    /// The user aborted mid-operation.
    #[error("operation cancelled")]
    Cancelled,

    /// Invalid caller-supplied input: bad time cost or padding percentage,
    /// unreadable keyfile path, or a payload large enough to exhaust the
    /// nonce counter.
    #[error("{0}")]
    BadInput(String),

    /// The environment cannot support the operation, e.g. the 1 GiB Argon2
    /// arena cannot be allocated. Never retried with smaller parameters.
    #[error("{0}")]
    Env(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::BadInput`] with a formatted message
    ///
    /// # Arguments
    ///
    /// * `msg` - The user-facing description of what was invalid
    pub fn bad_input(msg: impl Into<String>) -> Self {
        Self::BadInput(msg.into())
    }
}
