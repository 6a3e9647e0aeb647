//! # Process-Wide Runtime Configuration
//!
//! The two unsafe flags and the tunable derivation parameters travel in
//! explicit structs passed to every core call; there is no global mutable
//! state.
//!
//! ## The Two Flags
//!
//! - `--unsafe-debug`: logs derived sizes and offers the fake-MAC option
//! - `--unsafe-decrypt`: keeps plaintext despite MAC failure, for
//!   recovering data from damaged blobs
//!
//! Both default to off and neither affects the on-disk format.
//!
//! ## Tuning
//!
//! Time cost and padding percentage are per-operation, not persisted in
//! the blob, and must be repeated exactly at decryption; a wrong value
//! fails like a wrong key.

use crate::config::{DEFAULT_PAD_PCT, DEFAULT_TIME_COST, MAX_PAD_PCT};
use crate::error::CoreError;

/// Runtime configuration for one process.
///
/// `unsafe_debug` exposes derived sizes and the fake-MAC option;
/// `unsafe_decrypt` releases plaintext despite MAC failure. Both default to
/// off.
#[derive(Clone, Copy, Debug)]
pub struct Session {
    /// Log derived pad sizes and offer debug-only options.
    pub unsafe_debug: bool,

    /// Keep decrypted output even when the tag does not verify.
    pub unsafe_decrypt: bool,
}

impl Session {
    /// Builds the session config from the parsed flags
    #[must_use]
    pub fn new(unsafe_debug: bool, unsafe_decrypt: bool) -> Self {
        Self { unsafe_debug, unsafe_decrypt }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self { unsafe_debug: false, unsafe_decrypt: false }
    }
}

/// Tunable key-derivation and padding parameters for one operation.
///
/// Neither value is persisted in the blob; a decryptor must supply the same
/// values the encryptor used, or verification fails like any other wrong-key
/// attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tuning {
    /// Argon2id time cost (number of passes), `>= 1`.
    pub time_cost: u32,

    /// Maximum padding as a percentage of the final blob size.
    pub pad_pct: u8,
}

impl Tuning {
    /// Validates and builds a tuning set
    ///
    /// # Arguments
    ///
    /// * `time_cost` - Argon2id pass count, `>= 1`
    /// * `pad_pct` - Maximum padding percentage, `<= 95`
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::BadInput`] for a zero time cost or a padding
    /// percentage above the supported bound; invalid values are rejected
    /// here, before any derivation or I/O starts.
    pub fn new(time_cost: u32, pad_pct: u8) -> Result<Self, CoreError> {
        if time_cost < 1 {
            return Err(CoreError::bad_input("time cost must be at least 1"));
        }
        if pad_pct > MAX_PAD_PCT {
            return Err(CoreError::bad_input(format!(
                "padding percentage must be at most {MAX_PAD_PCT}, got {pad_pct}"
            )));
        }
        Ok(Self { time_cost, pad_pct })
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self { time_cost: DEFAULT_TIME_COST, pad_pct: DEFAULT_PAD_PCT }
    }
}
