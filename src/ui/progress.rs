//! # Progress Bar Module
//!
//! This module provides real-time progress tracking for streaming file
//! operations with performance metrics and terminal-safe rendering. It wraps
//! the `indicatif` library with application-specific styling and behavior.
//!
//! ## Features
//!
//! - **Real-time Updates**: Smooth progress updates during chunked I/O
//! - **Performance Metrics**: Transfer speed and estimated time remaining
//! - **Terminal Safety**: Graceful fallback on non-TTY terminals
//! - **Automatic Cleanup**: Bars clear themselves on every exit path
//!
//! ## Design Considerations
//!
//! - **Performance**: Minimal overhead during tight chunk loops
//! - **One bar per operation**: Encryption, decryption, embedding,
//!   extraction, and random fills each drive exactly one bar
//! - **No bar for Argon2**: The derivation's runtime is the contract, and a
//!   progress estimate would only invite interrupting it

use anyhow::Result;
use indicatif::{ProgressBar as Bar, ProgressStyle as Style};

/// Template string for progress bar appearance
///
/// Template variables:
/// - `{spinner:.green}`: Animated spinning indicator in green
/// - `{msg}`: Custom message (the operation description)
/// - `[{bar:40.cyan/blue}]`: 40-character progress bar with cyan/blue gradient
/// - `{bytes}/{total_bytes}`: Current and total bytes processed
/// - `{bytes_per_sec}`: Transfer speed in bytes per second
/// - `{eta}`: Estimated time remaining
const PROGRESS_TEMPLATE: &str = "{spinner:.green} {msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})";

/// Wrapper around the indicatif progress bar with application styling
///
/// Provides a high-level interface for byte-counting progress during the
/// streaming operations. Handles template styling, terminal management, and
/// cleanup automatically.
///
/// ## Terminal Safety
///
/// The underlying bar properly handles:
/// - Non-TTY output (renders nothing instead of garbage)
/// - Terminal resize events
/// - Cursor positioning and restoration
///
/// ## Cleanup Guarantees
///
/// A bar that goes out of scope without an explicit [`finish`](Self::finish)
/// call is finished and cleared by the `Drop` implementation, so an early
/// return or error path never leaves the terminal mid-bar.
pub struct ProgressBar {
    /// The underlying indicatif progress bar instance
    bar: Bar,
}

impl ProgressBar {
    /// Create a new progress bar with the specified total and description
    ///
    /// # Arguments
    ///
    /// * `total` - The maximum value (total bytes to process)
    /// * `description` - Human-readable description of the operation
    ///
    /// # Returns
    ///
    /// * `Result<Self>` - New ProgressBar instance or error if styling fails
    ///
    /// # Errors
    ///
    /// Returns an error if the progress template is malformed; the template
    /// is a compile-time constant, so this only fires on an `indicatif`
    /// behavior change.
    pub fn new(total: u64, description: &str) -> Result<Self> {
        let bar = Bar::new(total);
        bar.set_style(Style::with_template(PROGRESS_TEMPLATE)?.progress_chars("●○ "));
        bar.set_message(description.to_owned());
        Ok(Self { bar })
    }

    /// Increment the progress bar by the specified amount
    ///
    /// # Arguments
    ///
    /// * `delta` - Number of bytes to add to the current progress
    ///
    /// # Performance Notes
    ///
    /// - Marked `#[inline]` for minimal overhead in chunk loops
    /// - Display refreshes are throttled internally by `indicatif`
    #[inline]
    pub fn add(&self, delta: u64) {
        self.bar.inc(delta);
    }

    /// Complete the progress bar and clear it from the terminal
    ///
    /// Idempotent; calling it on an already-finished bar does nothing.
    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Drop for ProgressBar {
    /// Finishes an unfinished bar when it goes out of scope
    ///
    /// Error paths and early returns drop the bar without calling
    /// [`finish`](Self::finish); clearing it here keeps the terminal usable
    /// for the error report that follows.
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}
