//! # Shared File I/O Helpers
//!
//! Open/create/fsync primitives, the chunked CSPRNG writer, and the
//! delete-on-error output guard.
//!
//! ## Ownership Model
//!
//! Every operation opens its own input and output handles, owns them for
//! the duration, and releases them on every exit path; there is no shared
//! mutable state outside the two handles.
//!
//! ## Cleanup Guarantees
//!
//! Newly created outputs are wrapped in an [`OutputGuard`] that deletes the
//! file unless the operation commits, which covers errors and cancellation
//! alike. Pre-existing files (containers, overwrite targets) are never
//! guarded; damage to them is reported, not cleaned up.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::config::CHUNK_SIZE;
use crate::error::CoreError;
use crate::rng;
use crate::ui::progress::ProgressBar;

/// Opens an existing regular file or block device for reading
///
/// # Errors
///
/// [`CoreError::BadInput`] for a missing path, [`CoreError::Io`] for
/// anything else.
pub fn open_input(path: &Path) -> Result<File, CoreError> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::bad_input(format!("input not found: {}", path.display())),
        _ => CoreError::Io(e),
    })
}

/// Creates or truncates an output file
///
/// Overwrite confirmation is the prompt layer's job; by the time this runs
/// the caller has decided.
///
/// # Errors
///
/// [`CoreError::Io`] on creation failure.
pub fn create_output(path: &Path) -> Result<File, CoreError> {
    Ok(OpenOptions::new().write(true).create(true).truncate(true).open(path)?)
}

/// Creates a new file, failing if the path already exists
///
/// # Errors
///
/// [`CoreError::BadInput`] for an occupied path, [`CoreError::Io`] for
/// anything else.
pub fn create_exclusive(path: &Path) -> Result<File, CoreError> {
    OpenOptions::new().write(true).create_new(true).open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::AlreadyExists => CoreError::bad_input(format!("file already exists: {}", path.display())),
        _ => CoreError::Io(e),
    })
}

/// Opens an existing file or block device for in-place writing, without
/// truncation
///
/// # Errors
///
/// [`CoreError::BadInput`] for a missing path, [`CoreError::Io`] for
/// anything else.
pub fn open_readwrite(path: &Path) -> Result<File, CoreError> {
    OpenOptions::new().read(true).write(true).open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::bad_input(format!("container not found: {}", path.display())),
        _ => CoreError::Io(e),
    })
}

/// Size of a regular file or block device, in bytes
///
/// # Errors
///
/// [`CoreError::Io`] when metadata cannot be read.
pub fn input_len(file: &File) -> Result<u64, CoreError> {
    Ok(file.metadata()?.len())
}

/// Flushes file contents to stable storage
///
/// Every operation that reports success fsyncs first; a report means the
/// bytes are on the medium, not in a cache.
///
/// # Errors
///
/// [`CoreError::Io`] when the sync fails.
pub fn fsync(file: &File) -> Result<(), CoreError> {
    Ok(file.sync_all()?)
}

/// Streams `len` CSPRNG bytes to a writer in 128 KiB chunks
///
/// # Arguments
///
/// * `output` - The destination writer
/// * `len` - Number of random bytes to produce
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar
///
/// # Errors
///
/// [`CoreError::Cancelled`] between chunks, [`CoreError::Io`] on write
/// failure.
pub fn write_random_bytes<W: Write>(
    output: &mut W,
    len: u64,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<(), CoreError> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut remaining = len;

    while remaining > 0 {
        cancel.check()?;
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        rng::fill(&mut buffer[..n]);
        output.write_all(&buffer[..n])?;
        if let Some(bar) = progress {
            bar.add(n as u64);
        }
        remaining -= n as u64;
    }

    Ok(())
}

/// Deletes a newly created output file unless the operation commits
///
/// Covers the cancellation contract: stop promptly, delete the session's
/// output, exit nonzero. Pre-existing containers are never guarded; an
/// error mid-write leaves them damaged, and the caller reports that
/// instead.
///
/// ## Usage
///
/// Arm the guard immediately after creating the output, before the first
/// write; call [`commit`](Self::commit) only after fsync. Every early
/// return in between, `?` included, triggers the deletion.
pub struct OutputGuard {
    /// The guarded output path.
    path: PathBuf,

    /// Whether dropping still deletes; cleared by `commit`.
    armed: bool,
}

impl OutputGuard {
    /// Arms a guard for a just-created output file
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf(), armed: true }
    }

    /// Marks the operation successful; the file stays
    pub fn commit(mut self) {
        self.armed = false;
    }
}

impl Drop for OutputGuard {
    fn drop(&mut self) {
        if self.armed {
            if let Err(e) = fs::remove_file(&self.path)
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!("could not remove partial output {}: {e}", self.path.display());
            }
        }
    }
}
