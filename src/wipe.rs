//! # Random Range Overwrite
//!
//! Overwrites a byte range of an existing file or block device with
//! uniform random bytes, used to prepare container regions and to retire
//! spans that held blobs.
//!
//! ## Properties
//!
//! - **In place**: The target is opened read-write and never truncated;
//!   bytes outside the range are untouched
//! - **Idempotent in distribution**: Running it twice leaves a state that
//!   depends only on the second run's CSPRNG output
//! - **Durable**: fsync before success is reported
//!
//! Overwriting a block device needs whatever privileges the platform
//! demands; that is the caller's concern.

use std::io::{Seek, SeekFrom};
use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::file;
use crate::ui::progress::ProgressBar;

/// Overwrites `[start, end)` of an existing file or block device with
/// uniform random bytes, then fsyncs
///
/// # Arguments
///
/// * `path` - The target; must already exist
/// * `start` - Range start offset
/// * `end` - Range end offset, exclusive
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar
///
/// # Errors
///
/// [`CoreError::BadInput`] for an empty or out-of-bounds range or a
/// missing target (checked before the first byte is touched); a failure
/// after that leaves the range partially overwritten, which the caller
/// warns about.
pub fn overwrite(
    path: &Path,
    start: u64,
    end: u64,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<(), CoreError> {
    if end <= start {
        return Err(CoreError::bad_input(format!("empty range [{start}, {end})")));
    }

    let mut target = file::open_readwrite(path)?;
    let len = file::input_len(&target)?;
    if end > len {
        return Err(CoreError::bad_input(format!("range [{start}, {end}) exceeds the {len}-byte target")));
    }

    target.seek(SeekFrom::Start(start))?;
    file::write_random_bytes(&mut target, end - start, cancel, progress)?;
    file::fsync(&target)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_overwrite_changes_only_the_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("target");
        fs::write(&path, vec![0x22u8; 10_000]).unwrap();

        overwrite(&path, 1000, 9000, &CancelToken::new(), None).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 10_000);
        assert!(bytes[..1000].iter().all(|&b| b == 0x22));
        assert!(bytes[9000..].iter().all(|&b| b == 0x22));
        // 8000 random bytes are not all the old filler.
        assert!(bytes[1000..9000].iter().any(|&b| b != 0x22));
    }

    #[test]
    fn test_overwrite_twice_is_independent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("target");
        fs::write(&path, vec![0u8; 4096]).unwrap();

        let token = CancelToken::new();
        overwrite(&path, 0, 4096, &token, None).unwrap();
        let first = fs::read(&path).unwrap();
        overwrite(&path, 0, 4096, &token, None).unwrap();
        let second = fs::read(&path).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_overwrite_rejects_bad_ranges() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("target");
        fs::write(&path, vec![0u8; 100]).unwrap();

        let token = CancelToken::new();
        assert!(matches!(overwrite(&path, 50, 50, &token, None), Err(CoreError::BadInput(_))));
        assert!(matches!(overwrite(&path, 0, 101, &token, None), Err(CoreError::BadInput(_))));
    }

    #[test]
    fn test_overwrite_missing_target() {
        let result = overwrite(Path::new("/no/such/target"), 0, 10, &CancelToken::new(), None);
        assert!(matches!(result, Err(CoreError::BadInput(_))));
    }
}
