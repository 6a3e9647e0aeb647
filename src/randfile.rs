//! # Random File Creation
//!
//! Creates new files filled with uniform random bytes, the standard way to
//! prepare a container: a file of CSPRNG output is statistically
//! indistinguishable from one holding embedded cryptoblobs, so the
//! container's existence proves nothing about its contents.
//!
//! ## Safety Properties
//!
//! - **Exclusive creation**: An existing file at the path is never
//!   touched; creation fails instead
//! - **Cleanup**: A partial file left by an error or cancellation is
//!   deleted before returning
//! - **Durable**: fsync before success is reported

use std::path::Path;

use crate::cancel::CancelToken;
use crate::error::CoreError;
use crate::file::{self, OutputGuard};
use crate::ui::progress::ProgressBar;

/// Creates a new file of `size` CSPRNG bytes, failing if the path exists
///
/// # Arguments
///
/// * `path` - Destination; must not exist
/// * `size` - File size in bytes; zero is allowed
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar
///
/// # Errors
///
/// [`CoreError::BadInput`] for an occupied path, [`CoreError::Cancelled`]
/// or [`CoreError::Io`] mid-write; a partial file is deleted before
/// returning, and a pre-existing file at the path is never touched.
pub fn create(path: &Path, size: u64, cancel: &CancelToken, progress: Option<&ProgressBar>) -> Result<(), CoreError> {
    let mut output = file::create_exclusive(path)?;
    let guard = OutputGuard::new(path);
    file::write_random_bytes(&mut output, size, cancel, progress)?;
    file::fsync(&output)?;
    guard.commit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_create_writes_exact_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("container");
        create(&path, 300_000, &CancelToken::new(), None).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 300_000);
    }

    #[test]
    fn test_create_refuses_existing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("container");
        fs::write(&path, b"occupied").unwrap();
        assert!(matches!(create(&path, 100, &CancelToken::new(), None), Err(CoreError::BadInput(_))));
        assert_eq!(fs::read(&path).unwrap(), b"occupied");
    }

    #[test]
    fn test_create_output_looks_random() {
        // Coarse monobit check: the bit balance of CSPRNG output stays near
        // half within five sigma.
        let dir = tempdir().unwrap();
        let path = dir.path().join("container");
        create(&path, 131_072, &CancelToken::new(), None).unwrap();

        let bytes = fs::read(&path).unwrap();
        let ones: u64 = bytes.iter().map(|b| u64::from(b.count_ones())).sum();
        let bits = bytes.len() as f64 * 8.0;
        let deviation = (ones as f64 - bits / 2.0).abs() / (bits / 4.0).sqrt();
        assert!(deviation < 5.0, "bit balance deviates {deviation} sigma");
    }

    #[test]
    fn test_cancelled_create_removes_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial");
        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(create(&path, 1024, &token, None), Err(CoreError::Cancelled)));
        assert!(!path.exists());
    }

    #[test]
    fn test_create_zero_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty");
        create(&path, 0, &CancelToken::new(), None).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
