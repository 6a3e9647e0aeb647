//! Embedding and extraction of byte ranges in containers.
//!
//! A container is any addressable byte sequence (a regular file or a block
//! device) large enough to hold the range. Embedding overwrites
//! `[offset, offset + len)` with the source bytes; extraction copies
//! `[start, end)` out into a new file. A cryptoblob gets no special
//! treatment: it is embedded exactly like any other file, which is the
//! point.
//!
//! Both directions fsync before reporting success and return a 256-bit
//! BLAKE3 checksum of the moved range as a receipt; the `(start, end)` pair
//! plus the keys are the user's out-of-band filesystem.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::cancel::CancelToken;
use crate::config::CHUNK_SIZE;
use crate::error::CoreError;
use crate::file;
use crate::ui::progress::ProgressBar;

/// Receipt for an embed or extract: the span touched and its checksum.
pub struct RangeReceipt {
    /// Range start offset in the container.
    pub start: u64,

    /// Range end offset, exclusive.
    pub end: u64,

    /// BLAKE3 of the range contents; comparing the embed receipt with a
    /// later extract receipt detects container damage without keys.
    pub checksum: [u8; 32],
}

/// Copies `len` bytes from reader to writer, returning the BLAKE3 checksum
/// of the copied range.
fn copy_range<R: Read, W: Write>(
    input: &mut R,
    output: &mut W,
    len: u64,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<[u8; 32], CoreError> {
    let mut hasher = blake3::Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut remaining = len;

    while remaining > 0 {
        cancel.check()?;
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        input.read_exact(&mut buffer[..n])?;
        hasher.update(&buffer[..n]);
        output.write_all(&buffer[..n])?;
        if let Some(bar) = progress {
            bar.add(n as u64);
        }
        remaining -= n as u64;
    }
    output.flush()?;

    Ok(*hasher.finalize().as_bytes())
}

/// Writes the whole of `source` over the container range starting at
/// `offset`
///
/// # Arguments
///
/// * `source` - The file whose bytes land in the container
/// * `container` - An existing file or block device, opened read-write,
///   never truncated
/// * `offset` - Where the range begins
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar
///
/// # Returns
///
/// The receipt: the span written and its BLAKE3 checksum
///
/// # Errors
///
/// [`CoreError::BadInput`] when the range does not fit inside the
/// container (checked before the first byte is touched); any
/// [`CoreError::Io`] or cancellation afterwards leaves the container
/// damaged, and the caller reports that rather than deleting anything.
pub fn embed(
    source: &Path,
    container: &Path,
    offset: u64,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<RangeReceipt, CoreError> {
    let mut input = file::open_input(source)?;
    let len = file::input_len(&input)?;

    let mut dest = file::open_readwrite(container)?;
    let container_len = file::input_len(&dest)?;
    let end = offset.checked_add(len).ok_or_else(|| CoreError::bad_input("range end overflows"))?;
    if end > container_len {
        return Err(CoreError::bad_input(format!(
            "range [{offset}, {end}) does not fit in a {container_len}-byte container"
        )));
    }

    dest.seek(SeekFrom::Start(offset))?;
    let checksum = copy_range(&mut input, &mut dest, len, cancel, progress)?;
    file::fsync(&dest)?;

    Ok(RangeReceipt { start: offset, end, checksum })
}

/// Copies the container range `[start, end)` into a new file
///
/// # Arguments
///
/// * `container` - The carrier file or block device, opened read-only
/// * `start` - Range start offset
/// * `end` - Range end offset, exclusive
/// * `output` - Destination path; created (or truncated) only after the
///   range checks pass
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar
///
/// # Returns
///
/// The receipt: the span read and its BLAKE3 checksum, which matches the
/// embed receipt when the range is intact
///
/// # Errors
///
/// [`CoreError::BadInput`] for an empty or out-of-bounds range; a partial
/// output left by a later error or cancellation is deleted before
/// returning.
pub fn extract(
    container: &Path,
    start: u64,
    end: u64,
    output: &Path,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<RangeReceipt, CoreError> {
    if end <= start {
        return Err(CoreError::bad_input(format!("empty range [{start}, {end})")));
    }

    let mut input = file::open_input(container)?;
    let container_len = file::input_len(&input)?;
    if end > container_len {
        return Err(CoreError::bad_input(format!(
            "range [{start}, {end}) exceeds the {container_len}-byte container"
        )));
    }

    let mut dest = file::create_output(output)?;
    let guard = file::OutputGuard::new(output);
    input.seek(SeekFrom::Start(start))?;
    let checksum = copy_range(&mut input, &mut dest, end - start, cancel, progress)?;
    file::fsync(&dest)?;
    guard.commit();

    Ok(RangeReceipt { start, end, checksum })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_embed_then_extract_round_trips() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("blob");
        let container = dir.path().join("container");
        let recovered = dir.path().join("recovered");

        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        fs::write(&source, &payload).unwrap();
        fs::write(&container, vec![0u8; 1_000_000]).unwrap();

        let token = CancelToken::new();
        let embedded = embed(&source, &container, 123_456, &token, None).unwrap();
        assert_eq!(embedded.start, 123_456);
        assert_eq!(embedded.end, 123_456 + payload.len() as u64);

        let extracted = extract(&container, embedded.start, embedded.end, &recovered, &token, None).unwrap();
        assert_eq!(extracted.checksum, embedded.checksum);
        assert_eq!(fs::read(&recovered).unwrap(), payload);
    }

    #[test]
    fn test_embed_leaves_surroundings_untouched() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("s");
        let container = dir.path().join("c");
        fs::write(&source, vec![0xFFu8; 100]).unwrap();
        fs::write(&container, vec![0x11u8; 1000]).unwrap();

        embed(&source, &container, 400, &CancelToken::new(), None).unwrap();

        let bytes = fs::read(&container).unwrap();
        assert!(bytes[..400].iter().all(|&b| b == 0x11));
        assert!(bytes[400..500].iter().all(|&b| b == 0xFF));
        assert!(bytes[500..].iter().all(|&b| b == 0x11));
    }

    #[test]
    fn test_embed_rejects_overhang() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("s");
        let container = dir.path().join("c");
        fs::write(&source, vec![0u8; 100]).unwrap();
        fs::write(&container, vec![0u8; 150]).unwrap();

        let result = embed(&source, &container, 51, &CancelToken::new(), None);
        assert!(matches!(result, Err(CoreError::BadInput(_))));
    }

    #[test]
    fn test_extract_rejects_bad_ranges() {
        let dir = tempdir().unwrap();
        let container = dir.path().join("c");
        let out = dir.path().join("o");
        fs::write(&container, vec![0u8; 100]).unwrap();

        let token = CancelToken::new();
        assert!(matches!(extract(&container, 10, 10, &out, &token, None), Err(CoreError::BadInput(_))));
        assert!(matches!(extract(&container, 50, 101, &out, &token, None), Err(CoreError::BadInput(_))));
    }

    #[test]
    fn test_failed_extract_leaves_preexisting_output_alone() {
        let dir = tempdir().unwrap();
        let container = dir.path().join("c");
        let out = dir.path().join("o");
        fs::write(&container, vec![0u8; 100]).unwrap();
        fs::write(&out, b"precious").unwrap();

        // Out-of-bounds range fails before the output is even opened.
        assert!(extract(&container, 0, 500, &out, &CancelToken::new(), None).is_err());
        assert_eq!(fs::read(&out).unwrap(), b"precious");
    }

    #[test]
    fn test_cancelled_extract_removes_partial_output() {
        let dir = tempdir().unwrap();
        let container = dir.path().join("c");
        let out = dir.path().join("o");
        fs::write(&container, vec![0u8; 100]).unwrap();

        let token = CancelToken::new();
        token.cancel();
        assert!(matches!(
            extract(&container, 0, 100, &out, &token, None),
            Err(CoreError::Cancelled)
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_checksum_matches_range_contents() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("s");
        let container = dir.path().join("c");
        let data = vec![0xABu8; 5000];
        fs::write(&source, &data).unwrap();
        fs::write(&container, vec![0u8; 10_000]).unwrap();

        let receipt = embed(&source, &container, 0, &CancelToken::new(), None).unwrap();
        assert_eq!(receipt.checksum, *blake3::hash(&data).as_bytes());
    }
}
