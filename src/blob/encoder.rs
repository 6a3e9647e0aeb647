//! # Blob Assembly
//!
//! A strictly sequential single pass: salts and pad sizes are fixed up
//! front, then every byte is written in cryptoblob order. The MAC is
//! computed alongside the writes; nothing is buffered beyond one chunk.
//!
//! ## Write Order
//!
//! 1. `salt_head` (16 bytes)
//! 2. Head pad, `P_h` CSPRNG bytes
//! 3. Comments ciphertext (512 bytes, counter 1)
//! 4. Payload ciphertext (128 KiB chunks, counter `2 + i`)
//! 5. The tag (64 bytes), real or fake
//! 6. Tail pad, `P_t` CSPRNG bytes
//! 7. `salt_tail` (16 bytes)
//!
//! ## Design Considerations
//!
//! - **Single pass, no seeks**: The writer may be a fresh file or a
//!   position inside a container; the encoder never looks back
//! - **Early rejection**: The nonce-counter bound is checked before the
//!   first byte is written, so an oversized payload never leaves a partial
//!   blob
//! - **Cancellation**: The token is checked between chunks; the caller's
//!   output guard removes whatever was written

use std::io::{Read, Write};

use crate::blob::{Layout, comments};
use crate::cancel::CancelToken;
use crate::config::CHUNK_SIZE;
use crate::crypto::{BlobCipher, COMMENTS_COUNTER, FIRST_PAYLOAD_COUNTER, MacState, Tag};
use crate::error::CoreError;
use crate::file;
use crate::kdf::{Salts, SubKeys};
use crate::rng;
use crate::ui::progress::ProgressBar;

/// Per-encode options.
pub struct EncodeOptions<'a> {
    /// Comment to embed in the 512-byte padded region.
    pub comment: &'a str,

    /// Write 64 uniform random bytes in the tag slot instead of the real
    /// tag. The blob will never verify; that is the point.
    pub fake_mac: bool,

    /// Maximum padding as a percentage of the final blob size.
    pub pad_pct: u8,
}

/// What an encode produced
pub struct EncodeOutcome {
    /// Total bytes written, fixed overhead and padding included.
    pub blob_size: u64,

    /// The comment exceeded the region and was cut; the caller should warn
    /// the user at encode time, because decoding will silently return the
    /// truncated text.
    pub comment_truncated: bool,
}

/// Encrypts `payload_len` bytes from `payload` into a cryptoblob on
/// `output`
///
/// # Arguments
///
/// * `payload` - The plaintext source, read in 128 KiB chunks
/// * `payload_len` - Exact number of payload bytes; part of the size plan
/// * `output` - The writer, positioned at the blob start (offset 0 of a
///   fresh file, or a chosen offset inside a container)
/// * `salts` - Freshly generated salts for this blob
/// * `keys` - The derived sub-keys
/// * `opts` - Comment, fake-MAC election, padding percentage
/// * `cancel` - Checked between chunks
/// * `progress` - Optional byte-counting bar, advanced per payload chunk
///
/// # Returns
///
/// The blob size written and whether the comment was truncated
///
/// # Errors
///
/// [`CoreError::BadInput`] for a payload beyond the nonce-counter bound
/// (checked before any output is written), [`CoreError::Cancelled`] between
/// chunks, [`CoreError::Io`] from either handle. A short payload read fails
/// the encode; the payload length is part of the plan.
///
/// # Security Notes
///
/// - fsync is the caller's responsibility, as is deleting the output on
///   error; the encoder only flushes
/// - In fake-MAC mode the tag slot holds CSPRNG bytes indistinguishable
///   from a real tag; nothing else about the blob changes
pub fn encode<R: Read, W: Write>(
    payload: &mut R,
    payload_len: u64,
    output: &mut W,
    salts: &Salts,
    keys: &SubKeys,
    opts: &EncodeOptions<'_>,
    cancel: &CancelToken,
    progress: Option<&ProgressBar>,
) -> Result<EncodeOutcome, CoreError> {
    let layout = Layout::for_payload(keys, payload_len, opts.pad_pct)?;
    tracing::debug!(
        payload_len,
        pad_head = layout.pad_head,
        pad_tail = layout.pad_tail,
        blob_size = layout.blob_size(),
        "encode layout"
    );

    let head_block = salts.head_block();
    let tail_block = salts.tail_block();

    let mut mac = MacState::new(&keys.mac_key);
    mac.update(&head_block);
    mac.update(&tail_block);

    let cipher = BlobCipher::new(&keys.enc_key);

    // Salt head, then the head pad.
    output.write_all(&head_block)?;
    file::write_random_bytes(output, layout.pad_head, cancel, None)?;

    // Comments segment, counter 1.
    let packed = comments::pack(opts.comment);
    let mut region = packed.region;
    cipher.apply_segment(COMMENTS_COUNTER, &mut region);
    mac.update(&region);
    output.write_all(&region)?;

    // Payload chunks, counter 2 + i.
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut remaining = payload_len;
    let mut counter = FIRST_PAYLOAD_COUNTER;
    while remaining > 0 {
        cancel.check()?;
        let n = remaining.min(CHUNK_SIZE as u64) as usize;
        payload.read_exact(&mut buffer[..n])?;
        cipher.apply_segment(counter, &mut buffer[..n]);
        mac.update(&buffer[..n]);
        output.write_all(&buffer[..n])?;
        if let Some(bar) = progress {
            bar.add(n as u64);
        }
        remaining -= n as u64;
        counter += 1;
    }

    // The tag slot: real tag, or uniform noise on request.
    let tag: Tag = if opts.fake_mac { rng::random_array() } else { mac.finalize() };
    output.write_all(&tag)?;

    // Tail pad, then the salt tail.
    file::write_random_bytes(output, layout.pad_tail, cancel, None)?;
    output.write_all(&tail_block)?;
    output.flush()?;

    Ok(EncodeOutcome { blob_size: layout.blob_size(), comment_truncated: packed.truncated })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::blob::testkeys;
    use crate::config::{BLOB_SALT_SIZE, MIN_BLOB_SIZE};

    fn encode_to_vec(payload: &[u8], opts: &EncodeOptions<'_>, salts: &Salts, keys: &SubKeys) -> Vec<u8> {
        let mut output = Vec::new();
        encode(
            &mut Cursor::new(payload),
            payload.len() as u64,
            &mut output,
            salts,
            keys,
            opts,
            &CancelToken::new(),
            None,
        )
        .unwrap();
        output
    }

    fn opts() -> EncodeOptions<'static> {
        EncodeOptions { comment: "", fake_mac: false, pad_pct: 20 }
    }

    #[test]
    fn test_blob_size_matches_layout() {
        let keys = testkeys::subkeys(1);
        let salts = Salts::generate();
        let payload = vec![0u8; 10_000];
        let blob = encode_to_vec(&payload, &opts(), &salts, &keys);
        let layout = Layout::for_payload(&keys, 10_000, 20).unwrap();
        assert_eq!(blob.len() as u64, layout.blob_size());
    }

    #[test]
    fn test_salts_land_at_both_ends() {
        let keys = testkeys::subkeys(2);
        let salts = Salts::generate();
        let blob = encode_to_vec(b"payload", &opts(), &salts, &keys);
        assert_eq!(&blob[..BLOB_SALT_SIZE], &salts.head_block());
        assert_eq!(&blob[blob.len() - BLOB_SALT_SIZE..], &salts.tail_block());
    }

    #[test]
    fn test_empty_payload_empty_comment() {
        let keys = testkeys::subkeys(3);
        let salts = Salts::generate();
        let blob = encode_to_vec(b"", &opts(), &salts, &keys);
        // Scenario floor: 608 plus at most 25% of 512 bytes of padding.
        assert!((MIN_BLOB_SIZE..=MIN_BLOB_SIZE + 128).contains(&(blob.len() as u64)));
    }

    #[test]
    fn test_same_inputs_same_salts_identical_blob_sizes() {
        // Payload bytes differ under the keystream, but the size plan is a
        // pure function of keys and payload length.
        let keys = testkeys::subkeys(4);
        let salts = Salts::generate();
        let a = encode_to_vec(&vec![1u8; 5000], &opts(), &salts, &keys);
        let b = encode_to_vec(&vec![2u8; 5000], &opts(), &salts, &keys);
        assert_eq!(a.len(), b.len());
    }

    #[test]
    fn test_blob_bytes_look_uniform() {
        // Monobit check over a whole blob: salts and pads are CSPRNG
        // output, the rest is keystream and a keyed tag. Five-sigma bound.
        let keys = testkeys::subkeys(7);
        let salts = Salts::generate();
        let blob = encode_to_vec(&vec![0u8; 100_000], &opts(), &salts, &keys);

        let ones: u64 = blob.iter().map(|b| u64::from(b.count_ones())).sum();
        let bits = blob.len() as f64 * 8.0;
        let deviation = (ones as f64 - bits / 2.0).abs() / (bits / 4.0).sqrt();
        assert!(deviation < 5.0, "bit balance deviates {deviation} sigma");
    }

    #[test]
    fn test_short_payload_read_fails() {
        let keys = testkeys::subkeys(5);
        let salts = Salts::generate();
        let mut output = Vec::new();
        let result = encode(
            &mut Cursor::new(b"short"),
            1000,
            &mut output,
            &salts,
            &keys,
            &opts(),
            &CancelToken::new(),
            None,
        );
        assert!(matches!(result, Err(CoreError::Io(_))));
    }

    #[test]
    fn test_cancellation_stops_encode() {
        let keys = testkeys::subkeys(6);
        let salts = Salts::generate();
        let token = CancelToken::new();
        token.cancel();
        let mut output = Vec::new();
        let result = encode(
            &mut Cursor::new(&vec![0u8; 1_000_000]),
            1_000_000,
            &mut output,
            &salts,
            &keys,
            &opts(),
            &token,
            None,
        );
        assert!(matches!(result, Err(CoreError::Cancelled)));
    }
}
