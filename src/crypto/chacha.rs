//! # ChaCha20 Segment Cipher
//!
//! This module drives ChaCha20 over the chunked counter-nonce framing that
//! defines the cryptoblob's ciphertext layout.
//!
//! ## Framing
//!
//! One keystream per segment: the nonce is the 12-byte little-endian
//! encoding of a counter that is 1 for the comments segment and `2 + i` for
//! payload chunk `i` (chunks are 128 KiB, the last may be short). Every
//! segment starts its keystream at block 0, so encryption and decryption
//! are the same operation applied in the same order.
//!
//! ## Security Properties
//!
//! - **Nonce uniqueness**: The counter is strictly increasing within a
//!   blob, and each blob has a fresh Argon2id-derived key, so a (key,
//!   nonce) pair is never reused
//! - **Counter bound**: The counter never reaches 2^32; payloads that would
//!   get there (about 512 TiB) are rejected before any output exists
//! - **No authentication here**: Integrity lives in the keyed BLAKE2b tag;
//!   this module is purely the keystream

use chacha20::ChaCha20;
use chacha20::cipher::{KeyIvInit, StreamCipher};

use crate::config::{CHUNK_SIZE, ENC_KEY_SIZE, MAX_NONCE_COUNTER, NONCE_SIZE};
use crate::error::CoreError;

/// Nonce counter of the comments segment.
pub const COMMENTS_COUNTER: u64 = 1;

/// Nonce counter of payload chunk 0.
pub const FIRST_PAYLOAD_COUNTER: u64 = 2;

/// Number of 128 KiB chunks a payload of `len` bytes occupies
///
/// # Arguments
///
/// * `len` - Payload length in bytes
///
/// # Returns
///
/// The chunk count; zero for an empty payload
#[must_use]
pub fn payload_chunk_count(len: u64) -> u64 {
    len.div_ceil(CHUNK_SIZE as u64)
}

/// Validates a payload length against the nonce-counter bound
///
/// # Arguments
///
/// * `len` - Payload length in bytes
///
/// # Errors
///
/// Returns [`CoreError::BadInput`] when the payload would need more than
/// 2^32 − 2 chunks (≈ 512 TiB). Callers check this before writing any
/// output, so the failure never leaves a partial blob behind.
pub fn check_payload_len(len: u64) -> Result<(), CoreError> {
    let last_counter = FIRST_PAYLOAD_COUNTER + payload_chunk_count(len).saturating_sub(1);
    if last_counter >= MAX_NONCE_COUNTER {
        return Err(CoreError::bad_input(format!("payload of {len} bytes would exhaust the nonce counter")));
    }
    Ok(())
}

/// The per-blob ChaCha20 cipher
///
/// Stateless between segments; each call keys a fresh keystream under the
/// segment's counter nonce.
///
/// ## Security Considerations
///
/// - The 32-byte key is the `enc_key` sub-key, derived once per blob
/// - Applying the same segment twice restores the plaintext (XOR
///   keystream); the codec relies on this symmetry for decryption
pub struct BlobCipher {
    /// The 256-bit encryption sub-key
    key: [u8; ENC_KEY_SIZE],
}

impl BlobCipher {
    /// Creates a cipher from the encryption sub-key
    ///
    /// # Arguments
    ///
    /// * `enc_key` - The 32-byte `enc_key` sub-key
    #[must_use]
    pub fn new(enc_key: &[u8; ENC_KEY_SIZE]) -> Self {
        Self { key: *enc_key }
    }

    /// Applies the keystream of one segment in place
    ///
    /// # Arguments
    ///
    /// * `counter` - The segment's nonce counter (1 for comments, `2 + i`
    ///   for payload chunk `i`)
    /// * `buf` - The segment bytes, transformed in place
    ///
    /// # Performance
    ///
    /// O(n) in the segment length; the keystream is generated block by
    /// block with no allocation.
    ///
    /// The counter bound is enforced when sizes are validated; by the time a
    /// segment is processed it must hold.
    pub fn apply_segment(&self, counter: u64, buf: &mut [u8]) {
        debug_assert!(counter >= 1 && counter < MAX_NONCE_COUNTER);

        let mut nonce = [0u8; NONCE_SIZE];
        nonce[..8].copy_from_slice(&counter.to_le_bytes());

        let mut cipher = ChaCha20::new(&self.key.into(), &nonce.into());
        cipher.apply_keystream(buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_count() {
        assert_eq!(payload_chunk_count(0), 0);
        assert_eq!(payload_chunk_count(1), 1);
        assert_eq!(payload_chunk_count(CHUNK_SIZE as u64), 1);
        assert_eq!(payload_chunk_count(CHUNK_SIZE as u64 + 1), 2);
    }

    #[test]
    fn test_payload_len_bound() {
        assert!(check_payload_len(0).is_ok());
        assert!(check_payload_len(1_000_000).is_ok());

        // (2^32 - 2) chunks is the last admissible count.
        let max_ok = (MAX_NONCE_COUNTER - 2) * CHUNK_SIZE as u64;
        assert!(check_payload_len(max_ok).is_ok());
        assert!(matches!(check_payload_len(max_ok + 1), Err(CoreError::BadInput(_))));
    }

    #[test]
    fn test_apply_is_involutive() {
        let cipher = BlobCipher::new(&[0x42u8; ENC_KEY_SIZE]);
        let original = b"some payload chunk".to_vec();

        let mut buf = original.clone();
        cipher.apply_segment(COMMENTS_COUNTER, &mut buf);
        assert_ne!(buf, original);

        cipher.apply_segment(COMMENTS_COUNTER, &mut buf);
        assert_eq!(buf, original);
    }

    #[test]
    fn test_segments_use_distinct_keystreams() {
        let cipher = BlobCipher::new(&[0x42u8; ENC_KEY_SIZE]);
        let mut first = vec![0u8; 64];
        let mut second = vec![0u8; 64];
        cipher.apply_segment(COMMENTS_COUNTER, &mut first);
        cipher.apply_segment(FIRST_PAYLOAD_COUNTER, &mut second);
        assert_ne!(first, second);
    }

    #[test]
    fn test_keystream_depends_on_key() {
        let mut a = vec![0u8; 64];
        let mut b = vec![0u8; 64];
        BlobCipher::new(&[1u8; ENC_KEY_SIZE]).apply_segment(1, &mut a);
        BlobCipher::new(&[2u8; ENC_KEY_SIZE]).apply_segment(1, &mut b);
        assert_ne!(a, b);
    }
}
