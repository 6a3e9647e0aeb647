//! # The Padded-Comments Region
//!
//! Comments ride inside the authenticated ciphertext in a region that is
//! always exactly 512 bytes, so the blob leaks nothing about their length.
//!
//! ## Plaintext Layout
//!
//! `utf8_comment || 0xFF || uniform_random_fill`, with the comment NFC
//! normalized first. A comment of 512 bytes or more is truncated to the
//! region size with no sentinel; the decoder then treats the entire region
//! as the comment, and the encoder's caller warns the user.
//!
//! ## Sentinel Recovery
//!
//! The comment is recovered by splitting at the first `0xFF` from the
//! start: `0xFF` never occurs in valid UTF-8, so the split is exact for
//! every comment that fit, regardless of what the random fill contains.
//! No sentinel at all means the truncation case, or noise from a blob
//! released despite failed verification.

use unicode_normalization::UnicodeNormalization;

use crate::config::{COMMENTS_SENTINEL, COMMENTS_SIZE};
use crate::rng;

/// A packed comments region ready for encryption.
pub struct PackedComments {
    pub region: [u8; COMMENTS_SIZE],

    /// Whether the comment exceeded the region and was cut. The caller
    /// should warn; decoding will return the truncated text.
    pub truncated: bool,
}

/// Packs a comment: NFC normalization, sentinel, random fill
///
/// # Arguments
///
/// * `comment` - The comment text; empty is fine
///
/// # Returns
///
/// The full 512-byte plaintext region and the truncation flag
#[must_use]
pub fn pack(comment: &str) -> PackedComments {
    let normalized: String = comment.nfc().collect();
    let bytes = normalized.as_bytes();

    let mut region = [0u8; COMMENTS_SIZE];

    if bytes.len() >= COMMENTS_SIZE {
        region.copy_from_slice(&bytes[..COMMENTS_SIZE]);
        return PackedComments { region, truncated: bytes.len() > COMMENTS_SIZE };
    }

    region[..bytes.len()].copy_from_slice(bytes);
    region[bytes.len()] = COMMENTS_SENTINEL;
    rng::fill(&mut region[bytes.len() + 1..]);
    PackedComments { region, truncated: false }
}

/// Recovers the comment from a decrypted region
///
/// # Arguments
///
/// * `region` - The 512 decrypted plaintext bytes
///
/// # Returns
///
/// Everything before the first sentinel; without a sentinel the whole
/// region is the comment (the truncation case, or noise when the blob was
/// decrypted with wrong keys and the caller chose to release anyway).
/// Invalid UTF-8 decodes lossily; the comment is an operator's
/// informational tool, nothing depends on it.
#[must_use]
pub fn unpack(region: &[u8; COMMENTS_SIZE]) -> String {
    let comment = match region.iter().position(|&b| b == COMMENTS_SENTINEL) {
        Some(sentinel) => &region[..sentinel],
        None => &region[..],
    };
    String::from_utf8_lossy(comment).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        for comment in ["", "x", "secret files, zip", "déjà vu — наши файлы", &"a".repeat(511)] {
            let packed = pack(comment);
            assert!(!packed.truncated);
            assert_eq!(unpack(&packed.region), comment);
        }
    }

    #[test]
    fn test_region_is_always_full_size() {
        let packed = pack("short");
        assert_eq!(packed.region.len(), COMMENTS_SIZE);
    }

    #[test]
    fn test_fill_varies_between_packings() {
        // Same comment, different random fill.
        let a = pack("same").region;
        let b = pack("same").region;
        assert_ne!(a, b);
        assert_eq!(unpack(&a), unpack(&b));
    }

    #[test]
    fn test_exact_fit_has_no_sentinel() {
        let comment = "b".repeat(COMMENTS_SIZE);
        let packed = pack(&comment);
        assert!(!packed.truncated);
        assert!(!packed.region.contains(&COMMENTS_SENTINEL));
        assert_eq!(unpack(&packed.region), comment);
    }

    #[test]
    fn test_overlong_comment_is_truncated() {
        let comment = "c".repeat(COMMENTS_SIZE + 100);
        let packed = pack(&comment);
        assert!(packed.truncated);
        assert_eq!(unpack(&packed.region), comment[..COMMENTS_SIZE]);
    }

    #[test]
    fn test_nfc_normalization_applies() {
        let packed = pack("e\u{301}");
        assert_eq!(unpack(&packed.region), "\u{e9}");
    }

    #[test]
    fn test_empty_comment_round_trips() {
        let packed = pack("");
        assert_eq!(packed.region[0], COMMENTS_SENTINEL);
        assert_eq!(unpack(&packed.region), "");
    }
}
