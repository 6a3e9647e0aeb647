//! # Keyed BLAKE2b-512 Message Authentication
//!
//! This module provides the cryptoblob's authentication tag: a keyed
//! BLAKE2b-512 hash with a domain-separating personalization, streamed over
//! the authenticated region as it is read or written.
//!
//! ## Security Properties
//!
//! - **Authenticity**: Only a holder of the 64-byte MAC sub-key can produce
//!   a valid tag
//! - **Integrity**: Any modification to the authenticated region is detected
//! - **Domain Separation**: The personalization binds tags to this use, so a
//!   tag can never double as a keyfile digest or pre-hash output
//! - **Indistinguishability**: The tag is keyed hash output, uniform to
//!   anyone without the key, exactly like the rest of the blob
//!
//! ## What the Tag Covers
//!
//! `salt_head || salt_tail || ct_comments || ct_payload`, in that order.
//! Padding bytes are deliberately outside the MAC so they can be arbitrary
//! uniform random and so MAC coverage length reveals nothing extra.
//!
//! ## Threat Model
//!
//! Protects against: ciphertext tampering, salt tampering, truncation of
//! either blob end, splicing ciphertext between blobs.

use blake2b_simd::{Params, State};
use subtle::ConstantTimeEq;

use crate::config::{MAC_KEY_SIZE, MAC_SIZE, PERSONAL_MAC};

/// A 64-byte authentication tag.
pub type Tag = [u8; MAC_SIZE];

/// Streaming MAC over the authenticated region
///
/// The encoder and decoder both walk the region once, in on-disk order,
/// feeding each stretch into this state as they go; nothing is buffered for
/// the sake of authentication.
///
/// ## Security Considerations
///
/// - The key is the 64-byte `mac_key` sub-key, used for nothing else
/// - BLAKE2b's keyed mode is a PRF; no HMAC construction is needed
/// - Verification must go through [`verify_tag`] for constant-time
///   comparison; never compare tags with `==`
pub struct MacState {
    /// Incremental BLAKE2b state carrying the key and personalization
    state: State,
}

impl MacState {
    /// Keys a fresh MAC state
    ///
    /// # Arguments
    ///
    /// * `mac_key` - The 64-byte MAC sub-key from the derivation schedule
    ///
    /// # Returns
    ///
    /// A state ready to absorb the authenticated region
    ///
    /// # Security Notes
    ///
    /// - 64 bytes is the maximum key length BLAKE2b accepts, used in full
    /// - The personalization is fixed per format; changing it would orphan
    ///   every existing blob
    #[must_use]
    pub fn new(mac_key: &[u8; MAC_KEY_SIZE]) -> Self {
        let mut params = Params::new();
        params.hash_length(MAC_SIZE).key(mac_key).personal(PERSONAL_MAC);
        Self { state: params.to_state() }
    }

    /// Absorbs the next stretch of the authenticated region
    ///
    /// # Arguments
    ///
    /// * `data` - The next bytes in on-disk order (salt blocks first, then
    ///   ciphertext)
    ///
    /// # Performance
    ///
    /// O(n) in the input length; the state is updated in place with no
    /// allocation.
    pub fn update(&mut self, data: &[u8]) {
        self.state.update(data);
    }

    /// Produces the tag, consuming the state
    ///
    /// # Returns
    ///
    /// The 64-byte tag over everything absorbed so far
    #[must_use]
    pub fn finalize(self) -> Tag {
        let mut tag = [0u8; MAC_SIZE];
        tag.copy_from_slice(self.state.finalize().as_bytes());
        tag
    }
}

/// Constant-time tag comparison
///
/// # Arguments
///
/// * `expected` - The tag computed over the data actually read
/// * `stored` - The tag read from the blob
///
/// # Returns
///
/// `true` when the tags match
///
/// # Security Guarantees
///
/// - All 64 bytes are compared with no early exit
/// - Timing reveals nothing about where a mismatch occurs
#[must_use]
pub fn verify_tag(expected: &Tag, stored: &Tag) -> bool {
    expected.ct_eq(stored).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: [u8; MAC_KEY_SIZE] = [0x11u8; MAC_KEY_SIZE];

    fn tag_of(parts: &[&[u8]]) -> Tag {
        let mut mac = MacState::new(&KEY);
        for part in parts {
            mac.update(part);
        }
        mac.finalize()
    }

    #[test]
    fn test_streaming_matches_one_shot() {
        assert_eq!(tag_of(&[b"ab", b"cd"]), tag_of(&[b"abcd"]));
    }

    #[test]
    fn test_tag_depends_on_key() {
        let a = tag_of(&[b"data"]);
        let mut mac = MacState::new(&[0x22u8; MAC_KEY_SIZE]);
        mac.update(b"data");
        assert_ne!(a, mac.finalize());
    }

    #[test]
    fn test_tag_depends_on_message() {
        assert_ne!(tag_of(&[b"data"]), tag_of(&[b"date"]));
    }

    #[test]
    fn test_verify() {
        let tag = tag_of(&[b"data"]);
        assert!(verify_tag(&tag, &tag));

        let mut flipped = tag;
        flipped[0] ^= 1;
        assert!(!verify_tag(&tag, &flipped));
    }
}
