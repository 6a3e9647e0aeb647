//! # The Cryptoblob Codec
//!
//! A cryptoblob is, in order:
//!
//! ```text
//! salt_head (16) || head_pad (P_h) || C_comments (512) || C_payload (N)
//!     || MAC (64) || tail_pad (P_t) || salt_tail (16)
//! ```
//!
//! ## Properties
//!
//! - **Uniformity**: Every byte is uniform random or keystream output;
//!   there is no header, no magic, and no visible length hint
//! - **Self-description only under the keys**: The pad sizes are recomputed
//!   from the derived keys on both ends, so only a key holder can even
//!   locate the ciphertext within the blob
//! - **Bilateral salts**: Half of each salt at each end; truncation at
//!   either end is fatal and a decoder must touch both ends first
//! - **Minimum size**: 608 bytes (two 16-byte salt blocks, the 512-byte
//!   comments region, the 64-byte tag, empty payload, zero pad)
//!
//! ## Module Layout
//!
//! [`comments`] packs and recovers the fixed-size comment region,
//! [`encoder`] assembles blobs, [`decoder`] parses them, and [`Layout`]
//! here is the size plan both share.

pub mod comments;
pub mod decoder;
pub mod encoder;

pub use decoder::{DecodeOptions, DecodeOutcome, Decoder};
pub use encoder::{EncodeOptions, EncodeOutcome, encode};

use crate::config::{BLOB_SALT_SIZE, COMMENTS_SIZE, MAC_SIZE, MIN_BLOB_SIZE};
use crate::crypto;
use crate::error::CoreError;
use crate::kdf::SubKeys;
use crate::padalg;

/// Fixed overhead outside the padded ciphertext: two salt blocks and the tag.
const FIXED_OVERHEAD: u64 = (2 * BLOB_SALT_SIZE + MAC_SIZE) as u64;

/// The size plan of one blob: payload length and the bilateral pad split.
///
/// Computed from the payload size at encode time and recovered from the blob
/// size at decode time; the two computations agree exactly or decoding fails
/// with a length mismatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Layout {
    /// Payload length in bytes.
    pub payload_len: u64,

    /// Pad bytes between the head salt block and the comments ciphertext.
    pub pad_head: u64,

    /// Pad bytes between the tag and the tail salt block.
    pub pad_tail: u64,
}

impl Layout {
    /// Plans an encode: derives the pad sizes for a payload
    ///
    /// # Arguments
    ///
    /// * `keys` - The derived sub-keys (only the pad keys are consulted)
    /// * `payload_len` - Payload length in bytes
    /// * `pad_pct` - Maximum padding percentage
    ///
    /// # Returns
    ///
    /// The size plan; [`blob_size`](Self::blob_size) on it is the exact
    /// output size
    ///
    /// # Errors
    ///
    /// [`CoreError::BadInput`] when the payload would exhaust the nonce
    /// counter.
    pub fn for_payload(keys: &SubKeys, payload_len: u64, pad_pct: u8) -> Result<Self, CoreError> {
        crypto::check_payload_len(payload_len)?;

        let unpadded = COMMENTS_SIZE as u64 + payload_len;
        let total = padalg::total_pad(&keys.pad_key_t, unpadded, pad_pct);
        let (pad_head, pad_tail) = padalg::split_pad(&keys.pad_key_s, total);

        Ok(Self { payload_len, pad_head, pad_tail })
    }

    /// Plans a decode: recovers the payload length and pad sizes from the
    /// blob size
    ///
    /// # Arguments
    ///
    /// * `keys` - Sub-keys derived from the blob's salts
    /// * `blob_size` - The span size, `end - start`
    /// * `pad_pct` - Maximum padding percentage the blob was encoded under
    ///
    /// # Returns
    ///
    /// The unique size plan reproducing `blob_size`; it equals the plan the
    /// encoder computed, or decoding would already have failed
    ///
    /// # Errors
    ///
    /// [`CoreError::LengthMismatch`] when the size is below the 608-byte
    /// minimum or no payload length reproduces it under the derived keys.
    pub fn for_blob(keys: &SubKeys, blob_size: u64, pad_pct: u8) -> Result<Self, CoreError> {
        if blob_size < MIN_BLOB_SIZE {
            return Err(CoreError::LengthMismatch);
        }

        let padded = blob_size - FIXED_OVERHEAD;
        let unpadded = padalg::recover_unpadded(&keys.pad_key_t, padded, pad_pct)?;
        let payload_len = unpadded - COMMENTS_SIZE as u64;
        crypto::check_payload_len(payload_len).map_err(|_| CoreError::LengthMismatch)?;

        let total = padded - unpadded;
        let (pad_head, pad_tail) = padalg::split_pad(&keys.pad_key_s, total);

        let layout = Self { payload_len, pad_head, pad_tail };
        debug_assert_eq!(layout.blob_size(), blob_size);
        Ok(layout)
    }

    /// Total on-disk size of the blob this plan describes
    ///
    /// # Returns
    ///
    /// `16 + P_h + 512 + N + 64 + P_t + 16`
    #[must_use]
    pub fn blob_size(&self) -> u64 {
        FIXED_OVERHEAD + COMMENTS_SIZE as u64 + self.payload_len + self.pad_head + self.pad_tail
    }
}
