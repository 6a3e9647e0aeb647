//! # Size and Padding Algebra
//!
//! The total pad size and its head/tail split are pure functions of the two
//! 10-byte pad sub-keys and the unpadded ciphertext size. Encoder and
//! decoder recompute identical values; nothing about the pad is stored in
//! the blob.
//!
//! ## The Algebra
//!
//! With `U` the unpadded size (512-byte comments region plus payload) and
//! `pct` the configured maximum padding percentage:
//!
//! - `max_P = floor(U * pct / (100 - pct))`, so `pct` percent of the final
//!   blob (20% of output = up to 25% of input)
//! - `P = floor(r_t * (max_P + 1) / 2^80)` with `r_t` the 80-bit
//!   little-endian reading of `pad_key_t`; uniform over `[0, max_P]`
//! - `P_h = floor(r_s * (P + 1) / 2^80)` with `r_s` from `pad_key_s`;
//!   `P_t = P - P_h`
//!
//! ## Exactness
//!
//! All arithmetic is exact integer math. The pad keys are read as 80-bit
//! little-endian integers, and `floor(r * m / 2^80)` is evaluated with a
//! nested floor division so the 160-bit intermediate product never
//! materializes. Both endpoints must agree bit for bit; any approximation
//! here would break every blob.
//!
//! ## Inversion
//!
//! `U + P(U)` is strictly increasing in `U`, so the decoder recovers the
//! unpadded size from the blob size by binary search; a size no `U` maps to
//! is definitive proof the span is not a blob under these keys.

use crate::config::{COMMENTS_SIZE, PAD_KEY_SIZE};
use crate::error::CoreError;

/// Reads a pad sub-key as an 80-bit little-endian unsigned integer.
fn le80(key: &[u8; PAD_KEY_SIZE]) -> u128 {
    let mut bytes = [0u8; 16];
    bytes[..PAD_KEY_SIZE].copy_from_slice(key);
    u128::from_le_bytes(bytes)
}

/// Computes `floor(r * m / 2^80)` exactly for `r < 2^80`.
///
/// Splits `r = hi * 2^40 + lo` and uses
/// `floor(x / 2^80) = floor((hi*m + floor(lo*m / 2^40)) / 2^40)`.
fn mul_shift_80(r: u128, m: u64) -> u64 {
    debug_assert!(r < 1u128 << 80);
    let mask = (1u128 << 40) - 1;
    let hi = r >> 40;
    let lo = r & mask;
    let m = u128::from(m);
    let result = (hi * m + ((lo * m) >> 40)) >> 40;
    result as u64
}

/// Maximum total pad for an unpadded size, under a padding percentage
///
/// # Arguments
///
/// * `unpadded` - Comments region plus payload, in bytes
/// * `pct` - Maximum padding as a percentage of the final blob size,
///   `< 100`
///
/// # Returns
///
/// `floor(unpadded * pct / (100 - pct))`: 20% of the output is up to 25%
/// of the input
#[must_use]
pub fn max_pad(unpadded: u64, pct: u8) -> u64 {
    debug_assert!(pct < 100);
    let numerator = u128::from(unpadded) * u128::from(pct);
    (numerator / u128::from(100 - pct)) as u64
}

/// Total pad size for one blob
///
/// # Arguments
///
/// * `pad_key_t` - The total-pad sub-key
/// * `unpadded` - Comments region plus payload, in bytes
/// * `pct` - Maximum padding percentage
///
/// # Returns
///
/// A value uniform over `[0, max_pad]`, fully determined by the inputs;
/// encoder and decoder both call this and must agree exactly
#[must_use]
pub fn total_pad(pad_key_t: &[u8; PAD_KEY_SIZE], unpadded: u64, pct: u8) -> u64 {
    mul_shift_80(le80(pad_key_t), max_pad(unpadded, pct) + 1)
}

/// Splits a total pad into head and tail portions
///
/// # Arguments
///
/// * `pad_key_s` - The pad-split sub-key
/// * `total` - The total pad from [`total_pad`]
///
/// # Returns
///
/// `(head, tail)` with `head + tail == total`; the head portion lands
/// before the ciphertext, the tail after the tag
#[must_use]
pub fn split_pad(pad_key_s: &[u8; PAD_KEY_SIZE], total: u64) -> (u64, u64) {
    let head = mul_shift_80(le80(pad_key_s), total + 1);
    (head, total - head)
}

/// Recovers the unpadded size from `padded = unpadded + total_pad(unpadded)`
///
/// # Arguments
///
/// * `pad_key_t` - The total-pad sub-key the blob was encoded under
/// * `padded` - The blob size minus the 96 bytes of fixed overhead
/// * `pct` - Maximum padding percentage the blob was encoded under
///
/// # Returns
///
/// The unique unpadded size whose padded image is `padded`. The padded
/// size is strictly increasing in the unpadded size, so a binary search
/// over `[512, padded]` finds it when it exists.
///
/// # Errors
///
/// [`CoreError::LengthMismatch`] when no unpadded size reproduces
/// `padded`; the decoder reports the span as not a valid cryptoblob.
///
/// # Performance
///
/// O(log padded) evaluations of the pad function, each constant-time
/// integer arithmetic.
pub fn recover_unpadded(pad_key_t: &[u8; PAD_KEY_SIZE], padded: u64, pct: u8) -> Result<u64, CoreError> {
    let comments = COMMENTS_SIZE as u64;
    if padded < comments {
        return Err(CoreError::LengthMismatch);
    }

    let mut lo = comments;
    let mut hi = padded;
    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        let candidate = mid + total_pad(pad_key_t, mid, pct);
        match candidate.cmp(&padded) {
            std::cmp::Ordering::Equal => return Ok(mid),
            std::cmp::Ordering::Less => lo = mid + 1,
            std::cmp::Ordering::Greater => hi = mid - 1,
        }
    }

    Err(CoreError::LengthMismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(fill: u8) -> [u8; PAD_KEY_SIZE] {
        [fill; PAD_KEY_SIZE]
    }

    #[test]
    fn test_le80_is_little_endian() {
        let mut k = [0u8; PAD_KEY_SIZE];
        k[0] = 1;
        assert_eq!(le80(&k), 1);
        k[0] = 0;
        k[9] = 1;
        assert_eq!(le80(&k), 1 << 72);
    }

    #[test]
    fn test_mul_shift_80_bounds() {
        let max_r = (1u128 << 80) - 1;
        // floor((2^80 - 1) * m / 2^80) == m - 1 for any m >= 1.
        assert_eq!(mul_shift_80(max_r, 1), 0);
        assert_eq!(mul_shift_80(max_r, 1000), 999);
        assert_eq!(mul_shift_80(max_r, u64::MAX), u64::MAX - 1);
        assert_eq!(mul_shift_80(0, u64::MAX), 0);
    }

    #[test]
    fn test_mul_shift_80_against_wide_reference() {
        // Cross-check the nested floor division against full-width
        // arithmetic on values small enough for u128.
        for r in [0u128, 1, 12345, (1 << 60) - 7, (1 << 64) + 99] {
            for m in [1u64, 2, 512, 1_000_003] {
                let exact = (r * u128::from(m)) >> 80;
                assert_eq!(mul_shift_80(r, m), exact as u64, "r={r} m={m}");
            }
        }
    }

    #[test]
    fn test_max_pad_default_percentage() {
        // 20% of output = 25% of input.
        assert_eq!(max_pad(1000, 20), 250);
        assert_eq!(max_pad(512, 20), 128);
        assert_eq!(max_pad(0, 20), 0);
        assert_eq!(max_pad(1000, 0), 0);
    }

    #[test]
    fn test_total_pad_within_envelope() {
        for fill in [0u8, 1, 0x55, 0xAA, 0xFF] {
            let pad = total_pad(&key(fill), 1_000_000, 20);
            assert!(pad <= max_pad(1_000_000, 20));
        }
    }

    #[test]
    fn test_split_pad_sums() {
        for fill in [0u8, 1, 0x55, 0xAA, 0xFF] {
            let (head, tail) = split_pad(&key(fill), 777);
            assert_eq!(head + tail, 777);
        }
        assert_eq!(split_pad(&key(0xAA), 0), (0, 0));
    }

    #[test]
    fn test_padded_size_is_strictly_increasing() {
        let k = key(0xC3);
        let mut previous = 0;
        for unpadded in 512..2048u64 {
            let padded = unpadded + total_pad(&k, unpadded, 20);
            assert!(padded > previous || unpadded == 512);
            previous = padded;
        }
    }

    #[test]
    fn test_recover_unpadded_round_trips() {
        for fill in [0u8, 1, 0x55, 0xAA, 0xFF] {
            let k = key(fill);
            for unpadded in [512u64, 513, 1000, 131_584, 1_000_512] {
                let padded = unpadded + total_pad(&k, unpadded, 20);
                assert_eq!(recover_unpadded(&k, padded, 20).unwrap(), unpadded, "fill={fill:#x} unpadded={unpadded}");
            }
        }
    }

    #[test]
    fn test_recover_unpadded_rejects_gaps() {
        // A padded size that no unpadded size maps to must be rejected.
        // With an all-ones pad key the pad is exactly max_pad, so the map is
        // U + floor(U/4) and skips one value whenever max_pad increments.
        let k = key(0xFF);
        let unpadded = 10_003u64;
        let padded = unpadded + total_pad(&k, unpadded, 20);
        let next = (unpadded + 1) + total_pad(&k, unpadded + 1, 20);
        assert_eq!(next, padded + 2);
        assert!(matches!(recover_unpadded(&k, padded + 1, 20), Err(CoreError::LengthMismatch)));
    }

    #[test]
    fn test_recover_unpadded_rejects_undersize() {
        assert!(matches!(recover_unpadded(&key(0), 511, 20), Err(CoreError::LengthMismatch)));
    }

    #[test]
    fn test_zero_percentage_is_identity() {
        let k = key(0xFF);
        assert_eq!(total_pad(&k, 4096, 0), 0);
        assert_eq!(recover_unpadded(&k, 4096, 0).unwrap(), 4096);
    }
}
