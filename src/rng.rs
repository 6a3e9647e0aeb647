//! # Uniform Random Byte Source
//!
//! All salts, padding, comment fill, fake tags, and bulk container fills
//! come from the operating system's CSPRNG via `rand`.
//!
//! ## Security Notes
//!
//! - The OS generator is the only entropy source; there is no userspace
//!   PRNG state to leak or reseed
//! - Random bytes and keystream output are the only two byte populations a
//!   blob contains, which is what makes a blob indistinguishable from a
//!   random-filled container

use rand::RngExt;

/// Fills a fixed-size array with random bytes
///
/// # Returns
///
/// `N` bytes of CSPRNG output
#[must_use]
pub fn random_array<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes[..]);
    bytes
}

/// Fills a buffer with random bytes
///
/// # Arguments
///
/// * `buf` - Overwritten in full with CSPRNG output
pub fn fill(buf: &mut [u8]) {
    rand::rng().fill(buf);
}
