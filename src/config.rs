//! Application configuration and cryptoblob format constants.
//!
//! This module defines the core constants used throughout the application,
//! including:
//! - The on-disk cryptoblob layout (salt, comments, MAC sizes)
//! - The Argon2id derivation profile and sub-key partition
//! - Streaming I/O parameters (chunk size)
//! - Domain-separation strings for the keyed hashes
//!
//! These constants are the file format. Changing any of them produces blobs
//! that existing keys can no longer open, so they are fixed for the life of
//! the format.

/// The application name used in user-facing output and prompts.
pub const APP_NAME: &str = "PurBox";

/// Size of one salt half stored at each end of the blob, in bytes.
///
/// Two independent 128-bit salts (`salt_ph`, `salt_kdf`) are each split into
/// two 8-byte halves. The head halves of both salts form the first 16 bytes
/// of the blob; the tail halves form the last 16 bytes.
pub const SALT_HALF_SIZE: usize = 8;

/// Size of one full salt (`salt_ph` or `salt_kdf`) in bytes.
pub const SALT_SIZE: usize = 16;

/// Size of the salt block stored at each end of the blob, in bytes.
///
/// `salt_head = salt_ph[0..8] || salt_kdf[0..8]`,
/// `salt_tail = salt_ph[8..16] || salt_kdf[8..16]`.
pub const BLOB_SALT_SIZE: usize = 2 * SALT_HALF_SIZE;

/// Size of the padded-comments region, in bytes.
///
/// The region is always exactly this long on the wire, regardless of the
/// actual comment length, so the blob leaks nothing about it.
pub const COMMENTS_SIZE: usize = 512;

/// Sentinel byte separating the UTF-8 comment from its random fill.
///
/// `0xFF` never occurs in valid UTF-8, so splitting at its first occurrence
/// recovers the comment exactly.
pub const COMMENTS_SENTINEL: u8 = 0xFF;

/// Size of the BLAKE2b-512 authentication tag, in bytes.
pub const MAC_SIZE: usize = 64;

/// Minimum possible cryptoblob size, in bytes.
///
/// Two 16-byte salt blocks, the 512-byte comments region, and the 64-byte
/// tag, with an empty payload and zero padding.
pub const MIN_BLOB_SIZE: u64 = (2 * BLOB_SALT_SIZE + COMMENTS_SIZE + MAC_SIZE) as u64;

/// Size of data chunks for all streaming I/O, in bytes (128 KiB).
///
/// Payload encryption advances the nonce counter once per chunk, so this
/// value is part of the format, not a tuning knob.
pub const CHUNK_SIZE: usize = 128 * 1024;

/// Argon2id memory cost in KiB (1 GiB).
///
/// Fixed for the life of the format; there is no memory-cost agility and no
/// fallback to a smaller parameter when allocation fails.
pub const ARGON_MEMORY: u32 = 1024 * 1024;

/// Argon2id lane count.
pub const ARGON_LANES: u32 = 1;

/// Default Argon2id time cost (number of passes).
///
/// The time cost is the only user-tunable derivation knob. It is not stored
/// in the blob; the holder must remember it to decrypt.
pub const DEFAULT_TIME_COST: u32 = 4;

/// Length of the Argon2id output tag, in bytes.
///
/// Partitioned into `pad_key_t || pad_key_s || nonce_key || enc_key ||
/// mac_key` in that order.
pub const ARGON_TAG_SIZE: usize = 128;

/// Size of each pad sub-key (`pad_key_t`, `pad_key_s`), in bytes.
pub const PAD_KEY_SIZE: usize = 10;

/// Size of the reserved nonce sub-key, in bytes.
pub const NONCE_KEY_SIZE: usize = 12;

/// Size of the ChaCha20 encryption key, in bytes.
pub const ENC_KEY_SIZE: usize = 32;

/// Size of the MAC key, in bytes.
pub const MAC_KEY_SIZE: usize = 64;

/// Size of the ChaCha20 nonce, in bytes.
pub const NONCE_SIZE: usize = 12;

/// Exclusive upper bound on the per-blob nonce counter.
///
/// The counter starts at 1 (comments) and increments once per 128 KiB
/// payload chunk. Payloads that would push it to 2^32 are rejected before
/// any output is written.
pub const MAX_NONCE_COUNTER: u64 = 1 << 32;

/// Size of an IKM digest, in bytes.
pub const IKM_DIGEST_SIZE: usize = 64;

/// Maximum passphrase length after NFC normalization and UTF-8 encoding.
pub const PASSPHRASE_MAX_BYTES: usize = 2048;

/// Default maximum padding, as a percentage of the final blob size.
///
/// 20% of the output is equivalent to up to 25% of the unpadded size.
pub const DEFAULT_PAD_PCT: u8 = 20;

/// Upper bound on the configurable padding percentage.
pub const MAX_PAD_PCT: u8 = 95;

/// Personalization for passphrase IKM digests.
pub const PERSONAL_PASSPHRASE: &[u8] = b"purbox/passphras";

/// Personalization for keyfile IKM digests.
pub const PERSONAL_KEYFILE: &[u8] = b"purbox/keyfile";

/// Personalization for the Argon2 password pre-hash.
pub const PERSONAL_PREHASH: &[u8] = b"purbox/prehash";

/// Personalization for the authentication tag.
pub const PERSONAL_MAC: &[u8] = b"purbox/mac";
