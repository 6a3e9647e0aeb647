//! # Key Derivation Schedule
//!
//! The unordered IKM digest multiset is sorted, pre-hashed into an Argon2
//! password under the pre-hash salt, and stretched by Argon2id into a
//! 128-byte tag that is partitioned into the per-blob sub-keys.
//!
//! ## Parameter Choices
//!
//! - **Memory**: 1 GiB, fixed. There is no memory-cost agility; stabilizing
//!   the format matters more than tunability, and allocation failure is a
//!   hard environment error, never a silent downgrade
//! - **Parallelism**: 1 lane; the derivation is meant to be serial
//! - **Time cost**: the only user-tunable knob, and it is not persisted in
//!   the blob. A high setting acts as an offline time-lock: every
//!   decryption attempt, the attacker's included, pays it in full
//! - **Output**: 128 bytes, consumed completely by the sub-key partition
//!
//! ## Security Properties
//!
//! - **Order independence**: Digests are sorted before the pre-hash, so the
//!   same sources entered in any order derive the same keys
//! - **Wrong anything fails alike**: A wrong key, wrong time cost, or wrong
//!   padding percentage all surface as the same MAC failure
//!
//! ## Known Non-Constant-Time Sort
//!
//! The digest sort uses the standard library sort, which is
//! data-dependent. Digests are keyed-hash outputs and the derivation runs
//! locally, so the timing channel is accepted; replacing it with a
//! constant-time sort would change the derived sub-keys and is therefore
//! forbidden.

use argon2::{Algorithm, Argon2, Params, Version};
use blake2b_simd::Params as Blake2bParams;

use crate::config::{
    ARGON_LANES, ARGON_MEMORY, ARGON_TAG_SIZE, ENC_KEY_SIZE, IKM_DIGEST_SIZE, MAC_KEY_SIZE, NONCE_KEY_SIZE, PAD_KEY_SIZE,
    PERSONAL_PREHASH, SALT_HALF_SIZE, SALT_SIZE,
};
use crate::error::CoreError;
use crate::ikm::Digest;
use crate::rng;

/// The two independent 128-bit salts of one blob.
///
/// Each is split into an 8-byte head half and an 8-byte tail half; the head
/// halves of both salts are stored at the blob start, the tail halves at the
/// blob end. A decoder must read both ends before it can derive anything,
/// and truncation at either end is fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salts {
    /// Seeds the IKM digests and the password pre-hash.
    pub pre_hash: [u8; SALT_SIZE],

    /// The Argon2id salt.
    pub kdf: [u8; SALT_SIZE],
}

impl Salts {
    /// Draws two fresh salts from the CSPRNG
    ///
    /// # Returns
    ///
    /// Two independent 128-bit salts; every encode call draws its own
    #[must_use]
    pub fn generate() -> Self {
        Self { pre_hash: rng::random_array(), kdf: rng::random_array() }
    }

    /// The 16-byte block stored at the blob start
    ///
    /// # Returns
    ///
    /// `pre_hash[0..8] || kdf[0..8]`, the first bytes on disk
    #[must_use]
    pub fn head_block(&self) -> [u8; SALT_SIZE] {
        let mut block = [0u8; SALT_SIZE];
        block[..SALT_HALF_SIZE].copy_from_slice(&self.pre_hash[..SALT_HALF_SIZE]);
        block[SALT_HALF_SIZE..].copy_from_slice(&self.kdf[..SALT_HALF_SIZE]);
        block
    }

    /// The 16-byte block stored at the blob end
    ///
    /// # Returns
    ///
    /// `pre_hash[8..16] || kdf[8..16]`, the last bytes on disk
    #[must_use]
    pub fn tail_block(&self) -> [u8; SALT_SIZE] {
        let mut block = [0u8; SALT_SIZE];
        block[..SALT_HALF_SIZE].copy_from_slice(&self.pre_hash[SALT_HALF_SIZE..]);
        block[SALT_HALF_SIZE..].copy_from_slice(&self.kdf[SALT_HALF_SIZE..]);
        block
    }

    /// Reconstructs the salts from the two blocks read off a blob's ends
    ///
    /// # Arguments
    ///
    /// * `head` - The first 16 bytes of the span
    /// * `tail` - The last 16 bytes of the span
    ///
    /// # Returns
    ///
    /// The interleaved salts; inverse of [`head_block`](Self::head_block)
    /// and [`tail_block`](Self::tail_block)
    #[must_use]
    pub fn from_blocks(head: &[u8; SALT_SIZE], tail: &[u8; SALT_SIZE]) -> Self {
        let mut pre_hash = [0u8; SALT_SIZE];
        let mut kdf = [0u8; SALT_SIZE];
        pre_hash[..SALT_HALF_SIZE].copy_from_slice(&head[..SALT_HALF_SIZE]);
        pre_hash[SALT_HALF_SIZE..].copy_from_slice(&tail[..SALT_HALF_SIZE]);
        kdf[..SALT_HALF_SIZE].copy_from_slice(&head[SALT_HALF_SIZE..]);
        kdf[SALT_HALF_SIZE..].copy_from_slice(&tail[SALT_HALF_SIZE..]);
        Self { pre_hash, kdf }
    }
}

/// The 128-byte Argon2id tag, partitioned into the per-blob sub-keys.
///
/// Derived once per operation and dropped with it. `nonce_key` is carved out
/// to keep the partition stable but is reserved; the cipher nonce is a pure
/// counter.
pub struct SubKeys {
    /// Determines the total pad size.
    pub pad_key_t: [u8; PAD_KEY_SIZE],

    /// Determines the head/tail pad split.
    pub pad_key_s: [u8; PAD_KEY_SIZE],

    /// Reserved.
    pub nonce_key: [u8; NONCE_KEY_SIZE],

    /// ChaCha20 encryption key.
    pub enc_key: [u8; ENC_KEY_SIZE],

    /// BLAKE2b MAC key.
    pub mac_key: [u8; MAC_KEY_SIZE],
}

impl SubKeys {
    /// Splits the raw Argon2id tag into the sub-keys, in layout order
    ///
    /// # Arguments
    ///
    /// * `tag` - The 128-byte Argon2id output
    ///
    /// # Returns
    ///
    /// The partition `pad_key_t || pad_key_s || nonce_key || enc_key ||
    /// mac_key`; every tag byte lands in exactly one sub-key
    #[must_use]
    pub fn from_tag(tag: &[u8; ARGON_TAG_SIZE]) -> Self {
        let mut keys = Self {
            pad_key_t: [0u8; PAD_KEY_SIZE],
            pad_key_s: [0u8; PAD_KEY_SIZE],
            nonce_key: [0u8; NONCE_KEY_SIZE],
            enc_key: [0u8; ENC_KEY_SIZE],
            mac_key: [0u8; MAC_KEY_SIZE],
        };
        let mut offset = 0;
        keys.pad_key_t.copy_from_slice(&tag[offset..offset + PAD_KEY_SIZE]);
        offset += PAD_KEY_SIZE;
        keys.pad_key_s.copy_from_slice(&tag[offset..offset + PAD_KEY_SIZE]);
        offset += PAD_KEY_SIZE;
        keys.nonce_key.copy_from_slice(&tag[offset..offset + NONCE_KEY_SIZE]);
        offset += NONCE_KEY_SIZE;
        keys.enc_key.copy_from_slice(&tag[offset..offset + ENC_KEY_SIZE]);
        offset += ENC_KEY_SIZE;
        keys.mac_key.copy_from_slice(&tag[offset..offset + MAC_KEY_SIZE]);
        keys
    }
}

/// Hashes the sorted digest multiset into the Argon2 password.
///
/// With zero digests the password is the hash of the empty string, so a
/// blob can be keyed by nothing at all (its salts alone).
fn prehash_password(digests: &mut [Digest], salt_ph: &[u8; SALT_SIZE]) -> [u8; IKM_DIGEST_SIZE] {
    digests.sort_unstable();

    let mut params = Blake2bParams::new();
    params.hash_length(IKM_DIGEST_SIZE).salt(salt_ph).personal(PERSONAL_PREHASH);

    let mut state = params.to_state();
    for digest in digests.iter() {
        state.update(digest);
    }

    let mut password = [0u8; IKM_DIGEST_SIZE];
    password.copy_from_slice(state.finalize().as_bytes());
    password
}

/// Probes that the fixed Argon2 arena is allocatable.
///
/// The memory cost has no agility; if 1 GiB cannot be had, the operation
/// fails with [`CoreError::Env`] instead of aborting inside the derivation.
fn probe_memory() -> Result<(), CoreError> {
    let mut probe: Vec<u8> = Vec::new();
    probe
        .try_reserve_exact(ARGON_MEMORY as usize * 1024)
        .map_err(|_| CoreError::Env(format!("cannot allocate {ARGON_MEMORY} KiB for key derivation")))
}

/// Runs the full schedule: sort, pre-hash, Argon2id, partition
///
/// # Arguments
///
/// * `digests` - The session's IKM digest multiset, in any order (possibly
///   empty)
/// * `salts` - The blob's salts, fresh on encode and reconstructed from the
///   blob's ends on decode
/// * `time_cost` - Argon2id pass count, `>= 1`
///
/// # Returns
///
/// The per-blob sub-keys
///
/// # Errors
///
/// [`CoreError::BadInput`] for an invalid time cost, [`CoreError::Env`]
/// when the 1 GiB arena cannot be allocated or the derivation itself fails.
///
/// # Security Notes
///
/// - The time cost is the caller's burden to remember; it is not persisted,
///   and a wrong value produces a MAC failure indistinguishable from any
///   other wrong-key failure
/// - Sub-keys live for one operation and are dropped with it; no
///   zeroization is attempted
///
/// # Performance Characteristics
///
/// Runtime is `O(memory x time_cost)` and deliberately long: seconds at the
/// default time cost, up to days for time-locked blobs.
pub fn derive(mut digests: Vec<Digest>, salts: &Salts, time_cost: u32) -> Result<SubKeys, CoreError> {
    if time_cost < 1 {
        return Err(CoreError::bad_input("time cost must be at least 1"));
    }

    let password = prehash_password(&mut digests, &salts.pre_hash);

    probe_memory()?;

    let params = Params::new(ARGON_MEMORY, time_cost, ARGON_LANES, Some(ARGON_TAG_SIZE))
        .map_err(|e| CoreError::bad_input(format!("invalid Argon2 parameters: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut tag = [0u8; ARGON_TAG_SIZE];
    argon2
        .hash_password_into(&password, &salts.kdf, &mut tag)
        .map_err(|e| CoreError::Env(format!("key derivation failed: {e}")))?;

    Ok(SubKeys::from_tag(&tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salt_blocks_round_trip() {
        let salts = Salts::generate();
        let rebuilt = Salts::from_blocks(&salts.head_block(), &salts.tail_block());
        assert_eq!(salts, rebuilt);
    }

    #[test]
    fn test_salt_blocks_interleave_halves() {
        let salts = Salts { pre_hash: [1u8; SALT_SIZE], kdf: [2u8; SALT_SIZE] };
        let head = salts.head_block();
        assert_eq!(&head[..8], &[1u8; 8]);
        assert_eq!(&head[8..], &[2u8; 8]);
    }

    #[test]
    fn test_subkey_partition_order() {
        let mut tag = [0u8; ARGON_TAG_SIZE];
        for (i, byte) in tag.iter_mut().enumerate() {
            *byte = i as u8;
        }
        let keys = SubKeys::from_tag(&tag);
        assert_eq!(keys.pad_key_t[0], 0);
        assert_eq!(keys.pad_key_s[0], 10);
        assert_eq!(keys.nonce_key[0], 20);
        assert_eq!(keys.enc_key[0], 32);
        assert_eq!(keys.mac_key[0], 64);
        assert_eq!(keys.mac_key[63], 127);
    }

    #[test]
    fn test_prehash_is_order_independent() {
        let a = [3u8; IKM_DIGEST_SIZE];
        let b = [9u8; IKM_DIGEST_SIZE];
        let forward = prehash_password(&mut [a, b], &[0u8; SALT_SIZE]);
        let reverse = prehash_password(&mut [b, a], &[0u8; SALT_SIZE]);
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_prehash_empty_multiset() {
        let password = prehash_password(&mut [], &[0u8; SALT_SIZE]);
        assert_ne!(password, [0u8; IKM_DIGEST_SIZE]);
    }

    #[test]
    fn test_derive_rejects_zero_time_cost() {
        let salts = Salts::generate();
        assert!(matches!(derive(Vec::new(), &salts, 0), Err(CoreError::BadInput(_))));
    }

    // Runs Argon2id at the fixed 1 GiB cost; slow, but it is the only test
    // that exercises the real derivation.
    #[test]
    #[ignore = "allocates the full 1 GiB Argon2 arena"]
    fn test_derive_is_deterministic_and_order_independent() {
        let salts = Salts { pre_hash: [5u8; SALT_SIZE], kdf: [6u8; SALT_SIZE] };
        let a = [3u8; IKM_DIGEST_SIZE];
        let b = [9u8; IKM_DIGEST_SIZE];

        let forward = derive(vec![a, b], &salts, 1).unwrap();
        let reverse = derive(vec![b, a], &salts, 1).unwrap();

        assert_eq!(forward.enc_key, reverse.enc_key);
        assert_eq!(forward.mac_key, reverse.mac_key);
        assert_eq!(forward.pad_key_t, reverse.pad_key_t);
        assert_eq!(forward.pad_key_s, reverse.pad_key_s);
    }
}
