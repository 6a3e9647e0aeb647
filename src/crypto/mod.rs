//! # Cryptographic Primitives
//!
//! The cipher and MAC halves of the cryptoblob's AEAD composition.
//!
//! ## Architecture
//!
//! The AEAD is deliberately split rather than taken from an off-the-shelf
//! AEAD crate: a ChaCha20 keystream over a counter-nonce framing
//! ([`chacha`]) and a keyed BLAKE2b-512 tag over the authenticated region
//! ([`mac`]). The format demands it, because the tag must cover the salt
//! blocks from both blob ends and skip the pads, a coverage no packaged
//! AEAD expresses.
//!
//! ## Key Separation
//!
//! The cipher uses `enc_key`, the tag `mac_key`; both come from disjoint
//! slices of the Argon2id output and neither is used anywhere else.

pub mod chacha;
pub mod mac;

pub use chacha::{BlobCipher, COMMENTS_COUNTER, FIRST_PAYLOAD_COUNTER, check_payload_len, payload_chunk_count};
pub use mac::{MacState, Tag, verify_tag};
