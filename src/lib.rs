//! PurBox - file encryption into padded uniform random blobs.
//!
//! A cryptoblob carries no header, no magic bytes, and no visible length:
//! every byte is uniform random or keystream output. The pipeline:
//! - Keying material (passphrases, keyfiles, directory trees) collapses to
//!   salted BLAKE2b-512 digests, sorted so input order is irrelevant
//! - Argon2id (1 GiB, 1 lane, tunable time cost) stretches the digest
//!   multiset into the per-blob sub-keys
//! - ChaCha20 encrypts the padded comments and payload; keyed BLAKE2b-512
//!   authenticates the salts and ciphertext
//! - Randomized padding, derived from the keys, lands on both sides of the
//!   ciphertext; the salts are split between the blob's two ends
//!
//! Blobs can be written standalone or embedded at arbitrary offsets inside
//! random-filled containers, where nothing short of the keys and offsets
//! can even locate them.

pub mod allocator;
pub mod app;
pub mod blob;
pub mod cancel;
pub mod config;
pub mod container;
pub mod crypto;
pub mod error;
pub mod file;
pub mod ikm;
pub mod kdf;
pub mod padalg;
pub mod processor;
pub mod randfile;
pub mod rng;
pub mod session;
pub mod types;
pub mod ui;
pub mod wipe;
