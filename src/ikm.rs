//! # Input Keying Material Aggregation
//!
//! Every keying source (passphrase, keyfile, or directory of keyfiles)
//! collapses to a 64-byte digest: a salted, personalized BLAKE2b-512 of the
//! source bytes, seeded by the blob's pre-hash salt.
//!
//! ## Properties
//!
//! - **No ordering**: Digests carry no position; the KDF sorts them before
//!   use, so the same sources in any order open the same blob
//! - **Salt binding**: A digest is a pure function of its source bytes and
//!   the pre-hash salt, so keyfile digests cannot be precomputed before the
//!   blob's salts are known
//! - **Domain separation**: Passphrases and keyfiles hash under different
//!   personalizations; identical bytes through the two source kinds never
//!   collide
//!
//! ## Error Policy
//!
//! Acceptance is all-or-nothing. A missing path fails that input; any I/O
//! error inside a directory walk aborts the whole directory with no partial
//! acceptance.
//!
//! ## Streaming
//!
//! Files are hashed in 128 KiB chunks with the cancellation token checked
//! between chunks; only the final digest escapes, never file contents.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use blake2b_simd::Params;
use secrecy::{ExposeSecret, SecretString};
use unicode_normalization::UnicodeNormalization;
use walkdir::WalkDir;

use crate::cancel::CancelToken;
use crate::config::{CHUNK_SIZE, IKM_DIGEST_SIZE, PASSPHRASE_MAX_BYTES, PERSONAL_KEYFILE, PERSONAL_PASSPHRASE, SALT_SIZE};
use crate::error::CoreError;

/// A 64-byte digest of one keying source.
pub type Digest = [u8; IKM_DIGEST_SIZE];

/// One user-supplied keying source.
///
/// Sources are retained (not digested) at collection time because the digest
/// depends on the pre-hash salt, which on decryption is only known after the
/// blob's salt blocks have been read.
pub enum IkmSource {
    /// A passphrase, held masked until digestion.
    Passphrase(SecretString),

    /// A regular file or block device, hashed in full.
    Keyfile(PathBuf),

    /// A directory: every regular file found by recursive walk yields its
    /// own digest. Symlinks are not followed.
    KeyDir(PathBuf),
}

impl IkmSource {
    /// Human-readable label for acceptance messages
    ///
    /// # Returns
    ///
    /// The source kind and, for paths, the path; passphrase contents are
    /// never echoed
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Passphrase(_) => "passphrase".to_owned(),
            Self::Keyfile(path) => format!("keyfile {}", path.display()),
            Self::KeyDir(path) => format!("keyfile directory {}", path.display()),
        }
    }
}

/// Normalizes a passphrase: NFC, UTF-8 encoding, then a hard byte cap
///
/// # Arguments
///
/// * `raw` - The passphrase as entered
///
/// # Returns
///
/// At most 2048 bytes of normalized UTF-8
///
/// # Security Notes
///
/// - NFC normalization means visually identical input from different
///   keyboards derives the same keys
/// - The cap is applied after encoding, so a multi-byte character
///   straddling the boundary is cut mid-sequence; the digest is over raw
///   bytes, so this stays deterministic
#[must_use]
pub fn normalize_passphrase(raw: &str) -> Vec<u8> {
    let normalized: String = raw.nfc().collect();
    let mut bytes = normalized.into_bytes();
    bytes.truncate(PASSPHRASE_MAX_BYTES);
    bytes
}

fn digest_params(salt_ph: &[u8; SALT_SIZE], personal: &[u8]) -> Params {
    let mut params = Params::new();
    params.hash_length(IKM_DIGEST_SIZE).salt(salt_ph).personal(personal);
    params
}

/// Digests a passphrase under the pre-hash salt
///
/// # Arguments
///
/// * `passphrase` - The masked passphrase; exposed only for the duration
///   of the hash
/// * `salt_ph` - The blob's 16-byte pre-hash salt
///
/// # Returns
///
/// The 64-byte digest under the passphrase personalization
#[must_use]
pub fn hash_passphrase(passphrase: &SecretString, salt_ph: &[u8; SALT_SIZE]) -> Digest {
    let bytes = normalize_passphrase(passphrase.expose_secret());
    let hash = digest_params(salt_ph, PERSONAL_PASSPHRASE).hash(&bytes);
    let mut digest = [0u8; IKM_DIGEST_SIZE];
    digest.copy_from_slice(hash.as_bytes());
    digest
}

/// Digests a keyfile by streaming it in 128 KiB chunks
///
/// # Arguments
///
/// * `path` - A regular file or block device
/// * `salt_ph` - The blob's 16-byte pre-hash salt
/// * `cancel` - Checked between chunks
///
/// # Returns
///
/// The 64-byte digest under the keyfile personalization
///
/// # Errors
///
/// [`CoreError::BadInput`] for a missing path, [`CoreError::Io`] for any
/// read failure mid-file, [`CoreError::Cancelled`] on interruption.
pub fn hash_keyfile(path: &Path, salt_ph: &[u8; SALT_SIZE], cancel: &CancelToken) -> Result<Digest, CoreError> {
    let mut file = File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::bad_input(format!("keyfile not found: {}", path.display())),
        _ => CoreError::Io(e),
    })?;

    let mut state = digest_params(salt_ph, PERSONAL_KEYFILE).to_state();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        cancel.check()?;
        let n = file.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        state.update(&buffer[..n]);
    }

    let mut digest = [0u8; IKM_DIGEST_SIZE];
    digest.copy_from_slice(state.finalize().as_bytes());
    Ok(digest)
}

/// Digests every regular file under a directory, one digest per file
///
/// # Arguments
///
/// * `path` - The directory root; symlinks below it are not followed
/// * `salt_ph` - The blob's 16-byte pre-hash salt
/// * `cancel` - Checked between entries and chunks
///
/// # Returns
///
/// One digest per regular file found by the recursive walk. The walk order
/// is irrelevant; digests are sorted downstream.
///
/// # Errors
///
/// [`CoreError::BadInput`] for a missing directory and [`CoreError::Io`]
/// for any failure during the walk or file hashing; the whole directory
/// input is aborted with no partial acceptance.
pub fn hash_tree(path: &Path, salt_ph: &[u8; SALT_SIZE], cancel: &CancelToken) -> Result<Vec<Digest>, CoreError> {
    if !path.is_dir() {
        return Err(CoreError::bad_input(format!("keyfile directory not found: {}", path.display())));
    }

    let mut digests = Vec::new();

    for entry in WalkDir::new(path) {
        cancel.check()?;
        let entry = entry.map_err(|e| {
            e.into_io_error().map_or_else(|| CoreError::bad_input("directory walk failed"), CoreError::Io)
        })?;
        if entry.file_type().is_file() {
            digests.push(hash_keyfile(entry.path(), salt_ph, cancel)?);
        }
    }

    Ok(digests)
}

/// Digests all sources into the session's unordered digest multiset
///
/// # Arguments
///
/// * `sources` - The keying sources as collected; a directory source may
///   contribute many digests
/// * `salt_ph` - The blob's 16-byte pre-hash salt
/// * `cancel` - Checked throughout
///
/// # Returns
///
/// The digest multiset, in collection order; ordering is erased by the
/// KDF's sort
///
/// # Errors
///
/// Fails on the first unreadable source; acceptance is all-or-nothing.
pub fn collect_digests(sources: &[IkmSource], salt_ph: &[u8; SALT_SIZE], cancel: &CancelToken) -> Result<Vec<Digest>, CoreError> {
    let mut digests = Vec::with_capacity(sources.len());

    for source in sources {
        match source {
            IkmSource::Passphrase(passphrase) => digests.push(hash_passphrase(passphrase, salt_ph)),
            IkmSource::Keyfile(path) => digests.push(hash_keyfile(path, salt_ph, cancel)?),
            IkmSource::KeyDir(path) => digests.extend(hash_tree(path, salt_ph, cancel)?),
        }
    }

    Ok(digests)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    const SALT: [u8; SALT_SIZE] = [7u8; SALT_SIZE];

    #[test]
    fn test_normalize_caps_length() {
        let long = "a".repeat(PASSPHRASE_MAX_BYTES + 100);
        assert_eq!(normalize_passphrase(&long).len(), PASSPHRASE_MAX_BYTES);
    }

    #[test]
    fn test_normalize_nfc() {
        // U+0065 U+0301 (e + combining acute) normalizes to U+00E9.
        assert_eq!(normalize_passphrase("e\u{301}"), "\u{e9}".as_bytes());
    }

    #[test]
    fn test_passphrase_digest_depends_on_salt() {
        let passphrase = SecretString::from("Correct Horse Battery Staple".to_owned());
        let a = hash_passphrase(&passphrase, &SALT);
        let b = hash_passphrase(&passphrase, &[8u8; SALT_SIZE]);
        assert_ne!(a, b);
    }

    #[test]
    fn test_passphrase_and_keyfile_domains_differ() {
        // Same bytes through both source kinds must not collide.
        let dir = tempdir().unwrap();
        let path = dir.path().join("key");
        std::fs::write(&path, b"secret bytes").unwrap();

        let passphrase = SecretString::from("secret bytes".to_owned());
        let from_passphrase = hash_passphrase(&passphrase, &SALT);
        let from_file = hash_keyfile(&path, &SALT, &CancelToken::new()).unwrap();
        assert_ne!(from_passphrase, from_file);
    }

    #[test]
    fn test_keyfile_digest_streams_large_input() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big");
        let data = vec![0xABu8; CHUNK_SIZE + 1000];
        std::fs::write(&path, &data).unwrap();

        let streamed = hash_keyfile(&path, &SALT, &CancelToken::new()).unwrap();
        let whole = digest_params(&SALT, PERSONAL_KEYFILE).hash(&data);
        assert_eq!(streamed, whole.as_bytes());
    }

    #[test]
    fn test_missing_keyfile_is_bad_input() {
        let result = hash_keyfile(Path::new("/no/such/keyfile"), &SALT, &CancelToken::new());
        assert!(matches!(result, Err(CoreError::BadInput(_))));
    }

    #[test]
    fn test_tree_yields_one_digest_per_file() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        for (name, content) in [("a", b"aaa".as_slice()), ("sub/b", b"bbb"), ("sub/c", b"ccc")] {
            let mut f = File::create(dir.path().join(name)).unwrap();
            f.write_all(content).unwrap();
        }

        let digests = hash_tree(dir.path(), &SALT, &CancelToken::new()).unwrap();
        assert_eq!(digests.len(), 3);
    }

    #[test]
    fn test_collect_is_order_sensitive_only_in_sequence() {
        // collect_digests preserves input order; order independence is the
        // KDF's job and is tested there.
        let p1 = IkmSource::Passphrase(SecretString::from("one".to_owned()));
        let p2 = IkmSource::Passphrase(SecretString::from("two".to_owned()));
        let forward = collect_digests(&[p1, p2], &SALT, &CancelToken::new()).unwrap();

        let p1 = IkmSource::Passphrase(SecretString::from("one".to_owned()));
        let p2 = IkmSource::Passphrase(SecretString::from("two".to_owned()));
        let reverse = collect_digests(&[p2, p1], &SALT, &CancelToken::new()).unwrap();

        assert_eq!(forward.len(), 2);
        assert_eq!(forward[0], reverse[1]);
        assert_eq!(forward[1], reverse[0]);
    }
}
