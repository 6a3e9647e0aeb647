//! # Operation Orchestration
//!
//! One function per menu action, each taking its typed request plus the
//! session config and cancellation token. The prompt layer builds requests;
//! nothing here reads a terminal.
//!
//! ## Resource Model
//!
//! Each operation opens its own handles, owns them for the duration, and
//! releases them on every exit path; newly created outputs ride an
//! [`OutputGuard`] so errors and cancellation leave nothing behind.
//! Pre-existing containers are the exception: a failure mid-write damages
//! them, and that is reported, not cleaned up.
//!
//! ## Sequencing
//!
//! Everything is strictly sequential: collect IKM digests, derive keys,
//! then a single streaming pass. There is no worker pool, no channels, and
//! no pipelining between I/O and crypto; the format is byte-deterministic
//! given its inputs, and the sequential model keeps it that way.
//!
//! ## Combined Operations
//!
//! Encrypt-and-embed is [`encrypt`] with an offset in the request;
//! extract-and-decrypt is [`decrypt`] with a span. The codec itself never
//! knows whether it is talking to a standalone file or a container.

use std::io::{BufWriter, Seek, SeekFrom};

use anyhow::{Context, Result};

use crate::blob::{DecodeOptions, Decoder, EncodeOptions, Layout, encode};
use crate::cancel::CancelToken;
use crate::container::{self, RangeReceipt};
use crate::crypto;
use crate::error::CoreError;
use crate::file::{self, OutputGuard};
use crate::ikm;
use crate::kdf::{self, Salts};
use crate::randfile;
use crate::session::Session;
use crate::types::{CreateRandomRequest, DecryptRequest, EmbedRequest, EncryptRequest, ExtractRequest, OverwriteRequest};
use crate::ui::progress::ProgressBar;
use crate::wipe;

/// What an encryption wrote and where.
#[derive(Debug)]
pub struct EncryptReport {
    /// Blob start offset (0 for a standalone blob file).
    pub start: u64,

    /// Blob end offset; `end - start` is the blob size.
    pub end: u64,

    /// The comment was cut to the region size.
    pub comment_truncated: bool,
}

/// What a decryption recovered.
#[derive(Debug)]
pub struct DecryptReport {
    pub payload_len: u64,
    pub comment: String,

    /// False only in unsafe-release mode; strict mode fails instead.
    pub verified: bool,
}

/// Encrypts a payload into a cryptoblob: a standalone file, or a span of a
/// container when the request carries an offset
///
/// # Arguments
///
/// * `req` - Payload path, destination, keying sources, comment, tuning,
///   and the fake-MAC election
/// * `cancel` - Checked between chunks and after the derivation
///
/// # Returns
///
/// The span written, `[start, end)`; the caller must record it for
/// embedded blobs, the container has no other index
///
/// # Errors
///
/// Any [`CoreError`] kind. A standalone output file is deleted on error; a
/// damaged container is reported with a warning and left as-is.
pub fn encrypt(req: &EncryptRequest, cancel: &CancelToken) -> Result<EncryptReport> {
    let mut input = file::open_input(&req.input)?;
    let payload_len = file::input_len(&input)?;
    // Reject oversize payloads before the expensive derivation runs.
    crypto::check_payload_len(payload_len)?;

    let salts = Salts::generate();
    let digests = ikm::collect_digests(&req.sources, &salts.pre_hash, cancel)?;

    tracing::info!(time_cost = req.tuning.time_cost, "deriving keys");
    let keys = kdf::derive(digests, &salts, req.tuning.time_cost)?;
    cancel.check()?;

    let opts = EncodeOptions { comment: &req.comment, fake_mac: req.fake_mac, pad_pct: req.tuning.pad_pct };
    let progress = ProgressBar::new(payload_len, "Encrypting")?;

    let (start, outcome) = match req.offset {
        None => {
            let out_file = file::create_output(&req.output)?;
            let guard = OutputGuard::new(&req.output);

            let mut writer = BufWriter::new(&out_file);
            let outcome = encode(&mut input, payload_len, &mut writer, &salts, &keys, &opts, cancel, Some(&progress))?;
            drop(writer);
            file::fsync(&out_file)?;

            guard.commit();
            (0, outcome)
        }
        Some(offset) => {
            // Fit check before the first container byte is touched.
            let layout = Layout::for_payload(&keys, payload_len, opts.pad_pct)?;
            let mut dest = file::open_readwrite(&req.output)?;
            let container_len = file::input_len(&dest)?;
            let end = offset
                .checked_add(layout.blob_size())
                .ok_or_else(|| CoreError::bad_input("blob end offset overflows"))?;
            if end > container_len {
                return Err(CoreError::bad_input(format!(
                    "blob span [{offset}, {end}) does not fit in a {container_len}-byte container"
                ))
                .into());
            }

            dest.seek(SeekFrom::Start(offset))?;
            let result = {
                let mut writer = BufWriter::new(&dest);
                encode(&mut input, payload_len, &mut writer, &salts, &keys, &opts, cancel, Some(&progress))
            };
            let outcome = result.map_err(|e| {
                tracing::warn!("container damaged from offset {offset}; overwrite the span to retire it");
                e
            })?;
            file::fsync(&dest)?;
            (offset, outcome)
        }
    };
    progress.finish();

    if outcome.comment_truncated {
        tracing::warn!("comment exceeded {} bytes and was truncated", crate::config::COMMENTS_SIZE);
    }

    Ok(EncryptReport { start, end: start + outcome.blob_size, comment_truncated: outcome.comment_truncated })
}

/// Decrypts a cryptoblob: a whole blob file, or a `(start, end)` span of a
/// container
///
/// # Arguments
///
/// * `req` - Input, output, optional span, keying sources, tuning
/// * `session` - Carries the unsafe-decrypt election
/// * `cancel` - Checked between chunks and after the derivation
///
/// # Returns
///
/// Payload length, recovered comment, and the verification verdict
///
/// # Errors
///
/// Any [`CoreError`] kind. Strict mode discards the output on any failure,
/// verification included; unsafe-release mode keeps it and reports the
/// failed verdict in the returned report.
pub fn decrypt(req: &DecryptRequest, session: &Session, cancel: &CancelToken) -> Result<DecryptReport> {
    let mut input = file::open_input(&req.input)?;
    let input_len = file::input_len(&input)?;

    let (start, end) = req.span.unwrap_or((0, input_len));
    if start >= end || end > input_len {
        return Err(CoreError::bad_input(format!(
            "span [{start}, {end}) is not inside the {input_len}-byte input"
        ))
        .into());
    }

    let decoder = Decoder::begin(&mut input, start, end)?;
    let digests = ikm::collect_digests(&req.sources, &decoder.salts().pre_hash, cancel)?;

    tracing::info!(time_cost = req.tuning.time_cost, "deriving keys");
    let keys = kdf::derive(digests, decoder.salts(), req.tuning.time_cost)?;
    cancel.check()?;

    // Recover the size plan before creating the output, so a length
    // mismatch leaves no file behind at all.
    let layout = Layout::for_blob(&keys, decoder.blob_size(), req.tuning.pad_pct)?;

    let out_file = file::create_output(&req.output)?;
    let guard = OutputGuard::new(&req.output);
    let progress = ProgressBar::new(layout.payload_len, "Decrypting")?;

    let opts = DecodeOptions { pad_pct: req.tuning.pad_pct, unsafe_release: session.unsafe_decrypt };
    let result = {
        let mut writer = BufWriter::new(&out_file);
        decoder.finish(&mut input, &mut writer, &keys, &opts, cancel, Some(&progress))
    };
    progress.finish();

    let outcome = result?;
    file::fsync(&out_file)?;
    guard.commit();

    if !outcome.verified {
        tracing::warn!("verification FAILED; plaintext released on request");
    }

    Ok(DecryptReport { payload_len: outcome.payload_len, comment: outcome.comment, verified: outcome.verified })
}

/// Embeds a file over a container range
///
/// The blob codec is not involved; a cryptoblob embeds like any other
/// file, which is the point.
///
/// # Errors
///
/// Any [`CoreError`] kind; a failure mid-write leaves the container
/// damaged, which is warned about, not cleaned up.
pub fn embed(req: &EmbedRequest, cancel: &CancelToken) -> Result<RangeReceipt> {
    let len = std::fs::metadata(&req.source).with_context(|| format!("cannot stat {}", req.source.display()))?.len();
    let progress = ProgressBar::new(len, "Embedding")?;

    let result = container::embed(&req.source, &req.container, req.offset, cancel, Some(&progress));
    progress.finish();
    let receipt = result.map_err(|e| {
        tracing::warn!("container damaged from offset {}; overwrite the span to retire it", req.offset);
        e
    })?;
    Ok(receipt)
}

/// Extracts a container range into a new file
///
/// # Errors
///
/// Any [`CoreError`] kind; a partial output is deleted before returning.
pub fn extract(req: &ExtractRequest, cancel: &CancelToken) -> Result<RangeReceipt> {
    let progress = ProgressBar::new(req.end.saturating_sub(req.start), "Extracting")?;
    let result = container::extract(&req.container, req.start, req.end, &req.output, cancel, Some(&progress));
    progress.finish();
    Ok(result?)
}

/// Creates a new file of CSPRNG bytes
///
/// # Errors
///
/// [`CoreError::BadInput`] when the path exists; a partial file left by an
/// error or cancellation is deleted before returning.
pub fn create_random(req: &CreateRandomRequest, cancel: &CancelToken) -> Result<()> {
    let progress = ProgressBar::new(req.size, "Writing random bytes")?;
    let result = randfile::create(&req.path, req.size, cancel, Some(&progress));
    progress.finish();
    Ok(result?)
}

/// Overwrites a range of an existing file or block device with CSPRNG
/// bytes
///
/// # Errors
///
/// Any [`CoreError`] kind; a failure mid-write leaves the range partially
/// overwritten, which is warned about, the target being pre-existing by
/// definition.
pub fn overwrite_random(req: &OverwriteRequest, cancel: &CancelToken) -> Result<()> {
    let progress = ProgressBar::new(req.end.saturating_sub(req.start), "Overwriting")?;
    let result = wipe::overwrite(&req.path, req.start, req.end, cancel, Some(&progress));
    progress.finish();
    result.map_err(|e| {
        if !matches!(e, CoreError::BadInput(_)) {
            tracing::warn!("target range [{}, {}) may be partially overwritten", req.start, req.end);
        }
        e.into()
    })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use secrecy::SecretString;
    use tempfile::tempdir;

    use super::*;
    use crate::ikm::IkmSource;
    use crate::session::Tuning;

    fn cancel() -> CancelToken {
        CancelToken::new()
    }

    #[test]
    fn test_encrypt_missing_input_fails_before_derivation() {
        let dir = tempdir().unwrap();
        let req = EncryptRequest {
            input: Path::new("/no/such/payload").to_path_buf(),
            output: dir.path().join("blob"),
            offset: None,
            sources: Vec::new(),
            comment: String::new(),
            tuning: Tuning::default(),
            fake_mac: false,
        };
        let err = encrypt(&req, &cancel()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::BadInput(_))));
        assert!(!dir.path().join("blob").exists());
    }

    #[test]
    fn test_decrypt_rejects_bad_span() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("container");
        fs::write(&input, vec![0u8; 1000]).unwrap();

        let req = DecryptRequest {
            input: input.clone(),
            output: dir.path().join("out"),
            span: Some((0, 2000)),
            sources: Vec::new(),
            tuning: Tuning::default(),
        };
        let err = decrypt(&req, &Session::default(), &cancel()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::BadInput(_))));
        assert!(!dir.path().join("out").exists());
    }

    #[test]
    fn test_decrypt_undersized_input_is_length_mismatch() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("short");
        fs::write(&input, vec![0u8; 100]).unwrap();

        let req = DecryptRequest {
            input,
            output: dir.path().join("out"),
            span: None,
            sources: Vec::new(),
            tuning: Tuning::default(),
        };
        let err = decrypt(&req, &Session::default(), &cancel()).unwrap_err();
        assert!(matches!(err.downcast_ref::<CoreError>(), Some(CoreError::LengthMismatch)));
    }

    #[test]
    fn test_embed_and_extract() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("s");
        let container = dir.path().join("c");
        let out = dir.path().join("o");
        fs::write(&source, vec![0x7Fu8; 10_000]).unwrap();
        fs::write(&container, vec![0u8; 50_000]).unwrap();

        let embedded = embed(
            &EmbedRequest { source, container: container.clone(), offset: 20_000 },
            &cancel(),
        )
        .unwrap();

        let extracted = extract(
            &ExtractRequest { container, start: embedded.start, end: embedded.end, output: out.clone() },
            &cancel(),
        )
        .unwrap();

        assert_eq!(embedded.checksum, extracted.checksum);
        assert_eq!(fs::read(&out).unwrap(), vec![0x7Fu8; 10_000]);
    }

    #[test]
    fn test_create_and_overwrite_random() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("container");

        create_random(&CreateRandomRequest { path: path.clone(), size: 100_000 }, &cancel()).unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 100_000);

        let before = fs::read(&path).unwrap();
        overwrite_random(&OverwriteRequest { path: path.clone(), start: 10_000, end: 60_000 }, &cancel()).unwrap();
        let after = fs::read(&path).unwrap();
        assert_eq!(before[..10_000], after[..10_000]);
        assert_ne!(before[10_000..60_000], after[10_000..60_000]);
        assert_eq!(before[60_000..], after[60_000..]);
    }

    // Exercises the full pipeline including two Argon2id runs at the fixed
    // 1 GiB memory cost.
    #[test]
    #[ignore = "allocates the full 1 GiB Argon2 arena twice"]
    fn test_encrypt_decrypt_round_trip_with_passphrase() {
        let dir = tempdir().unwrap();
        let payload_path = dir.path().join("payload");
        let blob_path = dir.path().join("blob");
        let restored_path = dir.path().join("restored");

        let mut payload = vec![0u8; 500_000];
        crate::rng::fill(&mut payload);
        fs::write(&payload_path, &payload).unwrap();

        let tuning = Tuning::new(1, 20).unwrap();
        let sources = || vec![IkmSource::Passphrase(SecretString::from("Correct Horse Battery Staple".to_owned()))];

        let report = encrypt(
            &EncryptRequest {
                input: payload_path,
                output: blob_path.clone(),
                offset: None,
                sources: sources(),
                comment: "secret files, zip".to_owned(),
                tuning,
                fake_mac: false,
            },
            &cancel(),
        )
        .unwrap();
        assert_eq!(report.start, 0);
        assert_eq!(fs::metadata(&blob_path).unwrap().len(), report.end);

        let decrypted = decrypt(
            &DecryptRequest {
                input: blob_path,
                output: restored_path.clone(),
                span: None,
                sources: sources(),
                tuning,
            },
            &Session::default(),
            &cancel(),
        )
        .unwrap();

        assert!(decrypted.verified);
        assert_eq!(decrypted.comment, "secret files, zip");
        assert_eq!(fs::read(&restored_path).unwrap(), payload);
    }

    // The time-lock property: a wrong time cost is indistinguishable from a
    // wrong key. Two more 1 GiB derivations.
    #[test]
    #[ignore = "allocates the full 1 GiB Argon2 arena twice"]
    fn test_wrong_time_cost_fails_like_wrong_key() {
        let dir = tempdir().unwrap();
        let payload_path = dir.path().join("payload");
        let blob_path = dir.path().join("blob");
        let out_path = dir.path().join("out");
        fs::write(&payload_path, b"time-locked").unwrap();

        let sources = || vec![IkmSource::Passphrase(SecretString::from("pass".to_owned()))];
        encrypt(
            &EncryptRequest {
                input: payload_path,
                output: blob_path.clone(),
                offset: None,
                sources: sources(),
                comment: String::new(),
                tuning: Tuning::new(2, 20).unwrap(),
                fake_mac: false,
            },
            &cancel(),
        )
        .unwrap();

        let err = decrypt(
            &DecryptRequest {
                input: blob_path,
                output: out_path.clone(),
                span: None,
                sources: sources(),
                tuning: Tuning::new(1, 20).unwrap(),
            },
            &Session::default(),
            &cancel(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<CoreError>(),
            Some(CoreError::MacFail) | Some(CoreError::LengthMismatch)
        ));
        // Strict mode leaves nothing behind.
        assert!(!out_path.exists());
    }
}
