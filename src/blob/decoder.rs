//! # Blob Parsing
//!
//! Decoding happens in two phases. [`Decoder::begin`] fetches the salt
//! blocks from the two ends of the span (the only seeks in the codec) so
//! the caller can collect IKM and run the derivation against the
//! reconstructed salts. [`Decoder::finish`] then makes one sequential pass
//! over the authenticated region, releasing plaintext as it goes and
//! verifying the tag at the end.
//!
//! ## Why Two Phases
//!
//! IKM digests are salted by the pre-hash salt, which lives split across
//! the blob's two ends. Nothing can be derived, not even keyfile digests,
//! until both ends have been read; the bilateral salt is what makes
//! truncation at either end fatal.
//!
//! ## Size Recovery
//!
//! The decoder knows only `end - start`. The pad algebra's inversion
//! recovers the payload length and pad split from that size under the
//! derived keys; a size no payload maps to is a definite length mismatch,
//! reported before any plaintext is produced.
//!
//! ## Verification Modes
//!
//! In strict mode a verification failure is an error and the caller
//! discards the output; in unsafe-release mode the plaintext is kept and
//! the failure is reported as a warning. Strict is the default; release is
//! a recovery tool for damaged blobs.

use std::io::{Read, Seek, SeekFrom, Write};

use crate::blob::{Layout, comments};
use crate::cancel::CancelToken;
use crate::config::{BLOB_SALT_SIZE, CHUNK_SIZE, COMMENTS_SIZE, MIN_BLOB_SIZE};
use crate::crypto::{BlobCipher, COMMENTS_COUNTER, FIRST_PAYLOAD_COUNTER, MacState, Tag, verify_tag};
use crate::error::CoreError;
use crate::kdf::{Salts, SubKeys};
use crate::ui::progress::ProgressBar;

/// Per-decode options.
pub struct DecodeOptions {
    /// Maximum padding percentage the blob was encoded under.
    pub pad_pct: u8,

    /// Release plaintext even when the tag does not verify.
    pub unsafe_release: bool,
}

/// What a decode produced.
pub struct DecodeOutcome {
    /// Bytes of plaintext written to the output.
    pub payload_len: u64,

    /// The recovered comment.
    pub comment: String,

    /// Whether the tag verified. Always true in strict mode, where failure is an
    /// error there.
    pub verified: bool,
}

/// A decode in progress: span bounds and the reconstructed salts.
pub struct Decoder {
    /// Blob start offset in the input.
    start: u64,

    /// Blob end offset, exclusive.
    end: u64,

    /// Salts reconstructed from the two end blocks.
    salts: Salts,
}

impl Decoder {
    /// Validates the span and fetches the salt blocks from both ends
    ///
    /// # Arguments
    ///
    /// * `input` - The blob file or container
    /// * `start` - Blob start offset (0 for a standalone blob file)
    /// * `end` - Blob end offset (the file size for a standalone blob)
    ///
    /// # Returns
    ///
    /// A decoder holding the span and the reconstructed salts; the caller
    /// collects IKM and derives keys before calling
    /// [`finish`](Self::finish)
    ///
    /// # Errors
    ///
    /// [`CoreError::LengthMismatch`] when the span cannot hold even a
    /// minimum blob; [`CoreError::Io`] on seek or read failure.
    pub fn begin<R: Read + Seek>(input: &mut R, start: u64, end: u64) -> Result<Self, CoreError> {
        if end < start || end - start < MIN_BLOB_SIZE {
            return Err(CoreError::LengthMismatch);
        }

        let mut head = [0u8; BLOB_SALT_SIZE];
        input.seek(SeekFrom::Start(start))?;
        input.read_exact(&mut head)?;

        let mut tail = [0u8; BLOB_SALT_SIZE];
        input.seek(SeekFrom::Start(end - BLOB_SALT_SIZE as u64))?;
        input.read_exact(&mut tail)?;

        Ok(Self { start, end, salts: Salts::from_blocks(&head, &tail) })
    }

    /// The salts every key derivation for this blob must use.
    #[must_use]
    pub fn salts(&self) -> &Salts {
        &self.salts
    }

    /// Size of the span being decoded.
    #[must_use]
    pub fn blob_size(&self) -> u64 {
        self.end - self.start
    }

    /// Runs the sequential pass: skip the head pad, decrypt comments and
    /// payload, verify the tag
    ///
    /// # Arguments
    ///
    /// * `input` - The same handle [`begin`](Self::begin) read from
    /// * `output` - Plaintext destination; receives payload bytes as they
    ///   decrypt
    /// * `keys` - Sub-keys derived from this blob's salts and the session's
    ///   IKM
    /// * `opts` - Padding percentage and the unsafe-release election
    /// * `cancel` - Checked between chunks
    /// * `progress` - Optional byte-counting bar, advanced per payload chunk
    ///
    /// # Returns
    ///
    /// The payload length, the recovered comment, and the verification
    /// verdict
    ///
    /// # Errors
    ///
    /// [`CoreError::LengthMismatch`] when no payload size reproduces the
    /// span under the derived keys; [`CoreError::MacFail`] in strict mode
    /// when the tag does not verify (the caller discards the output);
    /// [`CoreError::Cancelled`] between chunks; [`CoreError::Io`] from
    /// either handle.
    ///
    /// # Security Notes
    ///
    /// - Pad bytes are skipped by seeking, never read, and never
    ///   authenticated
    /// - Plaintext reaches `output` before the tag is checked; strict-mode
    ///   callers must discard the output on error, which the processor's
    ///   output guard does
    /// - The tag comparison is constant-time
    pub fn finish<R: Read + Seek, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
        keys: &SubKeys,
        opts: &DecodeOptions,
        cancel: &CancelToken,
        progress: Option<&ProgressBar>,
    ) -> Result<DecodeOutcome, CoreError> {
        let layout = Layout::for_blob(keys, self.blob_size(), opts.pad_pct)?;
        tracing::debug!(
            payload_len = layout.payload_len,
            pad_head = layout.pad_head,
            pad_tail = layout.pad_tail,
            "decode layout"
        );

        let mut mac = MacState::new(&keys.mac_key);
        mac.update(&self.salts.head_block());
        mac.update(&self.salts.tail_block());

        let cipher = BlobCipher::new(&keys.enc_key);

        // Skip the head pad without reading it; it is not authenticated.
        let body = self.start + BLOB_SALT_SIZE as u64 + layout.pad_head;
        input.seek(SeekFrom::Start(body))?;

        // Comments segment, counter 1.
        let mut region = [0u8; COMMENTS_SIZE];
        input.read_exact(&mut region)?;
        mac.update(&region);
        cipher.apply_segment(COMMENTS_COUNTER, &mut region);
        let comment = comments::unpack(&region);

        // Payload chunks, counter 2 + i.
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut remaining = layout.payload_len;
        let mut counter = FIRST_PAYLOAD_COUNTER;
        while remaining > 0 {
            cancel.check()?;
            let n = remaining.min(CHUNK_SIZE as u64) as usize;
            input.read_exact(&mut buffer[..n])?;
            mac.update(&buffer[..n]);
            cipher.apply_segment(counter, &mut buffer[..n]);
            output.write_all(&buffer[..n])?;
            if let Some(bar) = progress {
                bar.add(n as u64);
            }
            remaining -= n as u64;
            counter += 1;
        }
        output.flush()?;

        let mut stored: Tag = [0u8; 64];
        input.read_exact(&mut stored)?;

        let verified = verify_tag(&mac.finalize(), &stored);
        if !verified && !opts.unsafe_release {
            return Err(CoreError::MacFail);
        }

        Ok(DecodeOutcome { payload_len: layout.payload_len, comment, verified })
    }
}
