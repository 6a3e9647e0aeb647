//! # Common Type Definitions
//!
//! The menu is a tagged enum of actions; each operation the core exposes
//! takes a typed request struct assembled by the prompt layer. The prompt
//! layer is a thin translator; nothing in the core reads from a terminal.
//!
//! ## Overview
//!
//! - [`Action`]: the ten menu entries, in menu order
//! - [`EncryptRequest`] / [`DecryptRequest`]: codec operations, covering
//!   the standalone and in-container variants through an optional
//!   offset/span
//! - [`EmbedRequest`] / [`ExtractRequest`]: raw range copies
//! - [`CreateRandomRequest`] / [`OverwriteRequest`]: container preparation

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

use strum::EnumIter;

use crate::ikm::IkmSource;
use crate::session::Tuning;

/// The menu actions, in menu order (0..9).
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumIter)]
pub enum Action {
    Exit,
    Info,
    Encrypt,
    Decrypt,
    Embed,
    Extract,
    EncryptEmbed,
    ExtractDecrypt,
    CreateRandom,
    OverwriteRandom,
}

impl Action {
    /// The numeric menu code
    ///
    /// # Returns
    ///
    /// The action's position in declaration order, 0 through 9; the codes
    /// are a stable user-facing contract
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable label for the menu
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Exit => "Exit",
            Self::Info => "Info",
            Self::Encrypt => "Encrypt file to cryptoblob",
            Self::Decrypt => "Decrypt cryptoblob",
            Self::Embed => "Embed file in container",
            Self::Extract => "Extract range from container",
            Self::EncryptEmbed => "Encrypt and embed in container",
            Self::ExtractDecrypt => "Extract and decrypt from container",
            Self::CreateRandom => "Create random-filled file",
            Self::OverwriteRandom => "Overwrite range with random bytes",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} - {}", self.code(), self.label())
    }
}

/// Parameters of an encryption, either to a fresh file or into a container.
pub struct EncryptRequest {
    /// Payload file or block device.
    pub input: PathBuf,

    /// Output file, or the container when `offset` is set.
    pub output: PathBuf,

    /// Blob start inside a container; `None` writes a standalone blob file.
    pub offset: Option<u64>,

    /// Keying sources, in the order the user supplied them.
    pub sources: Vec<IkmSource>,

    /// Comment for the padded region.
    pub comment: String,

    pub tuning: Tuning,

    /// Write uniform noise in the tag slot.
    pub fake_mac: bool,
}

/// Parameters of a decryption, from a blob file or a container span.
pub struct DecryptRequest {
    /// Blob file, or the container when `span` is set.
    pub input: PathBuf,

    /// Plaintext output file.
    pub output: PathBuf,

    /// `(start, end)` of the blob inside a container; `None` decodes the
    /// whole input file.
    pub span: Option<(u64, u64)>,

    pub sources: Vec<IkmSource>,

    pub tuning: Tuning,
}

/// Parameters of a raw embed.
pub struct EmbedRequest {
    pub source: PathBuf,
    pub container: PathBuf,
    pub offset: u64,
}

/// Parameters of a raw extraction.
pub struct ExtractRequest {
    pub container: PathBuf,
    pub start: u64,
    pub end: u64,
    pub output: PathBuf,
}

/// Parameters of random-file creation.
pub struct CreateRandomRequest {
    pub path: PathBuf,
    pub size: u64,
}

/// Parameters of a random range overwrite.
pub struct OverwriteRequest {
    pub path: PathBuf,
    pub start: u64,
    pub end: u64,
}
