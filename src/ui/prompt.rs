//! # Interactive Prompts
//!
//! Collects paths, offsets, keying material, and confirmations, and nothing
//! else: every answer lands in a typed request struct consumed by the
//! processor.
//!
//! ## Security Considerations
//!
//! - **Passphrase Input**: Masked entry, never echoed, handed straight
//!   into a `SecretString`
//! - **Confirmation**: Encryption paths require a second entry; a mismatch
//!   discards the attempt and re-prompts, so a typo cannot silently key a
//!   blob
//! - **Destructive Writes**: Container overwrites and range wipes demand
//!   an explicit confirm with a `no` default
//!
//! ## User Experience
//!
//! - Defaults favor the common path (standard tuning, no fake tag)
//! - Declining a confirmation aborts the action, never the process
//! - Ctrl-C inside any prompt surfaces as an error and ends the process
//!   nonzero

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use inquire::{Confirm, CustomType, Password, PasswordDisplayMode, Select, Text};
use secrecy::SecretString;
use strum::IntoEnumIterator;

use crate::config::DEFAULT_TIME_COST;
use crate::ikm::IkmSource;
use crate::session::Tuning;
use crate::types::Action;

/// Presents the 0..9 action menu
///
/// # Errors
///
/// Fails when the terminal is unusable or the user interrupts the prompt.
pub fn select_action() -> Result<Action> {
    let actions: Vec<Action> = Action::iter().collect();
    Select::new("Select action:", actions)
        .prompt()
        .map_err(|e| anyhow!("action selection failed: {e}"))
}

/// Asks for an input path
///
/// # Arguments
///
/// * `message` - The prompt text
///
/// # Errors
///
/// Fails on terminal failure or interruption; existence is validated by
/// the operation, which owns the error message.
pub fn input_path(message: &str) -> Result<PathBuf> {
    let raw = Text::new(message).prompt().map_err(|e| anyhow!("path entry failed: {e}"))?;
    Ok(PathBuf::from(raw.trim()))
}

/// Asks for an output path, confirming overwrite when it already exists
///
/// Re-prompts until the user names a fresh path or accepts the overwrite,
/// so the processor can truncate without asking again.
///
/// # Errors
///
/// Fails on terminal failure or interruption.
pub fn output_path(message: &str) -> Result<PathBuf> {
    loop {
        let path = input_path(message)?;
        if !path.exists() || confirm(&format!("{} exists, overwrite?", path.display()), false)? {
            return Ok(path);
        }
    }
}

/// Asks a yes/no question
///
/// # Arguments
///
/// * `message` - The question
/// * `default` - The answer an empty entry selects; destructive actions
///   pass `false`
///
/// # Errors
///
/// Fails on terminal failure or interruption.
pub fn confirm(message: &str, default: bool) -> Result<bool> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .map_err(|e| anyhow!("confirmation failed: {e}"))
}

/// Asks for a byte offset or size
///
/// # Errors
///
/// Fails on terminal failure or interruption; non-numeric entries are
/// rejected by the prompt itself and re-asked.
pub fn offset(message: &str) -> Result<u64> {
    CustomType::<u64>::new(message)
        .with_error_message("enter a byte count")
        .prompt()
        .map_err(|e| anyhow!("offset entry failed: {e}"))
}

/// Asks for the comment to embed; empty is fine
///
/// # Errors
///
/// Fails on terminal failure or interruption.
pub fn comment() -> Result<String> {
    Text::new("Comment (optional):")
        .prompt()
        .map_err(|e| anyhow!("comment entry failed: {e}"))
}

/// Asks for derivation and padding parameters
///
/// The defaults stand unless the user opts into custom settings; a
/// decryptor must repeat whatever the encryptor chose here, and a wrong
/// value fails like a wrong key.
///
/// # Errors
///
/// Fails on terminal failure or interruption; out-of-range values are
/// rejected with the validation message and re-asked.
pub fn tuning() -> Result<Tuning> {
    if !confirm("Use custom settings (time cost, padding)?", false)? {
        return Ok(Tuning::default());
    }

    loop {
        let time_cost = CustomType::<u32>::new("Argon2 time cost:")
            .with_default(DEFAULT_TIME_COST)
            .with_error_message("enter a pass count")
            .prompt()
            .map_err(|e| anyhow!("time cost entry failed: {e}"))?;
        let pad_pct = CustomType::<u8>::new("Maximum padding percentage:")
            .with_default(crate::config::DEFAULT_PAD_PCT)
            .with_error_message("enter a percentage")
            .prompt()
            .map_err(|e| anyhow!("padding entry failed: {e}"))?;

        match Tuning::new(time_cost, pad_pct) {
            Ok(tuning) => return Ok(tuning),
            Err(e) => eprintln!("{e}"),
        }
    }
}

/// One keying source kind, for the collection menu.
enum SourceKind {
    Passphrase,
    Keyfile,
    KeyDir,
    Done,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Passphrase => "Add passphrase",
            Self::Keyfile => "Add keyfile",
            Self::KeyDir => "Add keyfile directory",
            Self::Done => "Done",
        })
    }
}

/// Collects keying sources until the user is done
///
/// # Arguments
///
/// * `encrypting` - Whether passphrases need the confirmation entry
///
/// # Returns
///
/// The sources in entry order; ordering is erased downstream, so it
/// carries no meaning. Zero sources is allowed; such a blob is keyed by
/// its salts alone. Empty passphrases are silently skipped.
///
/// # Errors
///
/// Fails on terminal failure or interruption.
pub fn collect_ikm(encrypting: bool) -> Result<Vec<IkmSource>> {
    let mut sources = Vec::new();

    loop {
        let kinds = vec![SourceKind::Passphrase, SourceKind::Keyfile, SourceKind::KeyDir, SourceKind::Done];
        let kind = Select::new("Keying material:", kinds)
            .prompt()
            .map_err(|e| anyhow!("keying selection failed: {e}"))?;

        let source = match kind {
            SourceKind::Passphrase => match passphrase(encrypting)? {
                Some(passphrase) => IkmSource::Passphrase(passphrase),
                None => continue,
            },
            SourceKind::Keyfile => IkmSource::Keyfile(input_path("Keyfile path:")?),
            SourceKind::KeyDir => IkmSource::KeyDir(input_path("Keyfile directory path:")?),
            SourceKind::Done => break,
        };
        println!("{} recorded", source.label());
        sources.push(source);
    }

    Ok(sources)
}

/// Asks for a passphrase; `None` when the user entered nothing
///
/// Masked entry; on encryption paths the confirmation re-prompt is handled
/// by the prompt library and a mismatch discards the entry.
fn passphrase(encrypting: bool) -> Result<Option<SecretString>> {
    let mut prompt = Password::new("Passphrase:").with_display_mode(PasswordDisplayMode::Masked);
    if encrypting {
        prompt = prompt
            .with_custom_confirmation_message("Confirm passphrase:")
            .with_custom_confirmation_error_message("Passphrases do not match, entry discarded.");
    } else {
        prompt = prompt.without_confirmation();
    }

    let entered = prompt.prompt().map_err(|e| anyhow!("passphrase entry failed: {e}"))?;
    if entered.is_empty() {
        return Ok(None);
    }
    Ok(Some(SecretString::from(entered)))
}
