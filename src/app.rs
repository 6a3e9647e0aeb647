//! # Application Entry
//!
//! Flags, logging, the action menu, dispatch.
//!
//! ## Flow
//!
//! [`App::init`] parses the two flags and installs the tracing subscriber
//! (debug level only under `--unsafe-debug`); [`App::execute`] installs the
//! SIGINT handler, then loops the action menu, translating prompt answers
//! into typed requests for the processor.
//!
//! ## Exit Behavior
//!
//! Declining a destructive confirmation aborts that action and returns to
//! the menu; any operation error, cancellation included, ends the process
//! with a nonzero status. Exit code 0 means every action completed.

use anyhow::{Context, Result};
use clap::Parser;

use crate::cancel::CancelToken;
use crate::processor;
use crate::session::Session;
use crate::types::{
    Action, CreateRandomRequest, DecryptRequest, EmbedRequest, EncryptRequest, ExtractRequest, OverwriteRequest,
};
use crate::ui::{display, prompt};

/// File encryption into padded uniform random blobs.
///
/// Runs an interactive action menu; the two flags are the only
/// non-interactive surface.
#[derive(Parser)]
#[command(name = "purbox", version, about = "Encrypt files into padded uniform random blobs and hide them inside opaque containers. Interactive; see the in-tool info screen.")]
pub struct App {
    /// Log derived sizes and offer debug-only options (fake MAC tags).
    #[arg(long)]
    pub unsafe_debug: bool,

    /// Keep decrypted plaintext even when authentication fails.
    #[arg(long)]
    pub unsafe_decrypt: bool,
}

impl App {
    /// Parses arguments and installs the tracing subscriber
    ///
    /// # Errors
    ///
    /// Fails when a global subscriber is already installed.
    pub fn init() -> Result<Self> {
        let app = Self::parse();
        let level = if app.unsafe_debug { tracing::Level::DEBUG } else { tracing::Level::INFO };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_target(false).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(app)
    }

    /// Runs the menu loop until exit or error
    ///
    /// # Errors
    ///
    /// Propagates the first operation or prompt failure; the caller turns
    /// it into a nonzero exit.
    pub fn execute(self) -> Result<()> {
        let session = Session::new(self.unsafe_debug, self.unsafe_decrypt);

        let cancel = CancelToken::new();
        let handler_token = cancel.clone();
        ctrlc::set_handler(move || handler_token.cancel()).context("cannot install signal handler")?;

        display::banner();
        if session.unsafe_decrypt {
            display::warning("unsafe decrypt: plaintext will be kept even when verification fails");
        }

        loop {
            match prompt::select_action()? {
                Action::Exit => break,
                Action::Info => display::info(),
                action => run(action, &session, &cancel)?,
            }
        }
        Ok(())
    }
}

/// Dispatches one menu action to its prompt-and-process routine.
fn run(action: Action, session: &Session, cancel: &CancelToken) -> Result<()> {
    match action {
        Action::Encrypt => run_encrypt(session, cancel, false),
        Action::EncryptEmbed => run_encrypt(session, cancel, true),
        Action::Decrypt => run_decrypt(session, cancel, false),
        Action::ExtractDecrypt => run_decrypt(session, cancel, true),
        Action::Embed => run_embed(cancel),
        Action::Extract => run_extract(cancel),
        Action::CreateRandom => run_create_random(cancel),
        Action::OverwriteRandom => run_overwrite(cancel),
        Action::Exit | Action::Info => unreachable!("handled by the menu loop"),
    }
}

/// Collects an encryption request and runs it.
///
/// Covers both the standalone and encrypt-and-embed actions; the latter
/// confirms the destructive container write before anything else is asked,
/// and the fake-MAC election is offered only under `--unsafe-debug`.
fn run_encrypt(session: &Session, cancel: &CancelToken, into_container: bool) -> Result<()> {
    let input = prompt::input_path("Payload file:")?;

    let (output, offset) = if into_container {
        let container = prompt::input_path("Container path:")?;
        let offset = prompt::offset("Blob start offset:")?;
        if !prompt::confirm("Overwrite the container range with the blob?", false)? {
            display::warning("aborted, container untouched");
            return Ok(());
        }
        (container, Some(offset))
    } else {
        (prompt::output_path("Output blob file:")?, None)
    };

    let sources = prompt::collect_ikm(true)?;
    let comment = prompt::comment()?;
    let tuning = prompt::tuning()?;
    let fake_mac = if session.unsafe_debug {
        prompt::confirm("Write a fake MAC tag (blob will never verify)?", false)?
    } else {
        false
    };

    let report = processor::encrypt(
        &EncryptRequest { input, output, offset, sources, comment, tuning, fake_mac },
        cancel,
    )?;

    if report.comment_truncated {
        display::warning("comment was truncated to the region size");
    }
    display::encrypt_report(&report);
    Ok(())
}

/// Collects a decryption request and runs it.
///
/// Covers both the standalone and extract-and-decrypt actions; the latter
/// asks for the `(start, end)` span the user recorded at embed time.
fn run_decrypt(session: &Session, cancel: &CancelToken, from_container: bool) -> Result<()> {
    let (input, span) = if from_container {
        let container = prompt::input_path("Container path:")?;
        let start = prompt::offset("Blob start offset:")?;
        let end = prompt::offset("Blob end offset:")?;
        (container, Some((start, end)))
    } else {
        (prompt::input_path("Cryptoblob file:")?, None)
    };
    let output = prompt::output_path("Output file:")?;

    let sources = prompt::collect_ikm(false)?;
    let tuning = prompt::tuning()?;

    let report = processor::decrypt(&DecryptRequest { input, output, span, sources, tuning }, session, cancel)?;
    display::decrypt_report(&report);
    Ok(())
}

/// Collects a raw embed request: source, container, offset, confirmation.
fn run_embed(cancel: &CancelToken) -> Result<()> {
    let source = prompt::input_path("File to embed:")?;
    let container = prompt::input_path("Container path:")?;
    let offset = prompt::offset("Start offset:")?;
    if !prompt::confirm("Overwrite the container range?", false)? {
        display::warning("aborted, container untouched");
        return Ok(());
    }

    let receipt = processor::embed(&EmbedRequest { source, container, offset }, cancel)?;
    display::range_receipt("Embedded", &receipt);
    Ok(())
}

/// Collects a raw extraction request: container, span, output.
fn run_extract(cancel: &CancelToken) -> Result<()> {
    let container = prompt::input_path("Container path:")?;
    let start = prompt::offset("Start offset:")?;
    let end = prompt::offset("End offset:")?;
    let output = prompt::output_path("Output file:")?;

    let receipt = processor::extract(&ExtractRequest { container, start, end, output }, cancel)?;
    display::range_receipt("Extracted", &receipt);
    Ok(())
}

/// Collects a random-file creation request: fresh path and size.
fn run_create_random(cancel: &CancelToken) -> Result<()> {
    let path = prompt::input_path("New file path:")?;
    let size = prompt::offset("Size in bytes:")?;

    processor::create_random(&CreateRandomRequest { path: path.clone(), size }, cancel)?;
    display::success(&format!("Created {} ({size} random bytes)", path.display()));
    Ok(())
}

/// Collects a random-overwrite request: target, range, confirmation.
fn run_overwrite(cancel: &CancelToken) -> Result<()> {
    let path = prompt::input_path("Target path:")?;
    let start = prompt::offset("Start offset:")?;
    let end = prompt::offset("End offset:")?;
    if !prompt::confirm("Overwrite the range with random bytes?", false)? {
        display::warning("aborted, target untouched");
        return Ok(());
    }

    processor::overwrite_random(&OverwriteRequest { path: path.clone(), start, end }, cancel)?;
    display::success(&format!("Overwrote [{start}, {end}) of {}", path.display()));
    Ok(())
}
