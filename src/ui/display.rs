//! # Formatted Terminal Output
//!
//! Success banners, operation reports, and the info screen.
//!
//! ## Reporting Rules
//!
//! - Blob spans are always echoed back after a write: the `(start, end)`
//!   pair is the user's only index into a container, and losing it loses
//!   the blob
//! - Checksums accompany every embed and extract as a receipt
//! - A failed-but-released verification is styled as a warning, never as
//!   success

use bytesize::ByteSize;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use strum::IntoEnumIterator;

use crate::config::APP_NAME;
use crate::container::RangeReceipt;
use crate::processor::{DecryptReport, EncryptReport};
use crate::types::Action;

/// Prints the application banner with name and version
pub fn banner() {
    println!();
    println!("{}", console::style(format!("{APP_NAME} {}", env!("CARGO_PKG_VERSION"))).green().bright().bold());
    println!("{}", console::style("file encryption into padded uniform random blobs").dim());
    println!();
}

/// Prints a green success line.
pub fn success(message: &str) {
    println!("{} {}", console::style("✔").green().bright(), console::style(message).white().bright());
}

/// Prints a yellow warning line.
pub fn warning(message: &str) {
    println!("{} {}", console::style("!").yellow().bright(), console::style(message).yellow().bright());
}

/// Reports a finished encryption, echoing the span to record
///
/// # Arguments
///
/// * `report` - The processor's report; for embedded blobs the reminder to
///   record both offsets is printed alongside the span
pub fn encrypt_report(report: &EncryptReport) {
    success(&format!(
        "Encrypted: {} bytes written ({})",
        report.end - report.start,
        ByteSize(report.end - report.start)
    ));
    println!("  span: [{}, {})", report.start, report.end);
    if report.start != 0 {
        println!("  record both offsets; the container has no other index");
    }
}

/// Reports a finished decryption, including the verification verdict
///
/// An unverified-but-released outcome (unsafe-decrypt mode) renders as a
/// warning so it can never be mistaken for a clean decrypt.
pub fn decrypt_report(report: &DecryptReport) {
    if report.verified {
        success(&format!("Decrypted and verified: {} bytes ({})", report.payload_len, ByteSize(report.payload_len)));
    } else {
        warning(&format!(
            "Decrypted {} bytes, verification FAILED; output kept on request",
            report.payload_len
        ));
    }
    if !report.comment.is_empty() {
        println!("  comment: {}", report.comment);
    }
}

/// Reports an embed or extraction with its checksum receipt
///
/// # Arguments
///
/// * `operation` - Past-tense verb for the report line
/// * `receipt` - Span and BLAKE3 checksum of the moved range
pub fn range_receipt(operation: &str, receipt: &RangeReceipt) {
    success(&format!(
        "{operation}: [{}, {}), {}",
        receipt.start,
        receipt.end,
        ByteSize(receipt.end - receipt.start)
    ));
    println!("  checksum: {}", hex::encode(receipt.checksum));
}

/// The info screen: what the tool does and the action list
pub fn info() {
    banner();
    println!("Cryptoblobs are indistinguishable from uniform random bytes: no header,");
    println!("no magic, no visible length. Keys are derived with Argon2id (1 GiB, time");
    println!("cost of your choosing) from any mix of passphrases and keyfiles. Blobs");
    println!("may live at any offset inside random-filled containers; the (start, end)");
    println!("offsets and the keying material are yours to remember.");
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Action"), Cell::new("Description")]);
    for action in Action::iter() {
        table.add_row(vec![Cell::new(action.code()), Cell::new(action.label())]);
    }
    println!("{table}");
    println!();
}
