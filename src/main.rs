// PurBox - file encryption into padded uniform random blobs.
//
// Encryption: ChaCha20 + keyed BLAKE2b-512 over a bilaterally salted,
// randomly padded layout with no headers.
// Key derivation: Argon2id, 1 GiB, user-chosen time cost.

use std::process;

use purbox::app::App;

/// Entry point.
///
/// # Exit Codes
/// * 0 - Success
/// * 1 - Error or cancellation (message printed to stderr)
fn main() {
    if let Err(e) = App::init().and_then(App::execute) {
        eprintln!("Error: {e:?}");
        process::exit(1);
    }
}
