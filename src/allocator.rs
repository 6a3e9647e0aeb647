//! Global memory allocator configuration.
//!
//! `mimalloc` replaces the system allocator. The dominant allocation here is
//! the fixed 1 GiB Argon2 arena, with 128 KiB chunk buffers churning around
//! it; mimalloc handles the mix without fragmenting the long derivation
//! runs.

use mimalloc::MiMalloc;

/// The global allocator instance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;
