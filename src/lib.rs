//! # mud
//!
//! Finds duplicate music files, both byte-identical copies and the same
//! recording in different encodings.
//!
//! ## Core Philosophy
//! - **Never delete** - exact duplicates are moved aside so the tree can
//!   be rebuilt; fingerprint duplicates are only reported
//! - **One bad file never stops a run** - unreadable or undecodable
//!   files are skipped and recorded
//!
//! ## Architecture
//! - `core` - hashing, relocation, the fingerprint catalog, grouping and
//!   the cross-instance candidate pipeline
//! - `config` - JSON configuration
//! - `events` - progress reporting
//! - `error` - error types

pub mod config;
pub mod core;
pub mod error;
pub mod events;

pub use error::{MudError, Result};

/// Initialize tracing for the binary.
///
/// Logs go to stderr; stdout may be carrying a candidate stream.
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "mud=debug" } else { "mud=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
