//! # Recognizer Module
//!
//! The seam to the external audio-fingerprinting capability.
//!
//! A recognizer turns an audio file into one of three outcomes:
//! an identity, "decoded but unknown", or "could not decode". Only a
//! recognizer that cannot run at all returns `Err`.

mod command;

pub use command::CommandRecognizer;

use crate::core::catalog::{Identity, TrackTags};
use crate::error::RecognizerError;
use std::path::Path;

/// What the capability said about one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Matched a known identity
    Identified {
        identity: Identity,
        /// Display name the capability holds for the identity
        name: String,
        tags: TrackTags,
    },
    /// Decoded, but nothing matched
    NoMatch { tags: TrackTags },
    /// The file could not be decoded (unsupported format, corrupt data)
    DecodeFailure { reason: String },
}

/// Fingerprint-and-identify capability
pub trait Recognizer: Send + Sync {
    /// Recognize one audio file
    fn recognize(&self, path: &Path) -> Result<Recognition, RecognizerError>;
}
