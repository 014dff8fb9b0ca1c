//! # Error Module
//!
//! Error types for the music deduplicator.
//!
//! ## Design Principles
//! - **Never abort a collection** because of one bad file - per-item
//!   failures are collected on result structs instead of propagated
//! - **Include context** - paths, instance numbers, what went wrong
//! - **Fatal only for preconditions** - bad instance numbers, scanning a
//!   forwarding-only instance, an unusable recognizer

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum MudError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Relocation error: {0}")]
    Relocate(#[from] RelocateError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Recognizer error: {0}")]
    Recognizer(#[from] RecognizerError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while digesting file content
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Could not read {path} for hashing: {source}")]
    UnreadableFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while moving duplicates out of a tree
#[derive(Error, Debug)]
pub enum RelocateError {
    #[error("{path} is not under the source root {root}")]
    PathNotUnderRoot { path: PathBuf, root: PathBuf },

    #[error("Failed to move {from} to {to}: {reason}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Failed to create directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur with the fingerprint catalog store
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to open catalog database at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Catalog query failed: {0}")]
    QueryFailed(String),

    #[error("Catalog at {path} is unusable after a panic in another caller. Reopen it and try again.")]
    Poisoned { path: PathBuf },
}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        CatalogError::QueryFailed(e.to_string())
    }
}

/// Errors from the fingerprint-and-identify capability itself.
///
/// A file the capability cannot decode is *not* an error here; it is a
/// normal [`Recognition`](crate::core::recognizer::Recognition) outcome.
#[derive(Error, Debug)]
pub enum RecognizerError {
    #[error("Recognizer program {program} could not be started: {reason}")]
    Unavailable { program: PathBuf, reason: String },

    #[error("Recognizer produced unreadable output for {path}: {reason}")]
    InvalidOutput { path: PathBuf, reason: String },
}

/// Errors from the multi-instance candidate pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Instance {instance} is not configured (configured instances: 0..{configured})")]
    InstanceOutOfRange { instance: usize, configured: usize },

    #[error("Scanning is not permitted for non-primary instance {instance}; forward candidates into it instead")]
    ScanNotPermitted { instance: usize },

    #[error("Failed to start candidate producer: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("No candidate received from producer within {seconds}s")]
    Timeout { seconds: u64 },

    #[error("Candidate stream ended without an end-of-stream marker")]
    StreamTruncated,

    #[error("Malformed candidate message: {0}")]
    Protocol(String),

    #[error("Candidate producer exited unsuccessfully: {0}")]
    ProducerFailed(String),

    #[error("Failed to write candidate stream: {0}")]
    Write(#[source] std::io::Error),
}

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },

    #[error("No configuration directory available; pass --config explicitly")]
    NoConfigDir,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, MudError>;
