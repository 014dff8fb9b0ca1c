//! # Comparator Module
//!
//! Turns catalog identities into duplicate groups, and duplicate groups
//! into candidate duplicate albums.
//!
//! ## How It Works
//! 1. For every identity the recognizer knows, fetch the records using it
//! 2. Any identity with two or more records is a duplicate group
//! 3. Directories that repeatedly hold duplicates of tracks in another
//!    directory are reported as possible duplicate albums

mod albums;
mod grouper;

pub use albums::{AlbumCandidates, AlbumInferencer, DEFAULT_ALBUM_THRESHOLD};
pub use grouper::{DuplicateGrouper, DuplicateGroups};

use crate::core::catalog::{FileRecord, Identity};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Records sharing one identity; always two or more
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// The shared identity
    pub identity: Identity,
    /// Members in catalog insertion order
    pub records: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Number of members
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false for a group produced by the grouper
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Member paths, in order
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.records.iter().map(|r| r.path.as_path())
    }
}
