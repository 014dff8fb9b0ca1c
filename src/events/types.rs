//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the deduplication engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory walking
    Scan(ScanEvent),
    /// Content digesting on the exact-hash path
    Hash(HashEvent),
    /// Moving duplicates and pruning empty directories
    Relocate(RelocateEvent),
    /// Building the fingerprint collection
    Fingerprint(FingerprintEvent),
    /// Forwarding candidates between instances
    Forward(ForwardEvent),
}

/// Events while walking a tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking has started
    Started { root: PathBuf },
    /// An entry could not be read but walking continues
    Error { path: PathBuf, message: String },
    /// Walking completed
    Completed {
        files_found: usize,
        directories_found: usize,
    },
}

/// Events while digesting files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HashEvent {
    /// Digesting has started
    Started { total_files: usize },
    /// Progress update
    Progress(HashProgress),
    /// A file was skipped because it could not be read
    Skipped { path: PathBuf, message: String },
    /// A group of byte-identical files, canonical member first
    GroupFound { digest: String, paths: Vec<PathBuf> },
    /// Digesting completed
    Completed {
        total_hashed: usize,
        duplicates: usize,
    },
}

/// Progress information while digesting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashProgress {
    /// Files digested so far
    pub completed: usize,
    /// Total files to digest
    pub total: usize,
    /// File being digested
    pub current_path: PathBuf,
}

/// Events while relocating duplicates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelocateEvent {
    /// A file was moved (or would be, under a dry run)
    Moved {
        from: PathBuf,
        to: PathBuf,
        dry_run: bool,
    },
    /// A file could not be relocated; the batch continues
    Failed { path: PathBuf, message: String },
    /// An empty directory was removed
    DirectoryRemoved { path: PathBuf },
    /// Relocation finished
    Completed { moved: usize, failed: usize },
}

/// Events while building the fingerprint collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum FingerprintEvent {
    /// Fingerprinting has started
    Started { total_files: usize },
    /// Progress update
    Progress(FingerprintProgress),
    /// A file was recognized
    Identified { path: PathBuf, identity: i64 },
    /// A file was recorded with an error code
    Unresolved { path: PathBuf, error_code: i64 },
    /// Fingerprinting completed
    Completed { identified: usize, unresolved: usize },
}

/// Progress information while fingerprinting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FingerprintProgress {
    /// Files processed so far
    pub completed: usize,
    /// Files to process in this pass
    pub total: usize,
    /// File being processed
    pub current_path: PathBuf,
}

/// Events while forwarding candidates to the next instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ForwardEvent {
    /// The producer process was started
    ProducerStarted { source_instance: usize },
    /// A duplicate group was received and registered
    GroupReceived { identity: i64, paths: usize },
    /// The end-of-stream marker arrived
    Completed { groups: usize, paths_forwarded: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_serializable() {
        let event = Event::Hash(HashEvent::GroupFound {
            digest: "ab".repeat(32),
            paths: vec![PathBuf::from("/a/f1"), PathBuf::from("/a/f2")],
        });

        let json = serde_json::to_string(&event).unwrap();
        let deserialized: Event = serde_json::from_str(&json).unwrap();

        match deserialized {
            Event::Hash(HashEvent::GroupFound { paths, .. }) => {
                assert_eq!(paths.len(), 2);
            }
            _ => panic!("Wrong event type"),
        }
    }
}
