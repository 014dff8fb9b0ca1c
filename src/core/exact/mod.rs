//! # Exact Module
//!
//! Finds byte-identical files by content digest.
//!
//! ## How It Works
//! 1. Walk the root, collecting every file and directory
//! 2. Digest every file (unreadable files are skipped and reported)
//! 3. Group files by digest
//! 4. In each group the lexicographically smallest path is canonical;
//!    every other member is a duplicate
//!
//! Because the walk is sorted, the canonical member is also the first
//! one encountered, and duplicates come out in encounter order.

use crate::core::hasher::{ContentHasher, Digest};
use crate::core::scanner::{ScanConfig, TreeWalker};
use crate::error::{HashError, ScanError};
use crate::events::{Event, EventSender, HashEvent, HashProgress, null_sender};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Files sharing one digest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DigestGroup {
    /// Shared content digest
    pub digest: Digest,
    /// Canonical member first, then the rest in encounter order
    pub paths: Vec<PathBuf>,
}

impl DigestGroup {
    /// The member that is kept in place
    pub fn canonical(&self) -> &Path {
        &self.paths[0]
    }

    /// Members that are duplicates of the canonical one
    pub fn duplicates(&self) -> &[PathBuf] {
        &self.paths[1..]
    }
}

/// Result of an exact duplicate scan
#[derive(Debug, Default)]
pub struct ExactScanResult {
    /// Every non-canonical member of every group, in encounter order
    pub duplicates: Vec<PathBuf>,
    /// All directories below the root, for empty-directory pruning
    pub directories: Vec<PathBuf>,
    /// Groups of two or more identical files
    pub groups: Vec<DigestGroup>,
    /// Number of files digested successfully
    pub files_hashed: usize,
    /// Files that could not be read (skipped)
    pub unreadable: Vec<HashError>,
    /// Tree entries that could not be listed
    pub scan_errors: Vec<ScanError>,
}

/// Finds byte-identical duplicates below a root
pub struct ExactDuplicateScanner {
    walker: TreeWalker,
    hasher: ContentHasher,
    report_groups: bool,
}

impl ExactDuplicateScanner {
    /// Create a scanner with the given walk configuration
    pub fn new(config: ScanConfig) -> Self {
        Self {
            walker: TreeWalker::new(config),
            hasher: ContentHasher::new(),
            report_groups: false,
        }
    }

    /// Log every group's full membership (canonical member included).
    ///
    /// Diagnostic only; the duplicate classification is unchanged.
    pub fn report_groups(mut self, report: bool) -> Self {
        self.report_groups = report;
        self
    }

    /// Scan without progress events
    pub fn scan(&self, root: &Path) -> Result<ExactScanResult, ScanError> {
        self.scan_with_events(root, &null_sender())
    }

    /// Scan `root`, reporting progress through `events`
    pub fn scan_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<ExactScanResult, ScanError> {
        info!(root = %root.display(), "Checking files for duplicates");

        let listing = self.walker.walk_with_events(root, events)?;
        let total = listing.files.len();

        events.send(Event::Hash(HashEvent::Started { total_files: total }));

        let mut by_digest: HashMap<Digest, Vec<(usize, PathBuf)>> = HashMap::new();
        let mut first_seen: Vec<Digest> = Vec::new();
        let mut unreadable = Vec::new();
        let mut files_hashed = 0;

        for (i, path) in listing.files.into_iter().enumerate() {
            events.send(Event::Hash(HashEvent::Progress(HashProgress {
                completed: i + 1,
                total,
                current_path: path.clone(),
            })));

            match self.hasher.digest(&path) {
                Ok(digest) => {
                    files_hashed += 1;
                    let members = by_digest.entry(digest).or_default();
                    if members.is_empty() {
                        first_seen.push(digest);
                    }
                    members.push((i, path));
                }
                Err(e) => {
                    warn!(path = %path.display(), "Could not calculate checksum: {}", e);
                    events.send(Event::Hash(HashEvent::Skipped {
                        path,
                        message: e.to_string(),
                    }));
                    unreadable.push(e);
                }
            }
        }

        let mut groups = Vec::new();
        let mut duplicates: Vec<(usize, PathBuf)> = Vec::new();
        for digest in first_seen {
            let Some(mut members) = by_digest.remove(&digest) else {
                continue;
            };
            if members.len() < 2 {
                continue;
            }

            // Smallest path is canonical; the rest keep encounter order.
            let canonical_index = members
                .iter()
                .enumerate()
                .min_by(|(_, (_, a)), (_, (_, b))| a.cmp(b))
                .map(|(i, _)| i)
                .unwrap_or(0);
            let canonical = members.remove(canonical_index);

            let mut paths = vec![canonical.1];
            paths.extend(members.iter().map(|(_, p)| p.clone()));
            duplicates.extend(members);

            groups.push(DigestGroup { digest, paths });
        }
        duplicates.sort_by_key(|(i, _)| *i);

        if self.report_groups {
            for group in &groups {
                info!(
                    digest = %group.digest,
                    members = ?group.paths,
                    "Identical content"
                );
                events.send(Event::Hash(HashEvent::GroupFound {
                    digest: group.digest.to_hex(),
                    paths: group.paths.clone(),
                }));
            }
        }

        events.send(Event::Hash(HashEvent::Completed {
            total_hashed: files_hashed,
            duplicates: duplicates.len(),
        }));

        Ok(ExactScanResult {
            duplicates: duplicates.into_iter().map(|(_, p)| p).collect(),
            directories: listing.directories,
            groups,
            files_hashed,
            unreadable,
            scan_errors: listing.errors,
        })
    }
}

impl Default for ExactDuplicateScanner {
    fn default() -> Self {
        Self::new(ScanConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventChannel;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content).unwrap();
    }

    #[test]
    fn second_identical_file_is_the_duplicate() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("f1"), b"same");
        write_file(&root.join("f2"), b"same");
        write_file(&root.join("f3"), b"different");

        let result = ExactDuplicateScanner::default().scan(root).unwrap();

        assert_eq!(result.duplicates, vec![root.join("f2")]);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].canonical(), root.join("f1"));
    }

    #[test]
    fn duplicate_count_is_files_minus_distinct_digests() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("a/1.mp3"), b"x");
        write_file(&root.join("a/2.mp3"), b"x");
        write_file(&root.join("b/1.mp3"), b"x");
        write_file(&root.join("b/2.mp3"), b"y");
        write_file(&root.join("c/1.mp3"), b"y");
        write_file(&root.join("c/2.mp3"), b"z");

        let result = ExactDuplicateScanner::default().scan(root).unwrap();

        // 6 files, 3 distinct digests
        assert_eq!(result.duplicates.len(), 3);
        for group in &result.groups {
            assert!(!result.duplicates.contains(&group.canonical().to_path_buf()));
        }
    }

    #[test]
    fn duplicates_keep_encounter_order_across_groups() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("a"), b"one");
        write_file(&root.join("b"), b"two");
        write_file(&root.join("c"), b"two");
        write_file(&root.join("d"), b"one");

        let result = ExactDuplicateScanner::default().scan(root).unwrap();

        assert_eq!(result.duplicates, vec![root.join("c"), root.join("d")]);
    }

    #[test]
    fn directories_are_listed_for_pruning() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("x/y/track.mp3"), b"t");

        let result = ExactDuplicateScanner::default().scan(root).unwrap();

        assert_eq!(result.directories, vec![root.join("x"), root.join("x/y")]);
        assert!(result.duplicates.is_empty());
    }

    #[test]
    fn group_report_does_not_change_classification() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("f1"), b"same");
        write_file(&root.join("f2"), b"same");

        let (sender, receiver) = EventChannel::new();
        let quiet = ExactDuplicateScanner::default().scan(root).unwrap();
        let loud = ExactDuplicateScanner::default()
            .report_groups(true)
            .scan_with_events(root, &sender)
            .unwrap();
        drop(sender);

        assert_eq!(quiet.duplicates, loud.duplicates);

        let reported: Vec<_> = receiver
            .iter()
            .filter_map(|e| match e {
                Event::Hash(HashEvent::GroupFound { paths, .. }) => Some(paths),
                _ => None,
            })
            .collect();
        assert_eq!(reported, vec![vec![root.join("f1"), root.join("f2")]]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_is_skipped_not_fatal() {
        use std::os::unix::fs::symlink;

        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        write_file(&root.join("f1"), b"same");
        write_file(&root.join("f2"), b"same");
        symlink(root.join("missing"), root.join("broken")).unwrap();

        let config = ScanConfig {
            follow_symlinks: false,
            ..Default::default()
        };
        let result = ExactDuplicateScanner::new(config).scan(root).unwrap();

        assert_eq!(result.duplicates, vec![root.join("f2")]);
        assert_eq!(result.files_hashed, 2);
        assert_eq!(result.unreadable.len(), 1);
    }
}
