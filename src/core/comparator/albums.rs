//! Duplicate album inference from directory co-occurrence.
//!
//! The first member of each group anchors it to that member's directory.
//! Every other member's directory counts once as a co-duplicate of the
//! anchor. An anchor is reported when any one co-duplicate directory
//! reaches the threshold, and then with all of its co-duplicate
//! directories.
//!
//! This is a review aid. A single shared track is weak evidence; the
//! threshold can be raised or lowered per collection.

use super::DuplicateGroup;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Co-occurrence count at which an anchor directory is reported
pub const DEFAULT_ALBUM_THRESHOLD: usize = 2;

/// Anchor directory -> every directory holding duplicates of its tracks
pub type AlbumCandidates = BTreeMap<PathBuf, BTreeSet<PathBuf>>;

/// Infers duplicate album directories from duplicate groups
#[derive(Debug, Clone)]
pub struct AlbumInferencer {
    threshold: usize,
}

impl AlbumInferencer {
    /// Create an inferencer with the given threshold
    pub fn new(threshold: usize) -> Self {
        Self { threshold }
    }

    /// The inclusion threshold
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Derive album candidates from `groups`
    pub fn duplicate_albums<I>(&self, groups: I) -> AlbumCandidates
    where
        I: IntoIterator<Item = DuplicateGroup>,
    {
        let mut occurrences: HashMap<PathBuf, HashMap<PathBuf, usize>> = HashMap::new();

        for group in groups {
            let mut paths = group.paths();
            let Some(anchor) = paths.next() else {
                continue;
            };
            let counts = occurrences.entry(directory_of(anchor)).or_default();
            for member in paths {
                *counts.entry(directory_of(member)).or_insert(0) += 1;
            }
        }

        let mut candidates = AlbumCandidates::new();
        for (anchor, counts) in occurrences {
            if counts.values().any(|&n| n >= self.threshold) {
                debug!(anchor = %anchor.display(), siblings = counts.len(), "Duplicate album");
                candidates.insert(anchor, counts.into_keys().collect());
            }
        }
        candidates
    }
}

impl Default for AlbumInferencer {
    fn default() -> Self {
        Self::new(DEFAULT_ALBUM_THRESHOLD)
    }
}

fn directory_of(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{FileRecord, Identity};

    fn group(id: i64, paths: &[&str]) -> DuplicateGroup {
        DuplicateGroup {
            identity: Identity::new(id).unwrap(),
            records: paths.iter().map(|p| FileRecord::new(*p)).collect(),
        }
    }

    #[test]
    fn single_shared_track_is_not_an_album() {
        let groups = vec![
            group(1, &["/music/x/01.mp3", "/music/y/01.mp3"]),
            group(2, &["/music/x/02.mp3", "/music/z/02.mp3"]),
        ];

        let albums = AlbumInferencer::default().duplicate_albums(groups);

        assert!(albums.is_empty());
    }

    #[test]
    fn threshold_gates_anchor_but_reports_every_sibling() {
        let groups = vec![
            group(1, &["/music/x/01.mp3", "/music/y/01.mp3"]),
            group(2, &["/music/x/02.mp3", "/music/y/02.mp3"]),
            group(3, &["/music/x/03.mp3", "/music/z/03.mp3"]),
        ];

        let albums = AlbumInferencer::default().duplicate_albums(groups);

        let expected: BTreeSet<PathBuf> =
            [PathBuf::from("/music/y"), PathBuf::from("/music/z")].into();
        assert_eq!(albums.len(), 1);
        assert_eq!(albums[Path::new("/music/x")], expected);
    }

    #[test]
    fn anchor_is_the_first_member_directory() {
        let groups = vec![
            group(1, &["/music/y/01.mp3", "/music/x/01.mp3"]),
            group(2, &["/music/y/02.mp3", "/music/x/02.mp3"]),
        ];

        let albums = AlbumInferencer::default().duplicate_albums(groups);

        assert!(albums.contains_key(Path::new("/music/y")));
        assert!(!albums.contains_key(Path::new("/music/x")));
    }

    #[test]
    fn same_directory_members_count_toward_anchor() {
        let groups = vec![
            group(1, &["/music/x/01.mp3", "/music/x/01 (copy).mp3"]),
            group(2, &["/music/x/02.mp3", "/music/x/02 (copy).mp3"]),
        ];

        let albums = AlbumInferencer::default().duplicate_albums(groups);

        assert_eq!(
            albums[Path::new("/music/x")],
            BTreeSet::from([PathBuf::from("/music/x")])
        );
    }

    #[test]
    fn threshold_is_tunable() {
        let groups = vec![group(1, &["/music/x/01.mp3", "/music/y/01.mp3"])];

        let albums = AlbumInferencer::new(1).duplicate_albums(groups);

        assert_eq!(albums.len(), 1);
    }
}
