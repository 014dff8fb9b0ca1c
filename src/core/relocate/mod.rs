//! # Relocate Module
//!
//! Moves duplicates out of a tree without destroying them.
//!
//! Each duplicate is moved to the same relative position under a
//! target root, so the previous layout can be rebuilt by moving the
//! files back. Directories emptied by the moves are then removed.
//! A dry run performs no filesystem mutation at all.

use crate::error::RelocateError;
use crate::events::{Event, EventSender, RelocateEvent, null_sender};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Result of relocating a batch of files
#[derive(Debug, Default)]
pub struct RelocateReport {
    /// (from, to) for every file moved (or that would be, under a dry run)
    pub moved: Vec<(PathBuf, PathBuf)>,
    /// Directories created under the target root
    pub directories_created: usize,
    /// Per-file failures; the batch continued past each one
    pub errors: Vec<RelocateError>,
}

/// Moves files from below a source root to the same place below a target root
#[derive(Debug, Clone)]
pub struct Relocator {
    source_root: PathBuf,
    target_root: PathBuf,
    dry_run: bool,
}

impl Relocator {
    /// Create a relocator; moves are real unless [`dry_run`](Self::dry_run) is set
    pub fn new(source_root: impl Into<PathBuf>, target_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            target_root: target_root.into(),
            dry_run: false,
        }
    }

    /// Report what would happen without touching the filesystem
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Where `path` goes under the target root
    pub fn target_for(&self, path: &Path) -> Result<PathBuf, RelocateError> {
        let suffix = path
            .strip_prefix(&self.source_root)
            .map_err(|_| RelocateError::PathNotUnderRoot {
                path: path.to_path_buf(),
                root: self.source_root.clone(),
            })?;
        Ok(self.target_root.join(suffix))
    }

    /// Relocate files without progress events
    pub fn relocate(&self, paths: &[PathBuf]) -> RelocateReport {
        self.relocate_with_events(paths, &null_sender())
    }

    /// Relocate every path, continuing past individual failures
    pub fn relocate_with_events(&self, paths: &[PathBuf], events: &EventSender) -> RelocateReport {
        let mut report = RelocateReport::default();
        let mut created_dirs: HashSet<PathBuf> = HashSet::new();

        for path in paths {
            match self.relocate_one(path, &mut created_dirs) {
                Ok((to, created)) => {
                    report.directories_created += created;
                    events.send(Event::Relocate(RelocateEvent::Moved {
                        from: path.clone(),
                        to: to.clone(),
                        dry_run: self.dry_run,
                    }));
                    report.moved.push((path.clone(), to));
                }
                Err(e) => {
                    warn!(path = %path.display(), "{}", e);
                    events.send(Event::Relocate(RelocateEvent::Failed {
                        path: path.clone(),
                        message: e.to_string(),
                    }));
                    report.errors.push(e);
                }
            }
        }

        events.send(Event::Relocate(RelocateEvent::Completed {
            moved: report.moved.len(),
            failed: report.errors.len(),
        }));

        report
    }

    fn relocate_one(
        &self,
        from: &Path,
        created_dirs: &mut HashSet<PathBuf>,
    ) -> Result<(PathBuf, usize), RelocateError> {
        let to = self.target_for(from)?;

        if self.dry_run {
            debug!(from = %from.display(), to = %to.display(), "Would move");
            return Ok((to, 0));
        }

        let mut created = 0;
        if let Some(parent) = to.parent() {
            if !created_dirs.contains(parent) && !parent.is_dir() {
                fs::create_dir_all(parent).map_err(|source| RelocateError::CreateDirectory {
                    path: parent.to_path_buf(),
                    source,
                })?;
                created = 1;
            }
            created_dirs.insert(parent.to_path_buf());
        }

        // rename() silently replaces an existing file on some platforms
        if to.symlink_metadata().is_ok() {
            return Err(RelocateError::MoveFailed {
                from: from.to_path_buf(),
                to,
                reason: "target already exists".to_string(),
            });
        }

        fs::rename(from, &to).map_err(|e| RelocateError::MoveFailed {
            from: from.to_path_buf(),
            to: to.clone(),
            reason: e.to_string(),
        })?;

        debug!(from = %from.display(), to = %to.display(), "Moved");
        Ok((to, created))
    }

    /// Remove directories that are empty, repeating until a pass removes none.
    ///
    /// Directories that are gone or unreadable are skipped. Returns the
    /// number removed; a dry run removes nothing.
    pub fn remove_empty_dirs(&self, directories: &[PathBuf]) -> usize {
        self.remove_empty_dirs_with_events(directories, &null_sender())
    }

    /// [`remove_empty_dirs`](Self::remove_empty_dirs) with progress events
    pub fn remove_empty_dirs_with_events(
        &self,
        directories: &[PathBuf],
        events: &EventSender,
    ) -> usize {
        if self.dry_run {
            return 0;
        }

        let mut total = 0;
        loop {
            let mut removed = 0;
            for dir in directories {
                let is_empty = match fs::read_dir(dir) {
                    Ok(mut entries) => entries.next().is_none(),
                    Err(_) => continue,
                };
                if is_empty && fs::remove_dir(dir).is_ok() {
                    info!(path = %dir.display(), "Deleted empty directory");
                    events.send(Event::Relocate(RelocateEvent::DirectoryRemoved {
                        path: dir.clone(),
                    }));
                    removed += 1;
                }
            }

            total += removed;
            if removed == 0 {
                break;
            }
        }

        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut f = fs::File::create(path).unwrap();
        f.write_all(content).unwrap();
    }

    #[test]
    fn target_preserves_suffix() {
        let relocator = Relocator::new("/music", "/var/tmp/dups");
        let target = relocator
            .target_for(Path::new("/music/artist/album/01.mp3"))
            .unwrap();
        assert_eq!(target, PathBuf::from("/var/tmp/dups/artist/album/01.mp3"));
    }

    #[test]
    fn path_outside_root_is_rejected() {
        let relocator = Relocator::new("/music", "/var/tmp/dups");
        let result = relocator.target_for(Path::new("/musicals/01.mp3"));
        assert!(matches!(result, Err(RelocateError::PathNotUnderRoot { .. })));
    }

    #[test]
    fn relocate_moves_and_rebuilds_tree() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = src.path().join("a/b/track.mp3");
        write_file(&file, b"audio");

        let report = Relocator::new(src.path(), dest.path()).relocate(&[file.clone()]);

        assert!(report.errors.is_empty());
        assert_eq!(report.moved.len(), 1);
        assert!(!file.exists());
        assert!(dest.path().join("a/b/track.mp3").exists());
    }

    #[test]
    fn dry_run_touches_nothing() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let file = src.path().join("a/track.mp3");
        write_file(&file, b"audio");

        let relocator = Relocator::new(src.path(), dest.path()).dry_run(true);
        let report = relocator.relocate(&[file.clone()]);
        let removed = relocator.remove_empty_dirs(&[src.path().join("a")]);

        assert_eq!(report.moved.len(), 1);
        assert_eq!(report.directories_created, 0);
        assert_eq!(removed, 0);
        assert!(file.exists());
        assert!(!dest.path().join("a").exists());
    }

    #[test]
    fn existing_target_is_a_move_failure_and_batch_continues() {
        let src = TempDir::new().unwrap();
        let dest = TempDir::new().unwrap();
        let clash = src.path().join("clash.mp3");
        let other = src.path().join("other.mp3");
        write_file(&clash, b"new");
        write_file(&other, b"other");
        write_file(&dest.path().join("clash.mp3"), b"old");

        let report = Relocator::new(src.path(), dest.path()).relocate(&[
            PathBuf::from("/elsewhere/x.mp3"),
            clash.clone(),
            other.clone(),
        ]);

        assert_eq!(report.errors.len(), 2);
        assert!(matches!(report.errors[0], RelocateError::PathNotUnderRoot { .. }));
        assert!(matches!(report.errors[1], RelocateError::MoveFailed { .. }));
        assert!(clash.exists());
        assert_eq!(fs::read(dest.path().join("clash.mp3")).unwrap(), b"old");
        assert!(dest.path().join("other.mp3").exists());
    }

    #[test]
    fn nested_empty_directories_are_removed() {
        let root = TempDir::new().unwrap();
        let a = root.path().join("a");
        let b = a.join("b");
        let c = b.join("c");
        fs::create_dir_all(&c).unwrap();
        let keep = root.path().join("keep");
        write_file(&keep.join("file.mp3"), b"x");

        // Deepest last, so only repeated passes can clear the chain
        let dirs = vec![a.clone(), b.clone(), c.clone(), keep.clone()];
        let removed = Relocator::new(root.path(), "/unused").remove_empty_dirs(&dirs);

        assert_eq!(removed, 3);
        assert!(!a.exists());
        assert!(keep.exists());
    }

    #[test]
    fn vanished_directories_are_skipped() {
        let root = TempDir::new().unwrap();
        let removed = Relocator::new(root.path(), "/unused")
            .remove_empty_dirs(&[root.path().join("never-existed")]);
        assert_eq!(removed, 0);
    }
}
