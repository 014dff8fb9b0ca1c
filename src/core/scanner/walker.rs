//! Directory walking implementation using walkdir.

use super::{MediaFilter, TreeListing};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Configuration for the tree walker
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
        }
    }
}

/// Walks a directory tree in a deterministic order
pub struct TreeWalker {
    config: ScanConfig,
}

impl TreeWalker {
    /// Create a new walker with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// List all files and directories below `root`
    pub fn walk(&self, root: &Path) -> Result<TreeListing, ScanError> {
        self.walk_with_events(root, &crate::events::null_sender())
    }

    /// List all files and directories below `root`, reporting progress
    ///
    /// A missing root is an error; unreadable entries below it are
    /// collected on the listing and the walk continues.
    pub fn walk_with_events(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<TreeListing, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut listing = TreeListing::default();

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|e| include_hidden || e.depth() == 0 || !is_hidden(e.path()));

        for entry_result in entries {
            match entry_result {
                Ok(entry) => {
                    if entry.depth() == 0 {
                        continue;
                    }

                    // Symlinks are listed like their targets; dangling
                    // ones count as files so reading them reports an error.
                    let is_dir = entry.file_type().is_dir()
                        || (entry.file_type().is_symlink() && entry.path().is_dir());
                    if is_dir {
                        listing.directories.push(entry.into_path());
                    } else {
                        listing.files.push(entry.into_path());
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();

                    let error = if e.io_error().map(|e| e.kind())
                        == Some(std::io::ErrorKind::PermissionDenied)
                    {
                        ScanError::PermissionDenied { path: path.clone() }
                    } else {
                        ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        }
                    };

                    warn!(path = %path.display(), "{}", error);
                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));

                    listing.errors.push(error);
                }
            }
        }

        debug!(
            root = %root.display(),
            files = listing.files.len(),
            directories = listing.directories.len(),
            "Walk complete"
        );

        events.send(Event::Scan(ScanEvent::Completed {
            files_found: listing.files.len(),
            directories_found: listing.directories.len(),
        }));

        Ok(listing)
    }

    /// Media files below `root`, in traversal order
    pub fn media_files(
        &self,
        root: &Path,
        filter: &MediaFilter,
        events: &EventSender,
    ) -> Result<(Vec<PathBuf>, Vec<ScanError>), ScanError> {
        let listing = self.walk_with_events(root, events)?;
        let media = listing
            .files
            .into_iter()
            .filter(|p| filter.should_include(p))
            .collect();
        Ok((media, listing.errors))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_file(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(b"data").unwrap();
        path
    }

    #[test]
    fn walk_empty_directory_returns_empty_listing() {
        let temp_dir = TempDir::new().unwrap();
        let walker = TreeWalker::new(ScanConfig::default());

        let listing = walker.walk(temp_dir.path()).unwrap();

        assert!(listing.files.is_empty());
        assert!(listing.directories.is_empty());
        assert!(listing.errors.is_empty());
    }

    #[test]
    fn walk_lists_files_and_directories_but_not_root() {
        let temp_dir = TempDir::new().unwrap();
        let foo = temp_dir.path().join("foo");
        let bar = foo.join("bar");
        fs::create_dir_all(&bar).unwrap();
        create_file(&foo, "file1.mp3");
        create_file(&bar, "file2.mp3");

        let walker = TreeWalker::new(ScanConfig::default());
        let listing = walker.walk(temp_dir.path()).unwrap();

        assert_eq!(listing.files.len(), 2);
        assert_eq!(listing.directories, vec![foo, bar]);
    }

    #[test]
    fn walk_order_is_sorted_by_name() {
        let temp_dir = TempDir::new().unwrap();
        create_file(temp_dir.path(), "c.mp3");
        create_file(temp_dir.path(), "a.mp3");
        create_file(temp_dir.path(), "b.mp3");

        let walker = TreeWalker::new(ScanConfig::default());
        let listing = walker.walk(temp_dir.path()).unwrap();

        let names: Vec<_> = listing
            .files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.mp3", "b.mp3", "c.mp3"]);
    }

    #[test]
    fn walk_can_exclude_hidden_entries() {
        let temp_dir = TempDir::new().unwrap();
        let hidden_dir = temp_dir.path().join(".cache");
        fs::create_dir(&hidden_dir).unwrap();
        create_file(&hidden_dir, "inside.mp3");
        create_file(temp_dir.path(), ".hidden.mp3");
        create_file(temp_dir.path(), "visible.mp3");

        let config = ScanConfig {
            include_hidden: false,
            ..Default::default()
        };
        let listing = TreeWalker::new(config).walk(temp_dir.path()).unwrap();

        assert_eq!(listing.files.len(), 1);
        assert!(listing.files[0].ends_with("visible.mp3"));
        assert!(listing.directories.is_empty());
    }

    #[test]
    fn media_files_filters_by_extension() {
        let temp_dir = TempDir::new().unwrap();
        let baz = temp_dir.path().join("foo/baz");
        fs::create_dir_all(&baz).unwrap();
        create_file(&baz, "file3.mp3");
        create_file(&baz, "file3.mp4");

        let walker = TreeWalker::new(ScanConfig::default());
        let (media, errors) = walker
            .media_files(
                temp_dir.path(),
                &MediaFilter::new(),
                &crate::events::null_sender(),
            )
            .unwrap();

        assert!(errors.is_empty());
        assert_eq!(media, vec![baz.join("file3.mp3")]);
    }

    #[test]
    fn walk_nonexistent_directory_returns_error() {
        let walker = TreeWalker::new(ScanConfig::default());
        let result = walker.walk(Path::new("/nonexistent/path/12345"));

        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }
}
