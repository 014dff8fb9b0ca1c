//! # Scanner Module
//!
//! Walks directory trees for the exact-hash and fingerprint paths.
//!
//! Traversal is depth-first with entries sorted by file name, so a walk
//! over an unchanged tree always yields the same order. Within one
//! walk a file path is listed before every path that sorts after it.
//!
//! ## Example
//! ```rust,ignore
//! use mud::core::scanner::{ScanConfig, TreeWalker};
//!
//! let listing = TreeWalker::new(ScanConfig::default()).walk("/music".as_ref())?;
//! println!("{} files in {} directories", listing.files.len(), listing.directories.len());
//! ```

mod filter;
mod walker;

pub use filter::{DEFAULT_MEDIA_EXTENSIONS, MediaFilter};
pub use walker::{ScanConfig, TreeWalker};

use crate::error::ScanError;
use std::path::{Path, PathBuf};

/// Everything found below a root
#[derive(Debug, Default)]
pub struct TreeListing {
    /// Regular files, in traversal order
    pub files: Vec<PathBuf>,
    /// Directories below the root (the root itself is not listed)
    pub directories: Vec<PathBuf>,
    /// Entries that could not be read (non-fatal)
    pub errors: Vec<ScanError>,
}

/// Distinct file extensions below `root`, each once, in first-seen order.
///
/// Files without an extension are ignored. Extensions are reported as
/// found, so `mp3` and `MP3` are listed separately.
pub fn list_extensions(walker: &TreeWalker, root: &Path) -> Result<Vec<String>, ScanError> {
    let listing = walker.walk(root)?;
    let mut seen = std::collections::HashSet::new();
    let mut extensions = Vec::new();

    for file in &listing.files {
        if let Some(ext) = file.extension().and_then(|e| e.to_str()) {
            if seen.insert(ext.to_string()) {
                extensions.push(ext.to_string());
            }
        }
    }

    Ok(extensions)
}
