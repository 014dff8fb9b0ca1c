//! # Hasher Module
//!
//! Computes content digests used as a byte-identity proxy for files.
//!
//! ## How It Works
//! The whole file is streamed through SHA-256. There is no sampling or
//! prefix hashing: two files are only treated as duplicates when every
//! byte went into their digests.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::fs::File;
use std::io;
use std::path::Path;

/// A 256-bit content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Get the digest as a lowercase hexadecimal string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes [`Digest`]s of file content
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Create a new content hasher
    pub fn new() -> Self {
        Self
    }

    /// Digest the full content of a file
    pub fn digest(&self, path: &Path) -> Result<Digest, HashError> {
        let unreadable = |source| HashError::UnreadableFile {
            path: path.to_path_buf(),
            source,
        };

        let mut file = File::open(path).map_err(unreadable)?;
        let mut hasher = Sha256::new();
        io::copy(&mut file, &mut hasher).map_err(unreadable)?;

        Ok(Digest(hasher.finalize().into()))
    }

    /// Digest an in-memory buffer
    pub fn digest_bytes(&self, bytes: &[u8]) -> Digest {
        Digest(Sha256::digest(bytes).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(content).unwrap();
        path
    }

    #[test]
    fn identical_content_has_identical_digest() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.mp3", b"same bytes");
        let b = write_file(&dir, "b.mp3", b"same bytes");

        let hasher = ContentHasher::new();
        assert_eq!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());
    }

    #[test]
    fn different_content_has_different_digest() {
        let dir = TempDir::new().unwrap();
        let a = write_file(&dir, "a.mp3", b"one");
        let b = write_file(&dir, "b.mp3", b"two");

        let hasher = ContentHasher::new();
        assert_ne!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());
    }

    #[test]
    fn digest_matches_known_sha256() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "abc.txt", b"abc");

        let digest = ContentHasher::new().digest(&path).unwrap();
        assert_eq!(
            digest.to_hex(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn file_digest_equals_buffer_digest() {
        let dir = TempDir::new().unwrap();
        let content = vec![0xABu8; 200_000];
        let path = write_file(&dir, "large.bin", &content);

        let hasher = ContentHasher::new();
        assert_eq!(hasher.digest(&path).unwrap(), hasher.digest_bytes(&content));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let result = ContentHasher::new().digest(Path::new("/nonexistent/track.mp3"));
        assert!(matches!(result, Err(HashError::UnreadableFile { .. })));
    }
}
