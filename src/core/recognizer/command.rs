//! Recognizer backed by an external program.
//!
//! The program is invoked as `<program> <args...> <file>`. A non-zero
//! exit status means the file could not be decoded. On success stdout
//! holds one JSON object:
//!
//! ```json
//! {"identity": 42, "name": "Song", "artist": "A", "title": "Song", "album": "B"}
//! ```
//!
//! A null, missing or non-positive identity means no match.

use super::{Recognition, Recognizer};
use crate::core::catalog::{Identity, TrackTags};
use crate::error::RecognizerError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct RecognizerOutput {
    #[serde(default)]
    identity: Option<i64>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    album: String,
}

impl RecognizerOutput {
    fn into_recognition(self) -> Recognition {
        let tags = TrackTags {
            artist: self.artist,
            title: self.title,
            album: self.album,
        };
        match self.identity.and_then(Identity::new) {
            Some(identity) => Recognition::Identified {
                identity,
                name: self.name,
                tags,
            },
            None => Recognition::NoMatch { tags },
        }
    }
}

/// Runs an external fingerprinting program once per file
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Create a recognizer for `program`, passing `args` before the file path
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl Recognizer for CommandRecognizer {
    fn recognize(&self, path: &Path) -> Result<Recognition, RecognizerError> {
        debug!(program = %self.program.display(), file = %path.display(), "Recognizing");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .output()
            .map_err(|e| RecognizerError::Unavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("recognizer exited with {}", output.status)
            } else {
                stderr
            };
            return Ok(Recognition::DecodeFailure { reason });
        }

        let parsed: RecognizerOutput =
            serde_json::from_slice(&output.stdout).map_err(|e| RecognizerError::InvalidOutput {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        Ok(parsed.into_recognition())
    }
}
