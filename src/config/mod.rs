//! # Config Module
//!
//! JSON configuration: where the music lives, which files count as
//! media, and one entry per catalog instance.
//!
//! ```json
//! {
//!   "media_root": "/srv/music",
//!   "instances": [
//!     { "database": "/var/lib/mud/instance-0.db",
//!       "recognizer": { "program": "mud-fingerprint", "args": ["--strict"] } },
//!     { "database": "/var/lib/mud/instance-1.db",
//!       "recognizer": { "program": "mud-fingerprint", "args": ["--exhaustive"] } }
//!   ]
//! }
//! ```
//!
//! Every field is optional. A missing file means all defaults.

use crate::core::recognizer::CommandRecognizer;
use crate::core::scanner::{DEFAULT_MEDIA_EXTENSIONS, MediaFilter};
use crate::error::{ConfigError, PipelineError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MudConfig {
    /// Root scanned by the primary instance
    pub media_root: PathBuf,
    /// File endings treated as audio (case-insensitive)
    pub media_extensions: Vec<String>,
    /// Catalog instances; index 0 is the primary
    pub instances: Vec<InstanceConfig>,
    /// Candidate forwarding settings
    pub pipeline: PipelineConfig,
    /// Where `dedup` moves exact duplicates
    pub duplicates_target: PathBuf,
}

impl Default for MudConfig {
    fn default() -> Self {
        Self {
            media_root: dirs::audio_dir().unwrap_or_else(|| PathBuf::from(".")),
            media_extensions: DEFAULT_MEDIA_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            instances: vec![InstanceConfig::default()],
            pipeline: PipelineConfig::default(),
            duplicates_target: PathBuf::from("/var/tmp/dups"),
        }
    }
}

/// One catalog instance
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InstanceConfig {
    /// Catalog database; defaults to `<data dir>/mud/instance-<n>.db`
    pub database: Option<PathBuf>,
    /// Fingerprinting program for this instance
    pub recognizer: RecognizerConfig,
}

/// External fingerprinting program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub program: PathBuf,
    /// Arguments placed before the file path
    pub args: Vec<String>,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from("mud-fingerprint"),
            args: Vec::new(),
        }
    }
}

impl RecognizerConfig {
    /// Build the recognizer this entry describes
    pub fn recognizer(&self) -> CommandRecognizer {
        CommandRecognizer::new(self.program.clone(), self.args.clone())
    }
}

/// Candidate forwarding settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Messages buffered between the reader thread and the consumer
    pub queue_capacity: usize,
    /// Seconds to wait for the next message before giving up
    pub receive_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            receive_timeout_secs: 300,
        }
    }
}

impl PipelineConfig {
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout_secs)
    }
}

impl MudConfig {
    /// Default config file location
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|dir| dir.join("mud").join("config.json"))
            .ok_or(ConfigError::NoConfigDir)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let config: MudConfig =
            serde_json::from_str(&text).map_err(|e| ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        if config.instances.is_empty() {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "at least one instance must be configured".to_string(),
            });
        }

        Ok(config)
    }

    /// Load from `path` if given, else from the default location
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::load(&Self::default_path()?),
        }
    }

    /// Settings for instance `n`
    pub fn instance(&self, n: usize) -> Result<&InstanceConfig, PipelineError> {
        self.instances
            .get(n)
            .ok_or(PipelineError::InstanceOutOfRange {
                instance: n,
                configured: self.instances.len(),
            })
    }

    /// Catalog database path for instance `n`
    pub fn database_path(&self, n: usize) -> Result<PathBuf, crate::error::MudError> {
        let instance = self.instance(n)?;
        if let Some(path) = &instance.database {
            return Ok(path.clone());
        }
        let data_dir = dirs::data_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(data_dir.join("mud").join(format!("instance-{}.db", n)))
    }

    /// Media filter built from `media_extensions`
    pub fn media_filter(&self) -> MediaFilter {
        MediaFilter::with_extensions(&self.media_extensions)
    }
}
