//! # Catalog Module
//!
//! Persists, per audio file, what the fingerprinting capability said
//! about it.
//!
//! ## Invariants
//! - A path appears at most once per catalog (inserting twice is a no-op)
//! - Many paths may share one [`Identity`]; that is what a duplicate is
//! - `error_code` is only meaningful while `identity` is unset
//!
//! Records are only deleted when the file is gone from disk. Nothing
//! here ever touches the audio files themselves.
//!
//! ## Backends
//! - `SqliteCatalog` - Persistent storage using SQLite, one file per instance
//! - `InMemoryCatalog` - For testing
//!
//! Query methods return snapshots taken when they are called. Calling
//! again re-runs the query; mutating the catalog while walking a
//! snapshot has no defined effect on it.

mod memory;
mod sqlite;
mod stored_path;
mod traits;

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;
pub use traits::CatalogBackend;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// An opaque, positive fingerprint identity minted by the recognizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Identity(i64);

impl Identity {
    /// Wrap a raw identity; `None` unless it is positive
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    /// The raw identity value
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for Identity {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Identity::new(value).ok_or_else(|| format!("identity must be positive, got {}", value))
    }
}

impl From<Identity> for i64 {
    fn from(identity: Identity) -> Self {
        identity.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a file has no identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(i64)]
pub enum ErrorCode {
    /// The recognizer could not decode the file (unsupported or corrupt)
    CouldNotDecode = -1,
    /// The recognizer decoded the file but found no match
    NoMatch = -2,
}

impl ErrorCode {
    /// Every error code, for statistics
    pub const ALL: [ErrorCode; 2] = [ErrorCode::CouldNotDecode, ErrorCode::NoMatch];

    /// The stored integer value
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Decode a stored value; 0 and unknown values are `None`
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(ErrorCode::CouldNotDecode),
            -2 => Some(ErrorCode::NoMatch),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCode::CouldNotDecode => write!(f, "could not decode"),
            ErrorCode::NoMatch => write!(f, "no match"),
        }
    }
}

/// Descriptive tags stored alongside a record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackTags {
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl TrackTags {
    /// True when no tag carries any text
    pub fn is_empty(&self) -> bool {
        self.artist.is_empty() && self.title.is_empty() && self.album.is_empty()
    }
}

/// One catalogued file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Absolute path; unique within a catalog
    #[serde(with = "stored_path")]
    pub path: PathBuf,
    /// Fingerprint identity, once resolved
    pub identity: Option<Identity>,
    /// 0, or a negative [`ErrorCode`] value
    pub error_code: i64,
    pub artist: String,
    pub title: String,
    pub album: String,
}

impl FileRecord {
    /// A freshly inserted, unresolved record
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            identity: None,
            error_code: 0,
            artist: String::new(),
            title: String::new(),
            album: String::new(),
        }
    }

    /// The recorded failure, if the record is unresolved and has one
    pub fn error(&self) -> Option<ErrorCode> {
        if self.identity.is_some() {
            return None;
        }
        ErrorCode::from_code(self.error_code)
    }
}

/// Aggregate counts for progress reporting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogStats {
    /// Total records
    pub total: usize,
    /// Records with an identity
    pub resolved: usize,
    /// Records without an identity
    pub unresolved: usize,
    /// Unresolved records the recognizer could not decode
    pub could_not_decode: usize,
    /// Unresolved records with no match
    pub no_match: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_must_be_positive() {
        assert!(Identity::new(0).is_none());
        assert!(Identity::new(-3).is_none());
        assert_eq!(Identity::new(7).map(Identity::get), Some(7));
    }

    #[test]
    fn identity_deserialization_rejects_non_positive() {
        assert!(serde_json::from_str::<Identity>("0").is_err());
        assert_eq!(serde_json::from_str::<Identity>("12").unwrap().get(), 12);
    }

    #[test]
    fn error_codes_round_trip_through_storage_value() {
        for code in ErrorCode::ALL {
            assert_eq!(ErrorCode::from_code(code.code()), Some(code));
        }
        assert_eq!(ErrorCode::from_code(0), None);
        assert_eq!(ErrorCode::from_code(-99), None);
    }

    #[test]
    fn error_is_ignored_once_identity_is_set() {
        let mut record = FileRecord::new("/music/a.mp3");
        record.error_code = ErrorCode::NoMatch.code();
        assert_eq!(record.error(), Some(ErrorCode::NoMatch));

        record.identity = Identity::new(4);
        assert_eq!(record.error(), None);
    }
}
