//! Catalog backend trait definition.

use super::{CatalogStats, ErrorCode, FileRecord, Identity, TrackTags};
use crate::error::CatalogError;
use std::path::{Path, PathBuf};

/// Trait for catalog backends
///
/// Every method is a single atomic operation against the store.
pub trait CatalogBackend: Send + Sync {
    /// Register a file with no identity.
    ///
    /// Returns `false` (and changes nothing) if the path is already
    /// catalogued; that is not an error.
    fn insert(&self, path: &Path) -> Result<bool, CatalogError>;

    /// Record a successful recognition
    fn mark_identity(
        &self,
        path: &Path,
        identity: Identity,
        tags: &TrackTags,
    ) -> Result<(), CatalogError>;

    /// Record a failed recognition; the identity is left unset
    fn mark_error(&self, path: &Path, code: ErrorCode, tags: &TrackTags)
        -> Result<(), CatalogError>;

    /// Record an identity the recognizer knows about in the wrapped
    /// identity store. Registering twice is a no-op.
    fn register_identity(&self, identity: Identity, name: &str) -> Result<(), CatalogError>;

    /// Paths of all records without an identity
    fn unresolved_paths(&self) -> Result<Vec<PathBuf>, CatalogError>;

    /// Every identity in the identity store, whether or not any record uses it
    fn identities_in_use(&self) -> Result<Vec<Identity>, CatalogError>;

    /// Records sharing `identity`, in insertion order
    fn records_for_identity(&self, identity: Identity) -> Result<Vec<FileRecord>, CatalogError>;

    /// All records, in insertion order
    fn all_records(&self) -> Result<Vec<FileRecord>, CatalogError>;

    /// Number of records
    fn count_all(&self) -> Result<usize, CatalogError>;

    /// Number of records with an identity
    fn count_resolved(&self) -> Result<usize, CatalogError>;

    /// Number of unresolved records carrying `code`
    fn count_errors(&self, code: ErrorCode) -> Result<usize, CatalogError>;

    /// Forget a record
    fn delete_record(&self, path: &Path) -> Result<(), CatalogError>;

    /// All counts at once
    fn stats(&self) -> Result<CatalogStats, CatalogError> {
        let total = self.count_all()?;
        let resolved = self.count_resolved()?;
        Ok(CatalogStats {
            total,
            resolved,
            unresolved: total.saturating_sub(resolved),
            could_not_decode: self.count_errors(ErrorCode::CouldNotDecode)?,
            no_match: self.count_errors(ErrorCode::NoMatch)?,
        })
    }
}
