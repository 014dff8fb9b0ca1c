//! In-memory catalog backend for testing.

use super::{CatalogBackend, ErrorCode, FileRecord, Identity, TrackTags};
use crate::error::CatalogError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Default)]
struct State {
    // Insertion order doubles as file_id order
    records: Vec<FileRecord>,
    identities: BTreeMap<Identity, String>,
}

/// In-memory catalog backend
///
/// Behaves like [`SqliteCatalog`](super::SqliteCatalog) without persistence.
pub struct InMemoryCatalog {
    state: RwLock<State>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self {
            state: RwLock::new(State::default()),
        }
    }

    fn poisoned() -> CatalogError {
        CatalogError::Poisoned {
            path: PathBuf::from("memory"),
        }
    }

    fn update(
        &self,
        path: &Path,
        apply: impl FnOnce(&mut FileRecord),
    ) -> Result<(), CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        if let Some(record) = state.records.iter_mut().find(|r| r.path == path) {
            apply(record);
        }
        Ok(())
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBackend for InMemoryCatalog {
    fn insert(&self, path: &Path) -> Result<bool, CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        if state.records.iter().any(|r| r.path == path) {
            return Ok(false);
        }
        state.records.push(FileRecord::new(path));
        Ok(true)
    }

    fn mark_identity(
        &self,
        path: &Path,
        identity: Identity,
        tags: &TrackTags,
    ) -> Result<(), CatalogError> {
        self.update(path, |record| {
            record.identity = Some(identity);
            record.error_code = 0;
            record.artist = tags.artist.clone();
            record.title = tags.title.clone();
            record.album = tags.album.clone();
        })
    }

    fn mark_error(
        &self,
        path: &Path,
        code: ErrorCode,
        tags: &TrackTags,
    ) -> Result<(), CatalogError> {
        self.update(path, |record| {
            record.identity = None;
            record.error_code = code.code();
            record.artist = tags.artist.clone();
            record.title = tags.title.clone();
            record.album = tags.album.clone();
        })
    }

    fn register_identity(&self, identity: Identity, name: &str) -> Result<(), CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state
            .identities
            .entry(identity)
            .or_insert_with(|| name.to_string());
        Ok(())
    }

    fn unresolved_paths(&self) -> Result<Vec<PathBuf>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.identity.is_none())
            .map(|r| r.path.clone())
            .collect())
    }

    fn identities_in_use(&self) -> Result<Vec<Identity>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.identities.keys().copied().collect())
    }

    fn records_for_identity(&self, identity: Identity) -> Result<Vec<FileRecord>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.identity == Some(identity))
            .cloned()
            .collect())
    }

    fn all_records(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.records.clone())
    }

    fn count_all(&self) -> Result<usize, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.records.len())
    }

    fn count_resolved(&self) -> Result<usize, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state.records.iter().filter(|r| r.identity.is_some()).count())
    }

    fn count_errors(&self, code: ErrorCode) -> Result<usize, CatalogError> {
        let state = self.state.read().map_err(|_| Self::poisoned())?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.error() == Some(code))
            .count())
    }

    fn delete_record(&self, path: &Path) -> Result<(), CatalogError> {
        let mut state = self.state.write().map_err(|_| Self::poisoned())?;
        state.records.retain(|r| r.path != path);
        Ok(())
    }
}
