//! Groups catalog records by shared identity.
//!
//! Only the cardinality test decides what a duplicate is. Groups are
//! fetched one identity at a time as the iterator advances.

use super::DuplicateGroup;
use crate::core::catalog::{CatalogBackend, Identity};
use crate::error::CatalogError;
use tracing::warn;

/// Finds identities shared by more than one catalogued file
pub struct DuplicateGrouper<'a> {
    catalog: &'a dyn CatalogBackend,
}

impl<'a> DuplicateGrouper<'a> {
    /// Create a grouper over `catalog`
    pub fn new(catalog: &'a dyn CatalogBackend) -> Self {
        Self { catalog }
    }

    /// Lazily yield every duplicate group.
    ///
    /// Fails only if the identity list itself cannot be read. An identity
    /// whose records cannot be read is logged and left out.
    pub fn duplicate_groups(&self) -> Result<DuplicateGroups<'a>, CatalogError> {
        let identities = self.catalog.identities_in_use()?;
        Ok(DuplicateGroups {
            catalog: self.catalog,
            identities: identities.into_iter(),
        })
    }
}

/// Iterator returned by [`DuplicateGrouper::duplicate_groups`]
pub struct DuplicateGroups<'a> {
    catalog: &'a dyn CatalogBackend,
    identities: std::vec::IntoIter<Identity>,
}

impl Iterator for DuplicateGroups<'_> {
    type Item = DuplicateGroup;

    fn next(&mut self) -> Option<DuplicateGroup> {
        for identity in self.identities.by_ref() {
            match self.catalog.records_for_identity(identity) {
                Ok(records) if records.len() >= 2 => {
                    return Some(DuplicateGroup { identity, records });
                }
                Ok(_) => {}
                Err(e) => warn!(%identity, "Skipping identity: {}", e),
            }
        }
        None
    }
}
