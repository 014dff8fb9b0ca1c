//! # Core Module
//!
//! The duplicate detection engine.
//!
//! ## Modules
//! - `hasher` - Content digests for byte-identical detection
//! - `scanner` - Deterministic directory walks and media filtering
//! - `exact` - Finds byte-identical duplicates
//! - `relocate` - Moves duplicates aside, preserving their layout
//! - `catalog` - Per-instance store of fingerprint results
//! - `recognizer` - The external fingerprint-and-identify capability
//! - `collection` - Fills a catalog from disk and the recognizer
//! - `comparator` - Duplicate groups and duplicate albums
//! - `pipeline` - Forwards candidates between catalog instances

pub mod catalog;
pub mod collection;
pub mod comparator;
pub mod exact;
pub mod hasher;
pub mod pipeline;
pub mod recognizer;
pub mod relocate;
pub mod scanner;

// Re-export commonly used types
pub use catalog::{CatalogBackend, ErrorCode, FileRecord, Identity};
pub use comparator::DuplicateGroup;
pub use exact::ExactDuplicateScanner;
pub use relocate::Relocator;
