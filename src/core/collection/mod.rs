//! # Collection Module
//!
//! Keeps one instance's catalog in step with the media on disk and
//! with what the recognizer says about it.
//!
//! ## Workflow
//! 1. `scan` registers every media file below the media root (primary
//!    instance only; later instances are fed by candidate forwarding)
//! 2. `build_collection` resolves every unresolved record through the
//!    recognizer and records the outcome
//! 3. `check_files_exist` forgets records whose file has disappeared

use crate::core::catalog::{CatalogBackend, CatalogStats, ErrorCode, Identity, TrackTags};
use crate::core::recognizer::{Recognition, Recognizer};
use crate::core::scanner::{MediaFilter, ScanConfig, TreeWalker};
use crate::error::{PipelineError, RecognizerError, Result, ScanError};
use crate::events::{
    Event, EventSender, FingerprintEvent, FingerprintProgress, null_sender,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Instance number of the primary instance, the only one that scans
pub const PRIMARY_INSTANCE: usize = 0;

/// Outcome of resolving one path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The recognizer returned an identity
    Identified {
        identity: Identity,
        name: String,
        tags: TrackTags,
    },
    /// The file stays unresolved, for this reason
    Failed { code: ErrorCode, tags: TrackTags },
}

/// Result of a `scan`
#[derive(Debug, Default)]
pub struct ScanSummary {
    /// Media files seen below the root
    pub media_files: usize,
    /// Files newly added to the catalog
    pub inserted: usize,
    /// Tree entries that could not be listed
    pub errors: Vec<ScanError>,
}

/// Result of a `build_collection` pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub identified: usize,
    pub could_not_decode: usize,
    pub no_match: usize,
}

/// Scans media into a catalog and resolves identities
pub struct FingerprintCollectionBuilder<'a> {
    instance: usize,
    catalog: &'a dyn CatalogBackend,
    walker: TreeWalker,
    filter: MediaFilter,
}

impl<'a> FingerprintCollectionBuilder<'a> {
    /// Create a builder for `instance` over `catalog`
    pub fn new(instance: usize, catalog: &'a dyn CatalogBackend) -> Self {
        Self {
            instance,
            catalog,
            walker: TreeWalker::new(ScanConfig::default()),
            filter: MediaFilter::new(),
        }
    }

    /// Set which files count as media
    pub fn filter(mut self, filter: MediaFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the walk configuration
    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.walker = TreeWalker::new(config);
        self
    }

    /// The instance this builder serves
    pub fn instance(&self) -> usize {
        self.instance
    }

    /// Register every media file below `media_root`
    pub fn scan(&self, media_root: &Path) -> Result<ScanSummary> {
        self.scan_with_events(media_root, &null_sender())
    }

    /// [`scan`](Self::scan) with progress events.
    ///
    /// Fails with `ScanNotPermitted` on any instance but the primary.
    /// Re-running over an unchanged tree adds nothing.
    pub fn scan_with_events(&self, media_root: &Path, events: &EventSender) -> Result<ScanSummary> {
        if self.instance != PRIMARY_INSTANCE {
            return Err(PipelineError::ScanNotPermitted {
                instance: self.instance,
            }
            .into());
        }

        info!(root = %media_root.display(), "Scanning for media files");
        let (media, errors) = self.walker.media_files(media_root, &self.filter, events)?;

        let mut inserted = 0;
        for path in &media {
            if self.catalog.insert(path)? {
                debug!(path = %path.display(), "Registered");
                inserted += 1;
            }
        }

        info!(media_files = media.len(), inserted, "Scan complete");

        Ok(ScanSummary {
            media_files: media.len(),
            inserted,
            errors,
        })
    }

    /// Ask the recognizer about one file.
    ///
    /// Output the recognizer produced but that cannot be read counts as a
    /// decode failure for this file only. Only a recognizer that cannot
    /// run at all is an error.
    pub fn resolve(&self, recognizer: &dyn Recognizer, path: &Path) -> Result<Resolution> {
        let recognition = match recognizer.recognize(path) {
            Ok(recognition) => recognition,
            Err(e @ RecognizerError::InvalidOutput { .. }) => {
                warn!(path = %path.display(), "Unreadable recognizer output: {}", e);
                Recognition::DecodeFailure {
                    reason: e.to_string(),
                }
            }
            Err(e) => return Err(e.into()),
        };

        let resolution = match recognition {
            Recognition::Identified {
                identity,
                name,
                tags,
            } => Resolution::Identified {
                identity,
                name,
                tags,
            },
            Recognition::NoMatch { tags } => Resolution::Failed {
                code: ErrorCode::NoMatch,
                tags: self.with_fallback_title(path, tags),
            },
            Recognition::DecodeFailure { reason } => {
                debug!(path = %path.display(), reason = %reason, "Could not decode");
                Resolution::Failed {
                    code: ErrorCode::CouldNotDecode,
                    tags: self.with_fallback_title(path, TrackTags::default()),
                }
            }
        };
        Ok(resolution)
    }

    fn with_fallback_title(&self, path: &Path, mut tags: TrackTags) -> TrackTags {
        if tags.title.is_empty() {
            tags.title = self.filter.display_title(path);
        }
        tags
    }

    /// Resolve every unresolved record
    pub fn build_collection(&self, recognizer: &dyn Recognizer) -> Result<BuildSummary> {
        self.build_collection_with_events(recognizer, &null_sender())
    }

    /// [`build_collection`](Self::build_collection) with progress events.
    ///
    /// Decode failures and misses are recorded as error codes and the pass
    /// continues. A recognizer that cannot run at all aborts the pass;
    /// records resolved so far stay resolved.
    pub fn build_collection_with_events(
        &self,
        recognizer: &dyn Recognizer,
        events: &EventSender,
    ) -> Result<BuildSummary> {
        let pending = self.catalog.unresolved_paths()?;
        let total = pending.len();
        info!(instance = self.instance, files = total, "Building collection");

        events.send(Event::Fingerprint(FingerprintEvent::Started { total_files: total }));

        let mut summary = BuildSummary::default();
        for (i, path) in pending.into_iter().enumerate() {
            events.send(Event::Fingerprint(FingerprintEvent::Progress(
                FingerprintProgress {
                    completed: i + 1,
                    total,
                    current_path: path.clone(),
                },
            )));

            match self.resolve(recognizer, &path)? {
                Resolution::Identified {
                    identity,
                    name,
                    tags,
                } => {
                    self.catalog.register_identity(identity, &name)?;
                    self.catalog.mark_identity(&path, identity, &tags)?;
                    debug!(path = %path.display(), %identity, "Identified");
                    events.send(Event::Fingerprint(FingerprintEvent::Identified {
                        path,
                        identity: identity.get(),
                    }));
                    summary.identified += 1;
                }
                Resolution::Failed { code, tags } => {
                    self.catalog.mark_error(&path, code, &tags)?;
                    debug!(path = %path.display(), error = %code, "Unresolved");
                    match code {
                        ErrorCode::CouldNotDecode => summary.could_not_decode += 1,
                        ErrorCode::NoMatch => summary.no_match += 1,
                    }
                    events.send(Event::Fingerprint(FingerprintEvent::Unresolved {
                        path,
                        error_code: code.code(),
                    }));
                }
            }
        }

        events.send(Event::Fingerprint(FingerprintEvent::Completed {
            identified: summary.identified,
            unresolved: summary.could_not_decode + summary.no_match,
        }));

        info!(
            identified = summary.identified,
            could_not_decode = summary.could_not_decode,
            no_match = summary.no_match,
            "Collection built"
        );
        Ok(summary)
    }

    /// Forget records whose file is gone. Never touches the filesystem.
    ///
    /// Returns the removed paths.
    pub fn check_files_exist(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();
        for record in self.catalog.all_records()? {
            if record.path.is_file() {
                continue;
            }
            match self.catalog.delete_record(&record.path) {
                Ok(()) => {
                    info!(path = %record.path.display(), "Removed missing file from catalog");
                    removed.push(record.path);
                }
                Err(e) => warn!(path = %record.path.display(), "Could not remove record: {}", e),
            }
        }
        Ok(removed)
    }

    /// Catalog counts
    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(self.catalog.stats()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::InMemoryCatalog;
    use crate::error::MudError;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Recognizer answering from a fixed table keyed by file name
    #[derive(Default)]
    struct FakeRecognizer {
        answers: HashMap<String, Recognition>,
        garbled: HashSet<String>,
        calls: Mutex<Vec<PathBuf>>,
    }

    impl FakeRecognizer {
        fn answer(mut self, name: &str, recognition: Recognition) -> Self {
            self.answers.insert(name.to_string(), recognition);
            self
        }

        fn garble(mut self, name: &str) -> Self {
            self.garbled.insert(name.to_string());
            self
        }

        fn identify(self, name: &str, identity: i64) -> Self {
            self.answer(
                name,
                Recognition::Identified {
                    identity: Identity::new(identity).unwrap(),
                    name: format!("song {}", identity),
                    tags: TrackTags {
                        title: format!("song {}", identity),
                        ..Default::default()
                    },
                },
            )
        }
    }

    impl Recognizer for FakeRecognizer {
        fn recognize(&self, path: &Path) -> std::result::Result<Recognition, RecognizerError> {
            self.calls.lock().unwrap().push(path.to_path_buf());
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if self.garbled.contains(&name) {
                return Err(RecognizerError::InvalidOutput {
                    path: path.to_path_buf(),
                    reason: "expected value at line 1 column 1".to_string(),
                });
            }
            Ok(self
                .answers
                .get(&name)
                .cloned()
                .unwrap_or(Recognition::NoMatch {
                    tags: TrackTags::default(),
                }))
        }
    }

    struct BrokenRecognizer;

    impl Recognizer for BrokenRecognizer {
        fn recognize(&self, _path: &Path) -> std::result::Result<Recognition, RecognizerError> {
            Err(RecognizerError::Unavailable {
                program: PathBuf::from("fpcalc"),
                reason: "not installed".to_string(),
            })
        }
    }

    fn media_tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let album = temp_dir.path().join("artist/album");
        fs::create_dir_all(&album).unwrap();
        fs::write(album.join("01.mp3"), b"one").unwrap();
        fs::write(album.join("02.FLAC"), b"two").unwrap();
        fs::write(album.join("cover.jpg"), b"img").unwrap();
        temp_dir
    }

    #[test]
    fn scan_registers_media_only() {
        let root = media_tree();
        let catalog = InMemoryCatalog::new();
        let builder = FingerprintCollectionBuilder::new(0, &catalog);

        let summary = builder.scan(root.path()).unwrap();

        assert_eq!(summary.media_files, 2);
        assert_eq!(summary.inserted, 2);
        assert_eq!(catalog.count_all().unwrap(), 2);
    }

    #[test]
    fn rescan_of_unchanged_tree_adds_nothing() {
        let root = media_tree();
        let catalog = InMemoryCatalog::new();
        let builder = FingerprintCollectionBuilder::new(0, &catalog);

        builder.scan(root.path()).unwrap();
        let again = builder.scan(root.path()).unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(catalog.count_all().unwrap(), 2);
    }

    #[test]
    fn scan_is_refused_on_secondary_instance() {
        let root = media_tree();
        let catalog = InMemoryCatalog::new();
        let builder = FingerprintCollectionBuilder::new(1, &catalog);

        let result = builder.scan(root.path());

        assert!(matches!(
            result,
            Err(MudError::Pipeline(PipelineError::ScanNotPermitted { instance: 1 }))
        ));
        assert_eq!(catalog.count_all().unwrap(), 0);
    }

    #[test]
    fn decode_failure_resolves_to_could_not_decode() {
        let catalog = InMemoryCatalog::new();
        let builder = FingerprintCollectionBuilder::new(0, &catalog);
        let recognizer = FakeRecognizer::default().answer(
            "bad.mp3",
            Recognition::DecodeFailure {
                reason: "corrupt".to_string(),
            },
        );

        let resolution = builder
            .resolve(&recognizer, Path::new("/music/bad.mp3"))
            .unwrap();

        assert_eq!(
            resolution,
            Resolution::Failed {
                code: ErrorCode::CouldNotDecode,
                tags: TrackTags {
                    title: "bad".to_string(),
                    ..Default::default()
                },
            }
        );
    }

    #[test]
    fn build_collection_records_every_outcome() {
        let catalog = InMemoryCatalog::new();
        for p in ["/m/a.mp3", "/m/b.mp3", "/m/c.mp3", "/m/d.mp3"] {
            catalog.insert(Path::new(p)).unwrap();
        }
        let recognizer = FakeRecognizer::default()
            .identify("a.mp3", 10)
            .identify("b.mp3", 10)
            .answer(
                "c.mp3",
                Recognition::DecodeFailure {
                    reason: "bad header".to_string(),
                },
            );

        let builder = FingerprintCollectionBuilder::new(0, &catalog);
        let summary = builder.build_collection(&recognizer).unwrap();

        assert_eq!(
            summary,
            BuildSummary {
                identified: 2,
                could_not_decode: 1,
                no_match: 1,
            }
        );
        assert_eq!(catalog.count_errors(ErrorCode::CouldNotDecode).unwrap(), 1);
        assert_eq!(catalog.count_errors(ErrorCode::NoMatch).unwrap(), 1);
        assert_eq!(
            catalog.identities_in_use().unwrap(),
            vec![Identity::new(10).unwrap()]
        );
        assert_eq!(recognizer.calls.lock().unwrap().len(), 4);
    }

    #[test]
    fn resolved_records_are_not_recognized_again() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(Path::new("/m/a.mp3")).unwrap();
        let recognizer = FakeRecognizer::default().identify("a.mp3", 3);
        let builder = FingerprintCollectionBuilder::new(0, &catalog);

        builder.build_collection(&recognizer).unwrap();
        builder.build_collection(&recognizer).unwrap();

        assert_eq!(recognizer.calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn unavailable_recognizer_aborts_the_pass() {
        let catalog = InMemoryCatalog::new();
        catalog.insert(Path::new("/m/a.mp3")).unwrap();
        let builder = FingerprintCollectionBuilder::new(0, &catalog);

        let result = builder.build_collection(&BrokenRecognizer);

        assert!(matches!(result, Err(MudError::Recognizer(_))));
        assert_eq!(catalog.unresolved_paths().unwrap().len(), 1);
    }

    #[test]
    fn unreadable_output_for_one_file_does_not_stop_the_pass() {
        let catalog = InMemoryCatalog::new();
        for p in ["/m/a.mp3", "/m/b.mp3", "/m/c.mp3"] {
            catalog.insert(Path::new(p)).unwrap();
        }
        let recognizer = FakeRecognizer::default()
            .garble("a.mp3")
            .identify("b.mp3", 7)
            .identify("c.mp3", 7);
        let builder = FingerprintCollectionBuilder::new(0, &catalog);

        let summary = builder.build_collection(&recognizer).unwrap();

        assert_eq!(summary.identified, 2);
        assert_eq!(summary.could_not_decode, 1);
        assert_eq!(catalog.unresolved_paths().unwrap(), vec![PathBuf::from("/m/a.mp3")]);
        assert_eq!(catalog.count_errors(ErrorCode::CouldNotDecode).unwrap(), 1);
        assert_eq!(catalog.records_for_identity(Identity::new(7).unwrap()).unwrap().len(), 2);
    }

    #[test]
    fn check_files_exist_forgets_missing_files() {
        let root = media_tree();
        let catalog = InMemoryCatalog::new();
        let builder = FingerprintCollectionBuilder::new(0, &catalog);
        builder.scan(root.path()).unwrap();

        let gone = root.path().join("artist/album/01.mp3");
        fs::remove_file(&gone).unwrap();

        let removed = builder.check_files_exist().unwrap();

        assert_eq!(removed, vec![gone]);
        assert_eq!(catalog.count_all().unwrap(), 1);
        assert!(root.path().join("artist/album/02.FLAC").exists());
    }
}
