//! Media file filtering for the fingerprint path.

use std::collections::HashSet;
use std::path::Path;

/// Extensions treated as audio media when none are configured
pub const DEFAULT_MEDIA_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "m4a", "wav"];

/// Decides which files are audio media, by extension (case-insensitive)
#[derive(Debug, Clone)]
pub struct MediaFilter {
    /// Lowercased extensions to accept
    extensions: HashSet<String>,
}

impl MediaFilter {
    /// Create a filter with the default media extensions
    pub fn new() -> Self {
        Self::with_extensions(DEFAULT_MEDIA_EXTENSIONS.iter().map(|e| e.to_string()))
    }

    /// Create a filter accepting exactly the given extensions
    pub fn with_extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    /// Check if a file is media
    pub fn should_include(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    /// File name with a known media extension removed.
    ///
    /// Used as a stand-in title when a track carries no tag metadata.
    pub fn display_title(&self, path: &Path) -> String {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        if self.should_include(path) {
            if let Some(stem) = path.file_stem() {
                return stem.to_string_lossy().into_owned();
            }
        }

        name
    }
}

impl Default for MediaFilter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_mp3_any_case() {
        let filter = MediaFilter::new();
        assert!(filter.should_include(Path::new("/music/track.mp3")));
        assert!(filter.should_include(Path::new("/music/track.MP3")));
        assert!(filter.should_include(Path::new("/music/track.Flac")));
    }

    #[test]
    fn filter_excludes_non_media() {
        let filter = MediaFilter::new();
        assert!(!filter.should_include(Path::new("/music/file3.mp4")));
        assert!(!filter.should_include(Path::new("/music/cover.jpg")));
        assert!(!filter.should_include(Path::new("/music/no_extension")));
    }

    #[test]
    fn custom_extensions_replace_defaults() {
        let filter = MediaFilter::with_extensions([".MP3"]);
        assert!(filter.should_include(Path::new("/music/a.mp3")));
        assert!(!filter.should_include(Path::new("/music/a.flac")));
    }

    #[test]
    fn display_title_strips_media_extension() {
        let filter = MediaFilter::new();
        assert_eq!(
            filter.display_title(Path::new("/music/01 Hey Soul Sister.mp3")),
            "01 Hey Soul Sister"
        );
    }

    #[test]
    fn display_title_keeps_unknown_extension() {
        let filter = MediaFilter::new();
        assert_eq!(filter.display_title(Path::new("/music/notes.txt")), "notes.txt");
    }
}
