//! SQLite catalog backend for persistent storage.

use super::stored_path;
use super::{CatalogBackend, ErrorCode, FileRecord, Identity, TrackTags};
use crate::error::CatalogError;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS identities (
        identity INTEGER PRIMARY KEY,
        name TEXT NOT NULL DEFAULT ''
    );
    CREATE TABLE IF NOT EXISTS song_files (
        file_id INTEGER PRIMARY KEY AUTOINCREMENT,
        file_path BLOB NOT NULL UNIQUE,
        identity INTEGER NULL,
        error_code INTEGER NOT NULL DEFAULT 0,
        artist TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        album TEXT NOT NULL DEFAULT ''
    );
    CREATE INDEX IF NOT EXISTS idx_song_files_identity ON song_files(identity);
";

const RECORD_COLUMNS: &str = "file_path, identity, error_code, artist, title, album";

/// SQLite-backed catalog, one database file per instance
///
/// Uses WAL mode so a reader in another process is not blocked by writes.
/// The connection never leaves this process. Paths are stored as raw
/// bytes, so names that are not UTF-8 round-trip unchanged.
pub struct SqliteCatalog {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteCatalog {
    /// Open or create a catalog database at the given path
    pub fn open(path: &Path) -> Result<Self, CatalogError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CatalogError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| CatalogError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        debug!(path = %path.display(), "Opened catalog");

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, CatalogError> {
        self.conn.lock().map_err(|_| CatalogError::Poisoned {
            path: self.db_path.clone(),
        })
    }

    fn record_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
        Ok(FileRecord {
            path: stored_path::from_bytes(row.get(0)?),
            identity: row.get::<_, Option<i64>>(1)?.and_then(Identity::new),
            error_code: row.get(2)?,
            artist: row.get(3)?,
            title: row.get(4)?,
            album: row.get(5)?,
        })
    }

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<usize, CatalogError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl CatalogBackend for SqliteCatalog {
    fn insert(&self, path: &Path) -> Result<bool, CatalogError> {
        let conn = self.lock()?;
        let key = stored_path::to_bytes(path);

        let inserted = conn.execute(
            "INSERT OR IGNORE INTO song_files (file_path) VALUES (?)",
            params![&*key],
        )?;

        Ok(inserted > 0)
    }

    fn mark_identity(
        &self,
        path: &Path,
        identity: Identity,
        tags: &TrackTags,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let key = stored_path::to_bytes(path);

        let updated = conn.execute(
            "UPDATE song_files
             SET identity = ?, error_code = 0, artist = ?, title = ?, album = ?
             WHERE file_path = ?",
            params![identity.get(), tags.artist, tags.title, tags.album, &*key],
        )?;

        if updated == 0 {
            debug!(path = %path.display(), "mark_identity on uncatalogued path");
        }
        Ok(())
    }

    fn mark_error(
        &self,
        path: &Path,
        code: ErrorCode,
        tags: &TrackTags,
    ) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let key = stored_path::to_bytes(path);

        let updated = conn.execute(
            "UPDATE song_files
             SET identity = NULL, error_code = ?, artist = ?, title = ?, album = ?
             WHERE file_path = ?",
            params![code.code(), tags.artist, tags.title, tags.album, &*key],
        )?;

        if updated == 0 {
            debug!(path = %path.display(), "mark_error on uncatalogued path");
        }
        Ok(())
    }

    fn register_identity(&self, identity: Identity, name: &str) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO identities (identity, name) VALUES (?, ?)",
            params![identity.get(), name],
        )?;
        Ok(())
    }

    fn unresolved_paths(&self) -> Result<Vec<PathBuf>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT file_path FROM song_files WHERE identity IS NULL ORDER BY file_id",
        )?;
        let paths = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0).map(stored_path::from_bytes))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(paths)
    }

    fn identities_in_use(&self) -> Result<Vec<Identity>, CatalogError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT identity FROM identities ORDER BY identity")?;
        let raw = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(raw
            .into_iter()
            .filter_map(|value| {
                let identity = Identity::new(value);
                if identity.is_none() {
                    warn!(value, db = %self.db_path.display(), "Ignoring non-positive identity");
                }
                identity
            })
            .collect())
    }

    fn records_for_identity(&self, identity: Identity) -> Result<Vec<FileRecord>, CatalogError> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM song_files WHERE identity = ? ORDER BY file_id",
            RECORD_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([identity.get()], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn all_records(&self) -> Result<Vec<FileRecord>, CatalogError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM song_files ORDER BY file_id", RECORD_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map([], Self::record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn count_all(&self) -> Result<usize, CatalogError> {
        self.count("SELECT COUNT(*) FROM song_files", [])
    }

    fn count_resolved(&self) -> Result<usize, CatalogError> {
        self.count(
            "SELECT COUNT(*) FROM song_files WHERE identity IS NOT NULL",
            [],
        )
    }

    fn count_errors(&self, code: ErrorCode) -> Result<usize, CatalogError> {
        self.count(
            "SELECT COUNT(*) FROM song_files WHERE identity IS NULL AND error_code = ?",
            [code.code()],
        )
    }

    fn delete_record(&self, path: &Path) -> Result<(), CatalogError> {
        let conn = self.lock()?;
        let key = stored_path::to_bytes(path);
        conn.execute("DELETE FROM song_files WHERE file_path = ?", params![&*key])?;
        Ok(())
    }
}

impl SqliteCatalog {
    /// Look up one record by path
    pub fn record(&self, path: &Path) -> Result<Option<FileRecord>, CatalogError> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM song_files WHERE file_path = ?", RECORD_COLUMNS);
        let key = stored_path::to_bytes(path);
        let record = conn
            .query_row(&sql, params![&*key], Self::record_from_row)
            .optional()?;
        Ok(record)
    }
}
