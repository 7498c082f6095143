//! Durable string key/value stores backing the geocode cache.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, RwLock};

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::StoreError;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS geocode_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);
";

/// Files SQLite may leave beside the database.
const SIDECAR_SUFFIXES: &[&str] = &["", "-journal", "-wal", "-shm"];

/// Minimal get/put/delete contract for cache persistence.
///
/// `reset` discards every entry and reinitializes the backing storage; the
/// cache calls it when a write reports corruption. Methods may block:
/// [`GeocodeCache`](super::GeocodeCache) runs them on tokio's blocking pool.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Inserts or replaces `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write fails.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`; absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the delete fails.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage cannot be recreated.
    fn reset(&self) -> Result<(), StoreError>;
}

/// SQLite-file store. Survives process restarts.
pub struct SqliteStore {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) the store at `path`.
    ///
    /// A file that exists but is not a usable database is deleted and
    /// recreated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the parent directory cannot be created or the
    /// database cannot be initialized even after recreation.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let conn = match open_connection(&path) {
            Ok(conn) => conn,
            Err(err) if err.is_corruption() => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "geocode cache file unreadable; recreating"
                );
                remove_database_files(&path)?;
                open_connection(&path)?
            }
            Err(err) => return Err(err),
        };

        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM geocode_cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO geocode_cache (key, value, updated_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM geocode_cache WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        // Release the file handle before deleting the files under it.
        let placeholder = Connection::open_in_memory()?;
        drop(std::mem::replace(&mut *conn, placeholder));
        remove_database_files(&self.path)?;
        *conn = open_connection(&self.path)?;
        tracing::info!(path = %self.path.display(), "geocode cache store recreated");
        Ok(())
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(SCHEMA)?;
    Ok(conn)
}

fn remove_database_files(path: &Path) -> Result<(), StoreError> {
    for suffix in SIDECAR_SUFFIXES {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(suffix);
        let file = PathBuf::from(name);
        match std::fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    path: file.display().to_string(),
                    source,
                })
            }
        }
    }
    Ok(())
}

/// In-process store for tests and one-shot runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |e| e.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn reset(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_| StoreError::Poisoned)?;
        entries.clear();
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(key, value)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        (**self).delete(key)
    }

    fn reset(&self) -> Result<(), StoreError> {
        (**self).reset()
    }
}
