//! Persistent key/value storage for the session record. Entries are written
//! and removed in batches so the token and the user record always change
//! together. Values include the bearer token; never log them.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access session file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed session data: {0}")]
    Format(#[from] serde_json::Error),
}

/// Backing store for the persisted session, modelled on browser local storage.
pub trait SessionStorage: Send + Sync {
    /// # Errors
    /// Returns an error if the underlying store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes all entries at once; either every entry lands or none does.
    /// # Errors
    /// Returns an error if the underlying store cannot be written.
    fn write(&self, entries: &[(&str, &str)]) -> Result<(), StorageError>;

    /// # Errors
    /// Returns an error if the underlying store cannot be written.
    fn remove(&self, keys: &[&str]) -> Result<(), StorageError>;
}

/// In-process storage, used by tests and by callers that opt out of persistence.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// Session file on disk: a flat JSON object, replaced atomically on every write.
/// The file is removed once it holds no entries.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileStorage {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(self.io_error(err)),
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(self.io_error(err)),
            };
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(|err| self.io_error(err))?;

        let payload = serde_json::to_vec_pretty(entries)?;
        // Unique sibling file (mode 0600 on unix), renamed over the target.
        let mut tmp = NamedTempFile::new_in(dir).map_err(|err| self.io_error(err))?;
        tmp.write_all(&payload).map_err(|err| self.io_error(err))?;
        tmp.as_file().sync_all().map_err(|err| self.io_error(err))?;
        tmp.persist(&self.path).map_err(|err| self.io_error(err.error))?;

        debug!("session file written: {}", self.path.display());
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.load()?.remove(key))
    }

    fn write(&self, new_entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = self.load()?;
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&entries)
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // An unreadable file is replaced rather than left holding stale credentials.
        let mut entries = self.load().unwrap_or_default();
        for key in keys {
            entries.remove(*key);
        }
        self.save(&entries)
    }
}
