//! Persistent key-value backends
//!
//! The store is a flat string-to-string map shared by every process of the
//! app. [`FileStore`] persists it as a single JSON file and re-reads the
//! file on every operation, so concurrent processes observe each other's
//! writes with last-write-wins semantics. [`MemoryStore`] keeps the same
//! contract in memory for tests and ephemeral sessions.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Backend errors
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store file corrupt: {0}")]
    Corrupt(String),
}

/// Flat key-value persistence contract
///
/// All operations are synchronous and atomic per call. When several
/// processes share one backend, concurrent writes resolve to
/// last-write-wins per operation.
pub trait StoreBackend: Send + Sync {
    /// Read the raw value stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>, BackendError>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> Result<(), BackendError>;

    /// Delete the entry under `key`
    ///
    /// Returns whether an entry existed. Removing an absent key is not an
    /// error.
    fn remove(&self, key: &str) -> Result<bool, BackendError>;

    /// All physical keys currently present, sorted
    fn keys(&self) -> Result<Vec<String>, BackendError>;
}

/// JSON-file backend
///
/// The whole store is one JSON object mapping keys to string values. Every
/// operation re-reads the file, and writes go through a temp file + rename
/// so a crash never leaves a half-written store behind. The file and its
/// directory get restrictive permissions on Unix (0600 / 0700).
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Open a file store at `path`
    ///
    /// Creates the parent directory if needed. The file itself is created
    /// lazily on first write; a missing file reads as an empty store.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(parent, fs::Permissions::from_mode(0o700))?;
            }
        }

        log::debug!("Opened store file: {}", path.display());

        Ok(Self { path })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<HashMap<String, String>, BackendError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }

        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }

        serde_json::from_str(&contents)
            .map_err(|e| BackendError::Corrupt(format!("{}: {}", self.path.display(), e)))
    }

    fn write_map(&self, map: &HashMap<String, String>) -> Result<(), BackendError> {
        let json = serde_json::to_string_pretty(map)?;

        // Write atomically (unique temp file, then rename). The suffix keeps
        // concurrent writers from renaming each other's temp file away.
        let temp_path = self.path.with_extension(format!(
            "json.tmp.{}.{}",
            std::process::id(),
            rand::random::<u32>()
        ));
        fs::write(&temp_path, json)?;
        fs::rename(&temp_path, &self.path)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = fs::metadata(&self.path)?.permissions();
            perms.set_mode(0o600);
            fs::set_permissions(&self.path, perms)?;
        }

        Ok(())
    }
}

impl StoreBackend for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        Ok(self.read_map()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut map = self.read_map()?;
        map.insert(key.to_string(), value.to_string());
        self.write_map(&map)
    }

    fn remove(&self, key: &str) -> Result<bool, BackendError> {
        let mut map = self.read_map()?;
        let existed = map.remove(key).is_some();

        if existed {
            self.write_map(&map)?;
        }

        Ok(existed)
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let mut keys: Vec<String> = self.read_map()?.into_keys().collect();
        keys.sort();
        Ok(keys)
    }
}

/// In-memory backend for tests and ephemeral sessions
///
/// Same contract as [`FileStore`], but nothing survives the process.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoreBackend for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, BackendError> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), BackendError> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, BackendError> {
        let mut entries = self.entries.lock().unwrap();
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>, BackendError> {
        let entries = self.entries.lock().unwrap();
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}
