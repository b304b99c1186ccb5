//! Common test utilities for tably-secure-storage tests
//!
//! Provides an isolated on-disk storage environment per test: a temporary
//! data directory plus one master key, with helpers to open independent
//! store handles over the same files (modeling separate app processes
//! sharing one installation).

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use tably_secure_storage::config::STORE_FILE_NAME;
use tably_secure_storage::storage::backend::FileStore;
use tably_secure_storage::storage::crypto::{CryptoCodec, MasterKey};
use tably_secure_storage::storage::secure::SecureStore;

/// Initialize logger for tests
///
/// Sets up env_logger honoring RUST_LOG so store and migration log output
/// is visible during test runs.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_test_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Isolated storage environment with automatic cleanup
///
/// Each environment owns a temp directory and a single master key. Every
/// handle opened through it shares the same store file and key, so tests
/// can model restarts and concurrent processes by opening several handles.
pub struct TestStoreEnv {
    /// Temporary directory (auto-cleanup on drop)
    _temp_dir: TempDir,

    /// Data directory inside the temp dir
    data_dir: PathBuf,

    /// Master key shared by every handle of this environment
    master_key: MasterKey,
}

impl TestStoreEnv {
    /// Create a fresh environment with its own key and empty store
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temporary directory for test");
        let data_dir = temp_dir.path().join("data");
        std::fs::create_dir_all(&data_dir).expect("Failed to create data directory");

        Self {
            _temp_dir: temp_dir,
            data_dir,
            master_key: MasterKey::generate(),
        }
    }

    /// Data directory path
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the store file
    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE_NAME)
    }

    /// Open a file backend over this environment's store file
    pub fn file_store(&self) -> FileStore {
        FileStore::open(self.store_path()).expect("Failed to open store file")
    }

    /// Codec using this environment's master key
    pub fn codec(&self) -> CryptoCodec {
        CryptoCodec::new(&self.master_key)
    }

    /// Open an independent secure store handle
    ///
    /// Each call builds a new handle over the same file and key, modeling
    /// separate processes sharing one installation.
    pub fn secure_store(&self) -> SecureStore {
        SecureStore::new(Box::new(self.file_store()), self.codec())
    }
}
