//! Storage manager - Main integration layer
//!
//! Coordinates config, key material, the secure store, migration, and the
//! token lifecycle behind one handle.

use std::sync::Arc;

use crate::config::{ConfigError, StorageConfig, KEY_FILE_NAME, STORE_FILE_NAME};
use crate::diagnostics::Diagnostics;
use crate::migration::{MigrationReport, MigrationRunner};
use crate::storage::backend::{BackendError, FileStore, MemoryStore};
use crate::storage::crypto::{CryptoCodec, CryptoError, MasterKey};
use crate::storage::secure::{SecureStore, StoreError};
use crate::token::TokenManager;

/// Errors that can occur in the storage manager
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Main storage manager
///
/// Owns the secure store and the token manager. Opening a manager loads
/// (or creates) the master key, runs the one-shot legacy migration, and
/// leaves the store ready for reads and writes.
pub struct StorageManager {
    /// Active configuration
    config: StorageConfig,

    /// Secure store shared with the token manager
    store: Arc<SecureStore>,

    /// Session token lifecycle
    tokens: TokenManager,

    /// Report from the migration sweep performed at open
    migration: MigrationReport,
}

impl StorageManager {
    /// Open persistent storage per `config`
    ///
    /// Resolves the data directory, loads or generates the master key,
    /// opens the store file, and runs the legacy migration sweep.
    ///
    /// # Arguments
    ///
    /// * `config` - Storage configuration
    ///
    /// # Example
    ///
    /// ```ignore
    /// use tably_secure_storage::config::StorageConfig;
    /// use tably_secure_storage::manager::StorageManager;
    ///
    /// let manager = StorageManager::open(StorageConfig::default())?;
    /// manager.tokens().set_token("abc123", chrono::Duration::seconds(3600))?;
    /// ```
    pub fn open(config: StorageConfig) -> Result<Self, ManagerError> {
        let data_dir = config.resolve_data_dir()?;

        let master_key = MasterKey::load_or_generate(&data_dir.join(KEY_FILE_NAME))?;
        let codec = CryptoCodec::new(&master_key);
        let backend = FileStore::open(data_dir.join(STORE_FILE_NAME))?;
        let store = Arc::new(SecureStore::new(Box::new(backend), codec));

        Self::finish_open(config, store)
    }

    /// Open an ephemeral in-memory store
    ///
    /// Uses a freshly generated master key and a memory backend; nothing
    /// touches the filesystem and nothing survives the process. Intended
    /// for tests and kiosk-style sessions that must leave no trace.
    pub fn open_in_memory(config: StorageConfig) -> Result<Self, ManagerError> {
        let master_key = MasterKey::generate();
        let codec = CryptoCodec::new(&master_key);
        let store = Arc::new(SecureStore::new(Box::new(MemoryStore::new()), codec));

        Self::finish_open(config, store)
    }

    fn finish_open(config: StorageConfig, store: Arc<SecureStore>) -> Result<Self, ManagerError> {
        let migration = MigrationRunner::run(&store)?;
        let tokens = TokenManager::new(Arc::clone(&store));

        log::info!("✓ Secure storage ready");

        Ok(Self {
            config,
            store,
            tokens,
            migration,
        })
    }

    /// Get reference to the secure store
    pub fn store(&self) -> &SecureStore {
        &self.store
    }

    /// Get reference to the token manager
    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    /// Report from the migration sweep performed at open
    pub fn migration(&self) -> &MigrationReport {
        &self.migration
    }

    /// Get reference to the active configuration
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Diagnostics surface, present only when `debug_tools` is enabled
    pub fn diagnostics(&self) -> Option<Diagnostics<'_>> {
        if self.config.debug_tools {
            Some(Diagnostics::new(&self.store))
        } else {
            None
        }
    }
}
