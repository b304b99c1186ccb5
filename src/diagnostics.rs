//! Gated diagnostics for inspecting storage state
//!
//! A typed, read-only surface for support and debugging sessions, only
//! reachable when `debug_tools` is enabled in the config. Secret values
//! are never included in any dump, only their sizes.

use serde::Serialize;

use crate::migration::MIGRATION_MARKER_KEY;
use crate::storage::classify::{self, KeyClass, LEGACY_KEYS};
use crate::storage::secure::{SecureStore, StoreError};

/// One raw store entry with its classification
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedEntry {
    /// Key as stored in the backend
    pub physical_key: String,

    /// Logical name (prefix stripped for encrypted entries)
    pub logical_key: String,

    /// Classification of the logical name
    pub class: KeyClass,

    /// Whether the entry lives in the encrypted namespace
    pub encrypted: bool,

    /// Entry value; secret material is redacted to its size
    pub value: String,
}

/// Full classified dump of the store
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedState {
    pub entries: Vec<ClassifiedEntry>,
    pub migration_complete: bool,
}

/// Dry-run preview of the legacy migration sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationPreview {
    /// Legacy keys whose plaintext value would move to the encrypted namespace
    pub would_encrypt: Vec<String>,

    /// Legacy keys whose value would be rewritten as JSON in place
    pub would_normalize: Vec<String>,

    /// Legacy keys that are absent or already canonical
    pub untouched: Vec<String>,

    /// The sweep would not run at all (marker already set)
    pub already_complete: bool,
}

/// Read-only inspection of a [`SecureStore`]
///
/// Handed out by `StorageManager::diagnostics()` and only when
/// `debug_tools` is on; nothing here can modify the store.
pub struct Diagnostics<'a> {
    store: &'a SecureStore,
}

impl<'a> Diagnostics<'a> {
    pub(crate) fn new(store: &'a SecureStore) -> Self {
        Self { store }
    }

    /// Classify every raw entry currently in the backend
    ///
    /// Values of encrypted entries, and of sensitive entries still waiting
    /// for migration, are replaced by a size marker.
    pub fn dump_classified_state(&self) -> Result<ClassifiedState, StoreError> {
        let mut entries = Vec::new();
        let mut migration_complete = false;

        for physical_key in self.store.backend().keys()? {
            let raw = match self.store.backend().get(&physical_key)? {
                Some(raw) => raw,
                None => continue,
            };

            if physical_key == MIGRATION_MARKER_KEY {
                migration_complete = true;
            }

            let (logical_key, encrypted) = match classify::logical_key_name(&physical_key) {
                Some(logical) => (logical.to_string(), true),
                None => (physical_key.clone(), false),
            };
            let class = classify::classify(&logical_key);

            let value = if encrypted || class.requires_encryption() {
                format!("[REDACTED {} bytes]", raw.len())
            } else {
                raw
            };

            entries.push(ClassifiedEntry {
                physical_key,
                logical_key,
                class,
                encrypted,
                value,
            });
        }

        Ok(ClassifiedState {
            entries,
            migration_complete,
        })
    }

    /// Preview what the migration sweep would do, without writing
    pub fn simulate_migration(&self) -> Result<MigrationPreview, StoreError> {
        if self.store.backend().get(MIGRATION_MARKER_KEY)?.is_some() {
            return Ok(MigrationPreview {
                already_complete: true,
                ..Default::default()
            });
        }

        let mut preview = MigrationPreview::default();

        for key in LEGACY_KEYS {
            let raw = match self.store.backend().get(key)? {
                Some(raw) => raw,
                None => {
                    preview.untouched.push(key.to_string());
                    continue;
                }
            };

            if classify::classify(key).requires_encryption() {
                preview.would_encrypt.push(key.to_string());
            } else if serde_json::from_str::<serde_json::Value>(&raw).is_ok() {
                preview.untouched.push(key.to_string());
            } else {
                preview.would_normalize.push(key.to_string());
            }
        }

        Ok(preview)
    }
}
