//! Classification-routed secure storage facade
//!
//! [`SecureStore`] is the single entry point for reading and writing app
//! state. Callers use logical key names; the facade classifies each key,
//! encrypts PII and auth values, and routes them to the `encrypted_`
//! namespace while general values stay as plain JSON under the bare name.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::storage::backend::{BackendError, StoreBackend};
use crate::storage::classify;
use crate::storage::crypto::{CryptoCodec, CryptoError};

/// Facade errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Secure storage facade over a [`StoreBackend`]
///
/// Routing is decided per key by [`classify`](crate::storage::classify):
/// PII and auth values are serialized to JSON, encrypted, and stored under
/// `encrypted_<key>`; general values are stored as plain JSON under the
/// bare key. The same logical key is never written under both namespaces.
///
/// Reads are forgiving: an entry that fails to decrypt or parse is logged
/// and reported as absent rather than failing the caller. Only backend I/O
/// errors surface as `Err`.
pub struct SecureStore {
    backend: Box<dyn StoreBackend>,
    codec: CryptoCodec,
}

impl SecureStore {
    /// Create a facade over `backend`, encrypting with `codec`
    pub fn new(backend: Box<dyn StoreBackend>, codec: CryptoCodec) -> Self {
        Self { backend, codec }
    }

    /// Store `value` under the logical key `key`
    ///
    /// The value is serialized to JSON and, for PII/auth keys, encrypted
    /// before it reaches the backend. Writing a sensitive key does not
    /// touch any legacy plaintext entry under the bare name; the migration
    /// sweep owns legacy cleanup.
    ///
    /// # Example
    ///
    /// ```ignore
    /// store.set("theme", "dark")?;
    /// store.set("email", "ayse@example.com")?;  // lands encrypted
    /// ```
    pub fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let class = classify::classify(key);

        if class.requires_encryption() {
            let encoded = self.codec.encode(value)?;
            self.backend
                .set(&classify::encrypted_key_name(key), &encoded)?;
            log::debug!("✓ Stored {} ({}, encrypted)", key, class.as_str());
        } else {
            let json = serde_json::to_string(value)?;
            self.backend.set(key, &json)?;
            log::debug!("✓ Stored {} (general, plain)", key);
        }

        Ok(())
    }

    /// Read the value stored under the logical key `key`
    ///
    /// Returns `Ok(None)` when the key is absent, and also when the stored
    /// entry cannot be decrypted or parsed as `T` (logged at warn level).
    /// Callers cannot tell an unreadable secret from a missing one; they
    /// fall back to re-authentication or defaults instead of crashing on
    /// stale data.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let class = classify::classify(key);

        if class.requires_encryption() {
            let raw = match self.backend.get(&classify::encrypted_key_name(key))? {
                Some(raw) => raw,
                None => return Ok(None),
            };

            match self.codec.decode(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    log::warn!("Unreadable entry for {} treated as absent: {}", key, e);
                    Ok(None)
                }
            }
        } else {
            let raw = match self.backend.get(key)? {
                Some(raw) => raw,
                None => return Ok(None),
            };

            match serde_json::from_str(&raw) {
                Ok(value) => Ok(Some(value)),
                Err(e) => {
                    log::warn!("Malformed entry for {} treated as absent: {}", key, e);
                    Ok(None)
                }
            }
        }
    }

    /// Delete the logical key `key` from both namespaces
    ///
    /// Removes the bare entry and the `encrypted_` entry so no stale
    /// representation survives a classification change. Returns whether
    /// anything was actually deleted.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let removed_plain = self.backend.remove(key)?;
        let removed_encrypted = self.backend.remove(&classify::encrypted_key_name(key))?;
        let removed = removed_plain || removed_encrypted;

        if removed {
            log::debug!("✓ Removed {}", key);
        }

        Ok(removed)
    }

    /// Logical names of all entries currently stored encrypted
    pub fn encrypted_keys(&self) -> Result<Vec<String>, StoreError> {
        let keys = self.backend.keys()?;
        Ok(keys
            .iter()
            .filter_map(|k| classify::logical_key_name(k))
            .map(|k| k.to_string())
            .collect())
    }

    /// Raw backend access for migration and diagnostics
    pub(crate) fn backend(&self) -> &dyn StoreBackend {
        self.backend.as_ref()
    }
}
