//! Session token lifecycle
//!
//! [`TokenManager`] fronts the secure store with an in-memory cache so the
//! hot path (every authenticated request asks for the token) rarely
//! touches the backend. All failure modes collapse to "no token": an
//! expired, corrupted, or unreadable record reads as a logged-out session
//! and the caller re-authenticates.

use std::sync::{Arc, Mutex};

use chrono::{Duration, Utc};

use crate::storage::classify::StorageKeys;
use crate::storage::models::TokenRecord;
use crate::storage::secure::{SecureStore, StoreError};

/// Memory-first manager for the session token
///
/// The cached record is authoritative while valid; the persisted record
/// takes over when the cache is cold, cleared, or stale. Deleting from
/// the store is reserved for a persisted record that was read and seen
/// expired, so a session refreshed by another process is never destroyed.
pub struct TokenManager {
    store: Arc<SecureStore>,
    cached: Mutex<Option<TokenRecord>>,
}

impl TokenManager {
    /// Create a manager with a cold cache over `store`
    pub fn new(store: Arc<SecureStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// Store a fresh token valid for `lifetime` from now
    ///
    /// Persists the record (encrypted) and adopts it into the cache.
    pub fn set_token(&self, value: &str, lifetime: Duration) -> Result<(), StoreError> {
        let record = TokenRecord::new(value.to_string(), lifetime);
        self.store.set(StorageKeys::TOKEN, &record)?;

        let mut cached = self.cached.lock().unwrap();
        *cached = Some(record);

        log::debug!(
            "✓ Stored session token (lifetime {}s)",
            lifetime.num_seconds()
        );
        Ok(())
    }

    /// Current valid token value, or `None` when logged out
    ///
    /// Checks the cache first; when the cached record is missing or
    /// expired the store decides, so a newer token persisted by another
    /// process is adopted rather than discarded. Every failure (expired,
    /// absent, undecryptable, backend error) returns `None`; this method
    /// never surfaces an error to the caller.
    ///
    /// # Example
    ///
    /// ```ignore
    /// match manager.tokens().get_token() {
    ///     Some(token) => request.bearer_auth(token),
    ///     None => return Err(ApiError::NotAuthenticated),
    /// }
    /// ```
    pub fn get_token(&self) -> Option<String> {
        let now = Utc::now();
        let mut cached = self.cached.lock().unwrap();

        if let Some(record) = cached.as_ref() {
            if record.is_valid_at(now) {
                return Some(record.value.clone());
            }

            log::debug!(
                "Cached token expired {}s ago, rechecking store",
                -record.remaining_seconds(now)
            );
            *cached = None;
        }

        // Cache miss or stale cache: hydrate from the store. The persisted
        // record may be newer than the one just dropped (another process can
        // refresh the session), so only a record read here and seen expired
        // is purged.
        match self.store.get::<TokenRecord>(StorageKeys::TOKEN) {
            Ok(Some(record)) if record.is_valid_at(now) => {
                let value = record.value.clone();
                *cached = Some(record);
                Some(value)
            }
            Ok(Some(record)) => {
                log::debug!(
                    "Persisted token expired {}s ago, purging",
                    -record.remaining_seconds(now)
                );
                self.remove_persisted();
                None
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("Token hydration failed, treating as logged out: {}", e);
                None
            }
        }
    }

    /// Whether a valid token is currently available
    pub fn has_valid_token(&self) -> bool {
        self.get_token().is_some()
    }

    /// Drop the token from cache and store
    ///
    /// Local logout must always succeed, so removal errors are logged and
    /// swallowed; the cache is cleared regardless.
    pub fn clear_token(&self) {
        let mut cached = self.cached.lock().unwrap();
        *cached = None;
        self.remove_persisted();
        log::debug!("✓ Cleared session token");
    }

    fn remove_persisted(&self) {
        if let Err(e) = self.store.remove(StorageKeys::TOKEN) {
            log::warn!("Failed to remove persisted token: {}", e);
        }
    }
}
