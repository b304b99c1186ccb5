//! One-shot migration of legacy plaintext entries
//!
//! Earlier releases stored every value as a bare plaintext string. This
//! sweep walks the known legacy keys once, re-routes each through the
//! secure facade (encrypting what must be encrypted, normalizing the rest
//! to JSON), then records a completion marker so later starts skip the
//! scan. A failed key is logged and left in place; the marker is only
//! written after a clean pass, so the next start retries automatically.

use chrono::Utc;

use crate::storage::classify::{self, LEGACY_KEYS};
use crate::storage::secure::{SecureStore, StoreError};

/// Bare key holding the completion marker (RFC3339 timestamp)
///
/// Lives outside both namespaces: it is not a legacy key and is never
/// prefixed, so the sweep can never migrate its own marker.
pub const MIGRATION_MARKER_KEY: &str = "secure_storage_migration_complete";

/// Outcome of one migration sweep
#[derive(Debug, Clone, Default)]
pub struct MigrationReport {
    /// Entries rewritten (encrypted or normalized)
    pub migrated: usize,

    /// Entries absent or already canonical
    pub skipped: usize,

    /// Entries that failed and were left untouched
    pub failed: usize,

    /// The marker was already set, so nothing was scanned
    pub already_complete: bool,

    /// Per-key notes for logs and diagnostics
    pub details: Vec<String>,
}

impl MigrationReport {
    /// Whether the sweep finished without failures
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

enum KeyOutcome {
    Migrated,
    Skipped,
}

/// Sweeps legacy plaintext entries into their canonical representation
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run the migration sweep once
    ///
    /// Checks the completion marker first and returns immediately when it
    /// is set. Otherwise every legacy key is visited independently:
    /// failures are counted and skipped over so one bad entry cannot block
    /// the rest. Safe to call concurrently or repeatedly; every step is
    /// idempotent at the value level, so double runs converge to the same
    /// store state.
    ///
    /// # Returns
    ///
    /// A [`MigrationReport`] with per-key counts. `Err` only on marker
    /// check/write failures; per-key errors land in `report.failed`.
    pub fn run(store: &SecureStore) -> Result<MigrationReport, StoreError> {
        if store.backend().get(MIGRATION_MARKER_KEY)?.is_some() {
            log::debug!("Legacy migration already complete, skipping scan");
            return Ok(MigrationReport {
                already_complete: true,
                ..Default::default()
            });
        }

        let mut report = MigrationReport::default();

        for key in LEGACY_KEYS {
            match Self::migrate_key(store, key) {
                Ok(KeyOutcome::Migrated) => {
                    report.migrated += 1;
                    report.details.push(format!("{}: migrated", key));
                }
                Ok(KeyOutcome::Skipped) => {
                    report.skipped += 1;
                }
                Err(e) => {
                    log::warn!("Migration of {} failed, leaving entry in place: {}", key, e);
                    report.failed += 1;
                    report.details.push(format!("{}: failed ({})", key, e));
                }
            }
        }

        if report.is_complete() {
            store
                .backend()
                .set(MIGRATION_MARKER_KEY, &Utc::now().to_rfc3339())?;
            log::info!(
                "✓ Legacy migration complete ({} migrated, {} skipped)",
                report.migrated,
                report.skipped
            );
        } else {
            log::warn!(
                "Legacy migration incomplete ({} failed), will retry on next start",
                report.failed
            );
        }

        Ok(report)
    }

    /// Clear the completion marker so the next [`run`](Self::run) rescans
    ///
    /// For tests and diagnostics; normal operation never resets.
    pub fn reset(store: &SecureStore) -> Result<(), StoreError> {
        store.backend().remove(MIGRATION_MARKER_KEY)?;
        Ok(())
    }

    fn migrate_key(store: &SecureStore, key: &str) -> Result<KeyOutcome, StoreError> {
        let raw = match store.backend().get(key)? {
            Some(raw) => raw,
            None => return Ok(KeyOutcome::Skipped),
        };

        if classify::classify(key).requires_encryption() {
            // Encrypt under the new namespace first, then retire the
            // plaintext entry. Order matters: a crash between the two
            // leaves a readable duplicate, never a lost value.
            store.set(key, raw.as_str())?;
            store.backend().remove(key)?;
            return Ok(KeyOutcome::Migrated);
        }

        // General keys already live under their canonical name; only the
        // encoding may need fixing. A value that parses as JSON was
        // written by this facade before, rewriting it would double-encode.
        if serde_json::from_str::<serde_json::Value>(&raw).is_ok() {
            Ok(KeyOutcome::Skipped)
        } else {
            store.set(key, raw.as_str())?;
            Ok(KeyOutcome::Migrated)
        }
    }
}
