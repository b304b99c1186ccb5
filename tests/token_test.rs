//! Integration tests for the session token lifecycle
//!
//! Tests memory-first reads, expiry handling, store hydration after a
//! restart, and the collapse of every failure mode to a logged-out state.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::TestStoreEnv;
use tably_secure_storage::storage::backend::StoreBackend;
use tably_secure_storage::storage::classify::StorageKeys;
use tably_secure_storage::storage::models::TokenRecord;
use tably_secure_storage::token::TokenManager;

#[test]
fn test_fresh_token_is_returned_while_valid() {
    let env = TestStoreEnv::new();
    let tokens = TokenManager::new(Arc::new(env.secure_store()));

    tokens
        .set_token("abc123", Duration::seconds(3600))
        .expect("Failed to store token");

    assert_eq!(
        tokens.get_token().as_deref(),
        Some("abc123"),
        "A token within its lifetime should be returned"
    );
    assert!(tokens.has_valid_token());

    // Repeated reads keep returning it
    assert_eq!(tokens.get_token().as_deref(), Some("abc123"));
}

#[test]
fn test_non_positive_lifetime_reads_as_logged_out() {
    let env = TestStoreEnv::new();
    let tokens = TokenManager::new(Arc::new(env.secure_store()));

    // Test 1: negative lifetime is accepted but the record is born expired
    tokens
        .set_token("abc123", Duration::seconds(-1))
        .expect("Storing an already-expired token should not error");
    assert_eq!(
        tokens.get_token(),
        None,
        "An expired token reads as logged out"
    );
    assert!(!tokens.has_valid_token());

    // The purge also removed the persisted record
    assert_eq!(
        env.file_store()
            .get("encrypted_token")
            .expect("Failed to read backend"),
        None,
        "Expiry detection should delete the persisted record"
    );

    // Test 2: zero lifetime behaves the same (expiry boundary is strict)
    tokens
        .set_token("abc123", Duration::zero())
        .expect("Failed to store token");
    assert_eq!(tokens.get_token(), None, "A zero-lifetime token is already expired");
}

#[test]
fn test_token_survives_restart_via_store_hydration() {
    let env = TestStoreEnv::new();

    // First process stores the token
    let tokens_a = TokenManager::new(Arc::new(env.secure_store()));
    tokens_a
        .set_token("abc123", Duration::seconds(3600))
        .expect("Failed to store token");

    // Second process starts with a cold cache and hydrates from the store
    let tokens_b = TokenManager::new(Arc::new(env.secure_store()));
    assert_eq!(
        tokens_b.get_token().as_deref(),
        Some("abc123"),
        "A fresh manager should hydrate the persisted token"
    );
}

#[test]
fn test_expired_cache_adopts_fresh_token_from_another_manager() {
    let env = TestStoreEnv::new();

    // Manager A is left holding an already-expired session in its cache
    let tokens_a = TokenManager::new(Arc::new(env.secure_store()));
    tokens_a
        .set_token("old-session", Duration::seconds(-1))
        .expect("Storing an already-expired token should not error");

    // Manager B (another process over the same store) logs in again
    let tokens_b = TokenManager::new(Arc::new(env.secure_store()));
    tokens_b
        .set_token("fresh-session", Duration::seconds(3600))
        .expect("Failed to store fresh token");

    // A's stale cache defers to the store instead of destroying the session
    assert_eq!(
        tokens_a.get_token().as_deref(),
        Some("fresh-session"),
        "A stale cache should hydrate the fresher persisted token"
    );

    // The persisted record survived; a cold manager still finds it
    let tokens_c = TokenManager::new(Arc::new(env.secure_store()));
    assert_eq!(
        tokens_c.get_token().as_deref(),
        Some("fresh-session"),
        "Dropping a stale cache must not delete the persisted record"
    );
}

#[test]
fn test_cache_serves_reads_without_touching_the_store() {
    let env = TestStoreEnv::new();
    let tokens = TokenManager::new(Arc::new(env.secure_store()));

    tokens
        .set_token("abc123", Duration::seconds(3600))
        .expect("Failed to store token");

    // Delete the persisted record behind the manager's back
    env.file_store()
        .remove("encrypted_token")
        .expect("Failed to remove persisted record");

    // The cached record still answers
    assert_eq!(
        tokens.get_token().as_deref(),
        Some("abc123"),
        "A valid cached token is served without a store read"
    );

    // A manager without the cache sees the deletion
    let cold = TokenManager::new(Arc::new(env.secure_store()));
    assert_eq!(
        cold.get_token(),
        None,
        "A cold cache cannot resurrect the deleted record"
    );
}

#[test]
fn test_expired_persisted_token_is_purged_on_read() {
    let env = TestStoreEnv::new();
    let store = Arc::new(env.secure_store());

    // Persist a record that expired an hour ago, bypassing TokenManager
    let now = Utc::now();
    let record = TokenRecord {
        value: "stale".to_string(),
        issued_at: now - Duration::hours(2),
        expires_at: now - Duration::hours(1),
    };
    store
        .set(StorageKeys::TOKEN, &record)
        .expect("Failed to persist record");

    let tokens = TokenManager::new(Arc::clone(&store));
    assert_eq!(
        tokens.get_token(),
        None,
        "An expired persisted token reads as logged out"
    );

    // The read purged the stale record from the store
    assert_eq!(
        env.file_store()
            .get("encrypted_token")
            .expect("Failed to read backend"),
        None,
        "Hydrating an expired record should delete it"
    );
}

#[test]
fn test_corrupted_persisted_token_reads_as_logged_out() {
    let env = TestStoreEnv::new();

    // Plant garbage where the encrypted record should be
    env.file_store()
        .set("encrypted_token", "deadbeef")
        .expect("Failed to plant garbage");

    let tokens = TokenManager::new(Arc::new(env.secure_store()));
    assert_eq!(
        tokens.get_token(),
        None,
        "An unreadable record must not panic, only log out"
    );

    // Re-login overwrites the bad entry and recovers
    tokens
        .set_token("fresh-token", Duration::seconds(3600))
        .expect("Failed to store new token");
    assert_eq!(tokens.get_token().as_deref(), Some("fresh-token"));
}

#[test]
fn test_legacy_plain_string_token_is_not_a_session() {
    let env = TestStoreEnv::new();
    let store = Arc::new(env.secure_store());

    // A migrated legacy value is an encrypted plain string, not a record
    store
        .set(StorageKeys::TOKEN, "xyz")
        .expect("Failed to store legacy value");

    // The facade still reads it verbatim for callers that want the string
    let raw: Option<String> = store.get(StorageKeys::TOKEN).expect("Failed to read");
    assert_eq!(raw.as_deref(), Some("xyz"));

    // But it carries no expiry metadata, so it is not a usable session
    let tokens = TokenManager::new(Arc::clone(&store));
    assert_eq!(
        tokens.get_token(),
        None,
        "A value without a validity window cannot authenticate"
    );

    // The entry is left in place; it is unreadable as a record, not expired
    assert!(
        env.file_store()
            .get("encrypted_token")
            .expect("Failed to read backend")
            .is_some(),
        "A malformed record is not purged, re-login will overwrite it"
    );
}

#[test]
fn test_clear_token_removes_cache_and_persisted_record() {
    let env = TestStoreEnv::new();
    let tokens = TokenManager::new(Arc::new(env.secure_store()));

    tokens
        .set_token("abc123", Duration::seconds(3600))
        .expect("Failed to store token");
    assert!(tokens.has_valid_token());

    tokens.clear_token();

    assert_eq!(tokens.get_token(), None, "Cleared token should be gone");
    assert_eq!(
        env.file_store()
            .get("encrypted_token")
            .expect("Failed to read backend"),
        None,
        "Logout should remove the persisted record"
    );

    // Clearing an already-empty session is a no-op, not an error
    tokens.clear_token();
    assert_eq!(tokens.get_token(), None);
}

#[test]
fn test_token_record_validity_boundary_is_strict() {
    let now = Utc::now();
    let record = TokenRecord {
        value: "abc123".to_string(),
        issued_at: now - Duration::hours(1),
        expires_at: now,
    };

    // Valid strictly before expiry; the expiry instant itself is expired
    assert!(
        record.is_valid_at(record.expires_at - Duration::seconds(1)),
        "One second before expiry the token is still valid"
    );
    assert!(
        !record.is_valid_at(record.expires_at),
        "At exactly the expiry instant the token is expired"
    );
    assert!(record.is_expired_at(record.expires_at + Duration::seconds(1)));

    // remaining_seconds flips sign across the boundary
    assert_eq!(record.remaining_seconds(record.expires_at), 0);
    assert!(record.remaining_seconds(record.expires_at - Duration::seconds(30)) > 0);
    assert!(record.remaining_seconds(record.expires_at + Duration::seconds(30)) < 0);
}

#[test]
fn test_extreme_lifetimes_clamp_instead_of_overflowing() {
    let now = Utc::now();

    // Test 1: a lifetime past the end of the representable date range
    // clamps to the far-future bound and reads as valid indefinitely
    let record = TokenRecord::new("abc123".to_string(), Duration::days(1_000_000_000));
    assert!(
        record.is_valid_at(now + Duration::days(365_000)),
        "An overflowing lifetime should read as valid indefinitely"
    );

    // Test 2: the negative counterpart clamps to the far-past bound
    let record = TokenRecord::new("abc123".to_string(), Duration::days(-1_000_000_000));
    assert!(
        record.is_expired_at(now),
        "An overflowing negative lifetime should read as long expired"
    );

    // Test 3: a clamped record persists and hydrates like any other
    let env = TestStoreEnv::new();
    let tokens = TokenManager::new(Arc::new(env.secure_store()));
    tokens
        .set_token("abc123", Duration::days(1_000_000_000))
        .expect("Failed to store token");

    let cold = TokenManager::new(Arc::new(env.secure_store()));
    assert_eq!(
        cold.get_token().as_deref(),
        Some("abc123"),
        "A clamped expiry should survive persistence"
    );
}

#[test]
fn test_token_record_round_trips_through_the_facade() {
    let env = TestStoreEnv::new();
    let store = env.secure_store();

    let record = TokenRecord::new("abc123".to_string(), Duration::seconds(3600));
    store
        .set(StorageKeys::TOKEN, &record)
        .expect("Failed to store record");

    let loaded: Option<TokenRecord> = store.get(StorageKeys::TOKEN).expect("Failed to read");
    assert_eq!(
        loaded,
        Some(record),
        "Record should round-trip with timestamps intact"
    );
}
