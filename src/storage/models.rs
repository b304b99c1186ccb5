//! Shared persisted types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A session token together with its validity window
///
/// Persisted encrypted under the auth namespace. Expiry is checked against
/// wall-clock UTC; a record is valid strictly before `expires_at`, so a
/// token read at exactly its expiry instant is already expired.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
    /// The opaque token value handed out by the auth server
    pub value: String,

    /// When the record was created
    pub issued_at: DateTime<Utc>,

    /// First instant at which the token no longer counts as valid
    pub expires_at: DateTime<Utc>,
}

impl TokenRecord {
    /// Create a record valid for `lifetime` starting now
    ///
    /// A zero or negative lifetime is accepted and produces a record that
    /// is already expired, which callers observe as an absent token. A
    /// lifetime overflowing the representable date range clamps to its
    /// bounds rather than failing.
    pub fn new(value: String, lifetime: Duration) -> Self {
        if lifetime <= Duration::zero() {
            log::debug!(
                "Token record created with non-positive lifetime ({}s), will read as expired",
                lifetime.num_seconds()
            );
        }

        let issued_at = Utc::now();
        // Chrono addition panics outside its representable range; clamp to
        // the matching bound instead. A far-future expiry reads as valid
        // indefinitely, a far-past one as long expired.
        let expires_at = match issued_at.checked_add_signed(lifetime) {
            Some(expires_at) => expires_at,
            None if lifetime < Duration::zero() => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        };

        Self {
            value,
            issued_at,
            expires_at,
        }
    }

    /// Whether the token is still valid at `now`
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    /// Whether the token has expired at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_valid_at(now)
    }

    /// Seconds of validity left at `now` (negative once expired)
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.expires_at.signed_duration_since(now).num_seconds()
    }
}
