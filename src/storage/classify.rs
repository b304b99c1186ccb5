//! Storage key classification
//!
//! Every key that goes through the secure store is classified by sensitivity
//! before it touches the backend. The table is fixed at compile time:
//! authentication material and personal data are always routed through
//! encryption, everything else (including keys not listed here) is stored as
//! plain JSON under its bare name.

use serde::{Deserialize, Serialize};

/// Prefix for entries in the encrypted namespace
///
/// A logical key like `email` that classifies as sensitive is persisted
/// under the physical key `encrypted_email`.
pub const ENCRYPTED_PREFIX: &str = "encrypted_";

/// Well-known storage key names
///
/// Canonical key names used by the client app. The string values keep the
/// camelCase form the legacy store used, so migrated installs keep reading
/// the same entries.
pub struct StorageKeys;

impl StorageKeys {
    /// Session token record
    pub const TOKEN: &'static str = "token";

    /// Refresh token record
    pub const REFRESH_TOKEN: &'static str = "refreshToken";

    /// Serialized user object
    pub const USER: &'static str = "user";

    /// Display name shown in the UI
    pub const DISPLAY_NAME: &'static str = "displayName";

    /// Role label (e.g. waiter, manager)
    pub const DISPLAY_ROLE: &'static str = "displayRole";

    /// Account email address
    pub const EMAIL: &'static str = "email";

    /// Account phone number
    pub const PHONE_NUMBER: &'static str = "phoneNumber";

    /// Profile image URL or data
    pub const PROFILE_IMAGE: &'static str = "profileImage";

    /// Restaurant name for the active venue
    pub const RESTAURANT_NAME: &'static str = "restaurantName";

    /// Table capacity layout for the active venue
    pub const TABLE_CAPACITIES: &'static str = "tableCapacities";

    /// UI theme preference
    pub const THEME: &'static str = "theme";
}

/// Legacy plaintext keys swept by the one-shot migration
///
/// Fixed list: the keys that pre-encryption releases wrote directly to the
/// store. Keys introduced after the encrypted scheme shipped (such as
/// `refreshToken`) never had a plaintext form and do not belong here.
pub const LEGACY_KEYS: [&str; 10] = [
    StorageKeys::TOKEN,
    StorageKeys::USER,
    StorageKeys::DISPLAY_NAME,
    StorageKeys::DISPLAY_ROLE,
    StorageKeys::EMAIL,
    StorageKeys::PHONE_NUMBER,
    StorageKeys::PROFILE_IMAGE,
    StorageKeys::RESTAURANT_NAME,
    StorageKeys::TABLE_CAPACITIES,
    StorageKeys::THEME,
];

/// Sensitivity class of a storage key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyClass {
    /// Non-sensitive app state, stored as plain JSON under the bare key
    General,
    /// Personally identifiable information, always encrypted
    Pii,
    /// Authentication material, always encrypted
    Auth,
}

impl KeyClass {
    /// Whether values of this class must be encrypted before persisting
    pub fn requires_encryption(&self) -> bool {
        matches!(self, KeyClass::Pii | KeyClass::Auth)
    }

    /// Short string form (used in logs and diagnostics output)
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyClass::General => "general",
            KeyClass::Pii => "pii",
            KeyClass::Auth => "auth",
        }
    }
}

/// Classify a storage key by sensitivity
///
/// Total over all inputs: keys outside the table default to `General`.
/// Sensitive keys are never downgraded by this default because the table
/// names them explicitly.
pub fn classify(key: &str) -> KeyClass {
    match key {
        StorageKeys::TOKEN | StorageKeys::REFRESH_TOKEN => KeyClass::Auth,
        StorageKeys::USER
        | StorageKeys::DISPLAY_NAME
        | StorageKeys::DISPLAY_ROLE
        | StorageKeys::EMAIL
        | StorageKeys::PHONE_NUMBER
        | StorageKeys::PROFILE_IMAGE => KeyClass::Pii,
        _ => KeyClass::General,
    }
}

/// Physical key name for an entry in the encrypted namespace
pub fn encrypted_key_name(key: &str) -> String {
    format!("{}{}", ENCRYPTED_PREFIX, key)
}

/// Logical key name if `physical` lives in the encrypted namespace
pub fn logical_key_name(physical: &str) -> Option<&str> {
    physical.strip_prefix(ENCRYPTED_PREFIX)
}
