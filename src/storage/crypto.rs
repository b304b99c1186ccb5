//! Master key handling and value encryption
//!
//! Provides the AES-256-GCM codec used for every sensitive entry in the
//! store, plus master key management: random generation, PBKDF2 passphrase
//! derivation, and a persistent key file so separate processes sharing one
//! data directory encrypt with the same key.

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use serde::{de::DeserializeOwned, Serialize};
use sha2::Sha256;
use std::path::Path;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Nonce size for AES-GCM (96 bits / 12 bytes)
const NONCE_SIZE: usize = 12;

/// Salt size for passphrase derivation (128 bits / 16 bytes)
const SALT_SIZE: usize = 16;

/// PBKDF2-HMAC-SHA256 iteration count (OWASP recommendation as of 2023)
const PBKDF2_ITERATIONS: u32 = 600_000;

/// Encryption and decoding errors
///
/// Decode-side failures are recoverable by policy: callers treat the entry
/// as absent rather than surfacing the error to the user.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Key file error: {0}")]
    KeyFile(String),
}

/// A 256-bit master key with automatic zeroization on drop
///
/// The Debug impl redacts key material so the key can never leak through
/// logging.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key: [u8; 32],
}

impl MasterKey {
    /// Generate a fresh random key from the OS CSPRNG
    pub fn generate() -> Self {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    /// Build a key from raw bytes
    pub fn from_bytes(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Derive a key from a passphrase using PBKDF2-HMAC-SHA256
    ///
    /// Uses 600,000 iterations. The salt must be persisted alongside the
    /// store so later runs derive the same key; see [`generate_salt`].
    ///
    /// # Arguments
    ///
    /// * `passphrase` - Operator passphrase
    /// * `salt` - Random salt persisted with the store
    pub fn derive_from_passphrase(passphrase: &str, salt: &[u8]) -> Self {
        let mut key = [0u8; 32];
        pbkdf2_hmac::<Sha256>(passphrase.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
        Self { key }
    }

    /// Load the key from a hex key file, creating it on first use
    ///
    /// The file is written with 0600 permissions on Unix. Every process
    /// pointed at the same data directory reads the same key, which keeps
    /// stored values decryptable across restarts.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let key = MasterKey::load_or_generate(&data_dir.join(".master_key"))?;
    /// let codec = CryptoCodec::new(&key);
    /// ```
    pub fn load_or_generate(path: &Path) -> Result<Self, CryptoError> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| CryptoError::KeyFile(format!("Failed to read key file: {}", e)))?;
            let bytes = hex::decode(contents.trim())
                .map_err(|e| CryptoError::KeyFile(format!("Key file is not valid hex: {}", e)))?;

            if bytes.len() != 32 {
                return Err(CryptoError::KeyFile(format!(
                    "Key file must hold 32 bytes, found {}",
                    bytes.len()
                )));
            }

            let mut key = [0u8; 32];
            key.copy_from_slice(&bytes);

            log::debug!("Loaded master key from {}", path.display());
            return Ok(Self { key });
        }

        let fresh = Self::generate();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CryptoError::KeyFile(format!("Failed to create key directory: {}", e))
            })?;
        }
        std::fs::write(path, hex::encode(fresh.key))
            .map_err(|e| CryptoError::KeyFile(format!("Failed to write key file: {}", e)))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(
                |e| CryptoError::KeyFile(format!("Failed to set key file permissions: {}", e)),
            )?;
        }

        log::info!("✓ Generated new master key at {}", path.display());
        Ok(fresh)
    }

    /// Key bytes for cipher construction
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never log key material
        f.debug_struct("MasterKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Generate a random salt for passphrase-derived keys
pub fn generate_salt() -> [u8; SALT_SIZE] {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// Encrypts and decodes storage values
///
/// Values are serialized to JSON, encrypted with AES-256-GCM under a fresh
/// random 96-bit nonce, and framed as `hex(nonce || ciphertext || tag)`.
/// The random nonce means encoding the same value twice never produces the
/// same ciphertext, while both decode to the same value.
#[derive(Clone)]
pub struct CryptoCodec {
    cipher: Aes256Gcm,
}

impl CryptoCodec {
    /// Create a codec from a master key
    pub fn new(key: &MasterKey) -> Self {
        let cipher = Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes()));
        Self { cipher }
    }

    /// Encrypt a value for storage
    ///
    /// Accepts anything serde can represent as JSON: strings, numbers,
    /// maps, and nested structures.
    ///
    /// # Returns
    ///
    /// Hex string of `nonce || ciphertext || tag`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let encoded = codec.encode(&"secret")?;
    /// let decoded: String = codec.decode(&encoded)?;
    /// assert_eq!(decoded, "secret");
    /// ```
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<String, CryptoError> {
        let plaintext = serde_json::to_vec(value)
            .map_err(|e| CryptoError::Encryption(format!("Failed to serialize value: {}", e)))?;

        // Generate random nonce (96 bits / 12 bytes)
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        // Encrypt
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_ref())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        // Combine: nonce || ciphertext
        let mut result = nonce_bytes.to_vec();
        result.extend_from_slice(&ciphertext);

        Ok(hex::encode(result))
    }

    /// Decrypt a stored value
    ///
    /// Counterpart of [`CryptoCodec::encode`]. Fails on malformed hex,
    /// truncated input, tampered ciphertext (GCM authentication), a foreign
    /// key, or decrypted bytes that do not deserialize into `T`.
    pub fn decode<T: DeserializeOwned>(&self, encoded: &str) -> Result<T, CryptoError> {
        let encrypted_bytes =
            hex::decode(encoded).map_err(|e| CryptoError::Decryption(e.to_string()))?;

        // Minimum size: nonce (12) + tag (16) = 28 bytes
        if encrypted_bytes.len() < NONCE_SIZE + 16 {
            return Err(CryptoError::Decryption(
                "Data too short (minimum 28 bytes required)".to_string(),
            ));
        }

        // Extract nonce (first 12 bytes)
        let (nonce_bytes, ciphertext) = encrypted_bytes.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        // Decrypt
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| CryptoError::Decryption(format!("Decryption failed (wrong key?): {}", e)))?;

        serde_json::from_slice(&plaintext).map_err(|e| CryptoError::Deserialization(e.to_string()))
    }
}
