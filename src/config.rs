//! Configuration types for Tably secure storage
//!
//! Manages where the store file, master key, and config file live, plus
//! the debug-tools switch that gates the diagnostics surface.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Store file name inside the data directory
pub const STORE_FILE_NAME: &str = "store.json";

/// Master key file name inside the data directory
pub const KEY_FILE_NAME: &str = ".master_key";

/// Config file name inside the data directory
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Optional custom data directory (store file + master key)
    pub data_dir: Option<String>,

    /// Expose the diagnostics surface (off in production builds)
    pub debug_tools: bool,
}

impl StorageConfig {
    /// Resolve the effective data directory
    ///
    /// Uses the configured directory when set, otherwise the per-user
    /// default under the home directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => default_data_dir(),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config directory not found")]
    DirectoryNotFound,
}

/// Configuration overrides from caller code or environment variables
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub data_dir: Option<String>,
    pub debug_tools: Option<bool>,
}

impl ConfigOverrides {
    /// Create empty overrides
    pub fn new() -> Self {
        Self::default()
    }

    /// Create overrides from environment variables
    ///
    /// `TABLY_DATA_DIR` relocates the data directory; `TABLY_DEBUG_TOOLS`
    /// (`1`/`true`/`yes`) switches the diagnostics surface on.
    pub fn from_env() -> Self {
        Self {
            data_dir: std::env::var("TABLY_DATA_DIR").ok(),
            debug_tools: std::env::var("TABLY_DEBUG_TOOLS")
                .ok()
                .map(|s| matches!(s.to_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }

    /// Merge with another set of overrides (other takes precedence)
    pub fn merge(mut self, other: Self) -> Self {
        if other.data_dir.is_some() {
            self.data_dir = other.data_dir;
        }
        if other.debug_tools.is_some() {
            self.debug_tools = other.debug_tools;
        }
        self
    }
}

/// Get the default data directory path
///
/// Returns: `~/.tably/`
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    dirs::home_dir()
        .map(|home| home.join(".tably"))
        .ok_or(ConfigError::DirectoryNotFound)
}

/// Get the default configuration file path
///
/// Returns: `~/.tably/config.json`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    Ok(default_data_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from file with overrides
///
/// # Priority (highest to lowest):
/// 1. Caller overrides (passed as argument)
/// 2. Environment variables
/// 3. Config file
/// 4. Defaults
///
/// # Arguments
///
/// * `config_path` - Path to config file (optional, uses default if None)
/// * `overrides` - Overrides from caller code
///
/// # Example
///
/// ```ignore
/// use tably_secure_storage::config::{load_config, ConfigOverrides};
///
/// let mut overrides = ConfigOverrides::new();
/// overrides.debug_tools = Some(true);
///
/// let config = load_config(None, overrides)?;
/// ```
pub fn load_config(
    config_path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<StorageConfig, ConfigError> {
    // Determine config path
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    // Load from file if it exists, otherwise start from defaults
    let mut config = if path.exists() {
        let contents = std::fs::read_to_string(&path)?;
        serde_json::from_str(&contents)?
    } else {
        StorageConfig::default()
    };

    // Apply environment variable overrides
    let env_overrides = ConfigOverrides::from_env();
    apply_overrides(&mut config, env_overrides);

    // Apply caller overrides (highest priority)
    apply_overrides(&mut config, overrides);

    Ok(config)
}

/// Save configuration to file
///
/// Creates parent directories if they don't exist.
///
/// # Arguments
///
/// * `config` - Configuration to save
/// * `config_path` - Path to save config (optional, uses default if None)
///
/// # Example
///
/// ```ignore
/// use tably_secure_storage::config::{save_config, StorageConfig};
///
/// let config = StorageConfig::default();
/// save_config(&config, None)?;
/// ```
pub fn save_config(config: &StorageConfig, config_path: Option<&Path>) -> Result<(), ConfigError> {
    // Determine config path
    let path = match config_path {
        Some(p) => p.to_path_buf(),
        None => default_config_path()?,
    };

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Serialize to pretty JSON
    let json = serde_json::to_string_pretty(config)?;

    // Write to file
    std::fs::write(&path, json)?;

    Ok(())
}

/// Apply configuration overrides (internal helper)
fn apply_overrides(config: &mut StorageConfig, overrides: ConfigOverrides) {
    if let Some(data_dir) = overrides.data_dir {
        config.data_dir = Some(data_dir);
    }
    if let Some(debug_tools) = overrides.debug_tools {
        config.debug_tools = debug_tools;
    }
}
