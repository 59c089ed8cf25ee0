// crates/patient-registry-config/src/lib.rs
// ============================================================================
// Module: Registry Configuration
// Description: Canonical configuration model for the registry tools.
// Purpose: Load, default, and validate the store/console/form settings shared
//          by every host.
// Dependencies: patient-registry-store, serde, thiserror, toml
// ============================================================================

//! ## Overview
//! One TOML document configures every registry host. The `[store]` table maps
//! directly onto [`StoreConfig`]; `[console]` bounds the persisted statement
//! history; `[form]` tunes the registration pre-check debounce. Loading is
//! strict and fail-closed: oversized files, non-UTF-8 content, and
//! out-of-range limits are rejected before any host touches the database.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use patient_registry_store::JournalMode;
use patient_registry_store::StoreConfig;
use patient_registry_store::SyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum config path length in bytes.
const MAX_CONFIG_PATH_LENGTH: usize = 4_096;
/// Maximum length of any single config path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum config file size in bytes.
const MAX_CONFIG_BYTES: u64 = 1_048_576;
/// Maximum busy timeout (ms) accepted in config.
const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Maximum leader lease time to live (ms) accepted in config.
const MAX_LEASE_TTL_MS: u64 = 3_600_000;
/// Maximum persisted console history entries.
const MAX_HISTORY_ENTRIES: usize = 10;
/// Maximum pre-check debounce (ms) accepted in config.
const MAX_DEBOUNCE_MS: u64 = 10_000;
/// Default database file name when no config file is supplied.
const DEFAULT_DB_FILE: &str = "patients.db";
/// Default console history file name.
const DEFAULT_HISTORY_FILE: &str = "console_history.json";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file I/O error.
    #[error("config io error: {0}")]
    Io(String),
    /// Config file did not parse as TOML.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Config content violated a limit.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Sections
// ============================================================================

/// Console settings.
///
/// # Invariants
/// - `history_limit` is between 1 and [`MAX_HISTORY_ENTRIES`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsoleSettings {
    /// Path of the persisted statement history file.
    pub history_path: PathBuf,
    /// Maximum number of persisted history entries.
    pub history_limit: usize,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            history_path: PathBuf::from(DEFAULT_HISTORY_FILE),
            history_limit: MAX_HISTORY_ENTRIES,
        }
    }
}

/// Registration form settings.
///
/// # Invariants
/// - `precheck_debounce_ms` is between 1 and [`MAX_DEBOUNCE_MS`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FormSettings {
    /// Quiet period before a uniqueness pre-check fires, in milliseconds.
    pub precheck_debounce_ms: u64,
    /// Whether uniqueness pre-checks run at all.
    pub precheck_enabled: bool,
}

impl Default for FormSettings {
    fn default() -> Self {
        Self {
            precheck_debounce_ms: 500,
            precheck_enabled: true,
        }
    }
}

// ============================================================================
// SECTION: Root Config
// ============================================================================

/// Root configuration for the registry tools.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Store settings.
    #[serde(default = "default_store")]
    pub store: StoreConfig,
    /// Console settings.
    #[serde(default)]
    pub console: ConsoleSettings,
    /// Registration form settings.
    #[serde(default)]
    pub form: FormSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: default_store(),
            console: ConsoleSettings::default(),
            form: FormSettings::default(),
        }
    }
}

/// Returns the default store section.
fn default_store() -> StoreConfig {
    StoreConfig {
        path: PathBuf::from(DEFAULT_DB_FILE),
        busy_timeout_ms: 5_000,
        journal_mode: JournalMode::Wal,
        sync_mode: SyncMode::Full,
        enforce_unique: true,
        lease_ttl_ms: 30_000,
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file, or returns defaults for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the path violates a guard, the file does
    /// not read or parse, or a limit is out of range.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        };
        validate_config_path(path)?;
        let metadata = fs::metadata(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if metadata.len() > MAX_CONFIG_BYTES {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        let text = str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let config: Self =
            toml::from_str(text).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every limit in the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first violated limit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store path must be non-empty".to_string()));
        }
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.store.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store busy_timeout_ms exceeds max {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        if self.store.lease_ttl_ms == 0 {
            return Err(ConfigError::Invalid(
                "store lease_ttl_ms must be greater than zero".to_string(),
            ));
        }
        if self.store.lease_ttl_ms > MAX_LEASE_TTL_MS {
            return Err(ConfigError::Invalid(format!(
                "store lease_ttl_ms exceeds max {MAX_LEASE_TTL_MS}"
            )));
        }
        if self.console.history_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid(
                "console history_path must be non-empty".to_string(),
            ));
        }
        if self.console.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "console history_limit must be greater than zero".to_string(),
            ));
        }
        if self.console.history_limit > MAX_HISTORY_ENTRIES {
            return Err(ConfigError::Invalid(format!(
                "console history_limit exceeds max {MAX_HISTORY_ENTRIES}"
            )));
        }
        if self.form.precheck_debounce_ms == 0 {
            return Err(ConfigError::Invalid(
                "form precheck_debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.form.precheck_debounce_ms > MAX_DEBOUNCE_MS {
            return Err(ConfigError::Invalid(format!(
                "form precheck_debounce_ms exceeds max {MAX_DEBOUNCE_MS}"
            )));
        }
        Ok(())
    }
}

/// Checks the config path guards before touching the filesystem.
fn validate_config_path(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().len() > MAX_CONFIG_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}
