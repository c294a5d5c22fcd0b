//! Core configuration surface.
//!
//! # Responsibility
//! - Describe every tunable the core reads at startup.
//! - Parse and validate embedder-supplied JSON without touching the disk.
//!
//! # Invariants
//! - Every field has a default, so `{}` is a complete configuration.
//! - A configuration returned by `from_json_str` has already passed `validate()`.

use crate::logging::default_log_level;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Namespace used by the host for its own vocabulary.
pub const DEFAULT_NAMESPACE: &str = "minecraft";
/// Results shown per page by registry searches.
pub const DEFAULT_SEARCH_PAGE_SIZE: usize = 8;

/// Top-level core configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Namespace applied to unqualified registry lookups.
    pub default_namespace: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling logs. `None` leaves logging to the embedder.
    pub log_dir: Option<String>,
    pub adapters: AdapterConfig,
    pub search: SearchConfig,
    /// Priority weight the embedding host platform registers with.
    pub host_platform_priority: i32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            log_level: default_log_level().to_string(),
            log_dir: None,
            adapters: AdapterConfig::default(),
            search: SearchConfig::default(),
            host_platform_priority: 0,
        }
    }
}

/// Adapter discovery switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    /// Consider candidates linked into the running process.
    pub scan_runtime_path: bool,
    /// Consider candidates shipped inside the extension bundle.
    pub scan_bundled_archive: bool,
    /// Candidate names that must never be instantiated.
    pub disabled: Vec<String>,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            scan_runtime_path: true,
            scan_bundled_archive: true,
            disabled: Vec::new(),
        }
    }
}

/// Registry search presentation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_SEARCH_PAGE_SIZE,
        }
    }
}

impl CoreConfig {
    /// Parses and validates a JSON configuration document.
    ///
    /// # Errors
    /// - `ConfigError::Parse` when the document is not valid JSON for this shape.
    /// - `ConfigError::Invalid` when a field violates a core invariant.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks field-level invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let namespace = self.default_namespace.as_str();
        if namespace.is_empty() {
            return Err(ConfigError::Invalid(
                "default_namespace must not be empty".to_string(),
            ));
        }
        if namespace.contains(':') {
            return Err(ConfigError::Invalid(format!(
                "default_namespace must not contain `:`, got `{namespace}`"
            )));
        }
        if self.search.page_size == 0 {
            return Err(ConfigError::Invalid(
                "search.page_size must be at least 1".to_string(),
            ));
        }
        if let Some(dir) = &self.log_dir {
            if !std::path::Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::Invalid(format!(
                    "log_dir must be an absolute path, got `{dir}`"
                )));
            }
        }
        Ok(())
    }
}

/// Configuration parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "failed to parse configuration: {message}"),
            Self::Invalid(message) => write!(f, "invalid configuration: {message}"),
        }
    }
}

impl Error for ConfigError {}
