//! Binder configuration.
//!
//! `BinderConfig` controls how logical table ids become physical relation
//! names and how long a binder waits for another binder of the same table.

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_IDENTIFIER_LENGTH, DEFAULT_NAMESPACE_PREFIX, DEFAULT_SCHEMA_LOCK_TIMEOUT_MS,
};
use crate::error::{TabulaError, TabulaResult};

/// Schema binder configuration.
///
/// # Example
///
/// ```rust
/// use tabula_common::config::BinderConfig;
///
/// let config = BinderConfig::default();
/// assert_eq!(config.namespace_prefix, "UT_");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinderConfig {
    /// Prefix applied to every physical relation name.
    /// Default: "UT_"
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Maximum length of a physical identifier (prefix included).
    /// Default: 63
    #[serde(default = "default_max_identifier_length")]
    pub max_identifier_length: usize,

    /// How long a binder waits for the per-table schema lock.
    /// Default: 30000 (30 seconds)
    #[serde(default = "default_schema_lock_timeout_ms")]
    pub schema_lock_timeout_ms: u64,
}

fn default_namespace_prefix() -> String {
    DEFAULT_NAMESPACE_PREFIX.to_string()
}

fn default_max_identifier_length() -> usize {
    DEFAULT_MAX_IDENTIFIER_LENGTH
}

fn default_schema_lock_timeout_ms() -> u64 {
    DEFAULT_SCHEMA_LOCK_TIMEOUT_MS
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: default_namespace_prefix(),
            max_identifier_length: default_max_identifier_length(),
            schema_lock_timeout_ms: default_schema_lock_timeout_ms(),
        }
    }
}

impl BinderConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration for testing, with a short lock timeout.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            schema_lock_timeout_ms: 2_000,
            ..Default::default()
        }
    }

    /// Creates a builder for configuration.
    #[must_use]
    pub fn builder() -> BinderConfigBuilder {
        BinderConfigBuilder::new()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the schema lock timeout as a `Duration`.
    #[must_use]
    pub fn schema_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.schema_lock_timeout_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> TabulaResult<()> {
        let prefix = self.namespace_prefix.as_bytes();
        match prefix.first() {
            None => {
                return Err(TabulaError::invalid_config(
                    "namespace_prefix must not be empty",
                ))
            }
            Some(first) if !first.is_ascii_uppercase() => {
                return Err(TabulaError::invalid_config(
                    "namespace_prefix must start with an uppercase ASCII letter",
                ))
            }
            Some(_) => {}
        }

        if !prefix
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || *b == b'_')
        {
            return Err(TabulaError::invalid_config(
                "namespace_prefix may only contain A-Z, 0-9 and '_'",
            ));
        }

        if self.max_identifier_length <= prefix.len() {
            return Err(TabulaError::invalid_config(format!(
                "max_identifier_length ({}) must exceed the namespace prefix length ({})",
                self.max_identifier_length,
                prefix.len()
            )));
        }

        if self.schema_lock_timeout_ms == 0 {
            return Err(TabulaError::invalid_config(
                "schema_lock_timeout_ms must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Builder for binder configuration.
#[derive(Debug, Default)]
pub struct BinderConfigBuilder {
    config: BinderConfig,
}

impl BinderConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the namespace prefix.
    #[must_use]
    pub fn namespace_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.namespace_prefix = prefix.into();
        self
    }

    /// Sets the maximum identifier length.
    #[must_use]
    pub fn max_identifier_length(mut self, len: usize) -> Self {
        self.config.max_identifier_length = len;
        self
    }

    /// Sets the schema lock timeout.
    #[must_use]
    pub fn schema_lock_timeout(mut self, timeout: Duration) -> Self {
        self.config.schema_lock_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> BinderConfig {
        self.config
    }
}
