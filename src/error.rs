//! Error types for loading and reading settings.
//!
//! Loading errors ([`ConfigError`]) are startup-time, operator-facing
//! conditions. Lookup errors ([`LookupError`]) come from reading a loaded
//! store and are selected by the `raise_on_missing` policy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a [`ConfigStore`](crate::config::ConfigStore).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A load option cannot be used (empty prefix, splitter or env_name).
    #[error("invalid option `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// The working directory could not be resolved for the default config path.
    #[error("cannot resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),

    /// No base config directory, or no `*.yml` files inside it.
    #[error("cannot find config dir or config files: {}", .pattern.display())]
    ConfigDirectoryNotFound { pattern: PathBuf },

    /// A required environment-specific file is missing.
    #[error(
        "config file not found: {} (selected by {selector}={value})",
        .pattern.display()
    )]
    ConfigFileNotFound {
        pattern: PathBuf,
        selector: String,
        value: String,
    },

    /// Reading a config file failed.
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A config file is not valid YAML.
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A config file parsed, but its root is not a mapping.
    #[error("{} must contain a mapping at the top level, found {found}", .path.display())]
    InvalidDocument { path: PathBuf, found: &'static str },

    /// A YAML `.nan` or `.inf` value, which has no settings representation.
    #[error("{} holds a non-finite number at \"{key}\"", .path.display())]
    NonFiniteNumber { path: PathBuf, key: String },

    /// A YAML tree could not be represented as a settings value.
    #[error("unsupported YAML content in {}: {source}", .path.display())]
    Convert {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    /// Path the operator should look at, when the error is tied to one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            ConfigError::ConfigDirectoryNotFound { pattern }
            | ConfigError::ConfigFileNotFound { pattern, .. } => Some(pattern.as_path()),
            ConfigError::Io { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::InvalidDocument { path, .. }
            | ConfigError::NonFiniteNumber { path, .. }
            | ConfigError::Convert { path, .. } => Some(path.as_path()),
            ConfigError::InvalidOption { .. } | ConfigError::CurrentDir(_) => None,
        }
    }
}

/// Errors raised while reading values out of a loaded store.
#[derive(Debug, Error)]
pub enum LookupError {
    /// A path segment does not exist (or its parent is not a mapping).
    #[error("key \"{segment}\" not found (requested \"{path}\")")]
    KeyNotFound { segment: String, path: String },

    /// The value exists but has a different shape than requested.
    #[error("value at \"{path}\" is {found}, expected {expected}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Deserializing a sub-tree into a typed value failed.
    #[error("cannot deserialize \"{path}\": {source}")]
    Deserialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for store construction.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result alias for lookups.
pub type LookupResult<T> = std::result::Result<T, LookupError>;
