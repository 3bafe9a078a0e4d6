//! Settings loader with layered merging.
//!
//! Loads, in order:
//! 1. Base files `<configs_path>/*.yml`, sorted by name
//! 2. Environment files `<configs_path>/settings/<env>*.yml`, sorted by name
//! 3. Prefixed environment variables, sorted by variable name
//!
//! Files are merged with a top-level overwrite (see [`merge_top_level`]);
//! variables are written leaf by leaf and always win.
//!
//! YAML merge keys (`<<: *anchor`) are resolved per file. `.nan` and `.inf`
//! values are rejected since the settings tree only holds finite numbers.

use super::env::{EnvSnapshot, collect_overrides};
use super::merge::{Mapping, insert_at, kind_of, merge_top_level};
use super::store::ConfigStore;
use crate::error::{ConfigError, ConfigResult};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Default name of the variable selecting the active environment.
pub const DEFAULT_ENV_NAME: &str = "APP_ENV";
/// Environment used when the selector variable is unset.
pub const DEFAULT_ENV_VALUE: &str = "development";
/// Default prefix of override variables.
pub const DEFAULT_PREFIX: &str = "SETTINGS";
/// Default delimiter between key segments.
pub const DEFAULT_SPLITTER: &str = "__";
/// Default config directory, relative to the working directory.
pub const DEFAULT_CONFIG_DIR: &str = "config";
/// Subdirectory holding environment-specific files.
pub const ENV_SETTINGS_DIR: &str = "settings";

const YAML_EXTENSION: &str = "yml";

/// Where a piece of the merged settings came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// A base file from the config directory
    Base(PathBuf),
    /// An environment-specific file from `settings/`
    Environment(PathBuf),
    /// An override variable
    Variable(String),
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Base(path) => write!(f, "base file {}", path.display()),
            ConfigSource::Environment(path) => write!(f, "environment file {}", path.display()),
            ConfigSource::Variable(name) => write!(f, "env variable {}", name),
        }
    }
}

/// Options for building a [`ConfigStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Variable selecting the active environment (upper-cased before use)
    pub env_name: String,
    /// Environment used when `env_name` is unset
    pub default_env_value: String,
    /// Config directory; `None` means `$CWD/config`
    pub configs_path: Option<PathBuf>,
    /// Prefix of override variables, matched ignoring ASCII case
    pub prefix: String,
    /// Delimiter for override variable names and compound lookups
    pub splitter: String,
    /// Apply override variables
    pub use_env: bool,
    /// Fail lookups of missing keys instead of returning `None`
    pub raise_on_missing: bool,
    /// Treat a missing environment-specific file as an error
    pub require_env_file: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            env_name: DEFAULT_ENV_NAME.to_string(),
            default_env_value: DEFAULT_ENV_VALUE.to_string(),
            configs_path: None,
            prefix: DEFAULT_PREFIX.to_string(),
            splitter: DEFAULT_SPLITTER.to_string(),
            use_env: true,
            raise_on_missing: true,
            require_env_file: false,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env_name(mut self, env_name: impl Into<String>) -> Self {
        self.env_name = env_name.into();
        self
    }

    pub fn with_default_env_value(mut self, value: impl Into<String>) -> Self {
        self.default_env_value = value.into();
        self
    }

    pub fn with_configs_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.configs_path = Some(path.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_splitter(mut self, splitter: impl Into<String>) -> Self {
        self.splitter = splitter.into();
        self
    }

    pub fn with_use_env(mut self, use_env: bool) -> Self {
        self.use_env = use_env;
        self
    }

    pub fn with_raise_on_missing(mut self, raise: bool) -> Self {
        self.raise_on_missing = raise;
        self
    }

    pub fn with_require_env_file(mut self, require: bool) -> Self {
        self.require_env_file = require;
        self
    }

    /// Reject options that cannot produce a sensible key path.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.splitter.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "splitter",
                reason: "must not be empty".to_string(),
            });
        }
        if self.prefix.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "prefix",
                reason: "must not be empty, it would match every variable".to_string(),
            });
        }
        if self.env_name.is_empty() {
            return Err(ConfigError::InvalidOption {
                option: "env_name",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The config directory these options point at.
    pub fn resolve_config_dir(&self) -> ConfigResult<PathBuf> {
        match self.configs_path {
            Some(ref path) => Ok(path.clone()),
            None => std::env::current_dir()
                .map(|cwd| cwd.join(DEFAULT_CONFIG_DIR))
                .map_err(ConfigError::CurrentDir),
        }
    }
}

impl ConfigStore {
    /// Load settings using the current process environment.
    pub fn load(options: LoadOptions) -> ConfigResult<Self> {
        Self::load_with_env(options, &EnvSnapshot::capture())
    }

    /// Load settings, reading the selector and overrides from `env`.
    pub fn load_with_env(options: LoadOptions, env: &EnvSnapshot) -> ConfigResult<Self> {
        options.validate()?;

        let env_name = options.env_name.to_uppercase();
        let env_value = env
            .get(&env_name)
            .map(str::to_string)
            .unwrap_or_else(|| options.default_env_value.clone());
        info!("Config initialized! Environment variable: {}={}", env_name, env_value);

        let config_dir = options.resolve_config_dir()?;
        let prefix = options.prefix.to_uppercase();
        let splitter = options.splitter.clone();

        let mut root = Mapping::new();
        let mut sources = Vec::new();

        // Base files
        let base_files = discover_yaml_files(&config_dir, None);
        if base_files.is_empty() {
            return Err(ConfigError::ConfigDirectoryNotFound {
                pattern: config_dir.join(format!("*.{YAML_EXTENSION}")),
            });
        }
        for path in base_files {
            if let Some(document) = load_document(&path)? {
                merge_top_level(&mut root, document);
                sources.push(ConfigSource::Base(path));
            }
        }

        // Environment-specific files
        let settings_dir = config_dir.join(ENV_SETTINGS_DIR);
        let env_files = discover_yaml_files(&settings_dir, Some(env_value.as_str()));
        if env_files.is_empty() {
            let pattern = settings_dir.join(format!("{env_value}*.{YAML_EXTENSION}"));
            if options.require_env_file {
                return Err(ConfigError::ConfigFileNotFound {
                    pattern,
                    selector: env_name,
                    value: env_value,
                });
            }
            info!("\"{}\" configs not found!", pattern.display());
        }
        for path in env_files {
            if let Some(document) = load_document(&path)? {
                merge_top_level(&mut root, document);
                sources.push(ConfigSource::Environment(path));
            }
        }

        // Override variables
        if options.use_env {
            for entry in collect_overrides(env, &prefix, &splitter) {
                debug!(key = %entry.path, value = %entry.value, "Set config value");
                insert_at(&mut root, &entry.path, Value::String(entry.value));
                sources.push(ConfigSource::Variable(entry.var));
            }
        }

        Ok(Self {
            root,
            env_name,
            env_value,
            prefix,
            splitter,
            raise_on_missing: options.raise_on_missing,
            config_dir,
            sources,
        })
    }

    /// Load settings from the process environment, exiting on failure.
    ///
    /// Intended for application startup, where a broken configuration is an
    /// operator problem with nothing to recover. Logs the error with the
    /// selector variable before exiting with status 1, installing the stderr
    /// subscriber from [`crate::logging`] first if none is set.
    pub fn load_or_exit(options: LoadOptions) -> Self {
        let env = EnvSnapshot::capture();
        let selector = options.env_name.to_uppercase();
        let selected = env
            .get(&selector)
            .unwrap_or(&options.default_env_value)
            .to_string();

        match Self::load_with_env(options, &env) {
            Ok(store) => store,
            Err(err) => {
                // Without a subscriber the error would vanish.
                if !tracing::dispatcher::has_been_set() {
                    crate::logging::try_init("info");
                }
                error!(
                    selector = %selector,
                    environment = %selected,
                    path = ?err.path(),
                    "{}",
                    err
                );
                std::process::exit(1);
            }
        }
    }
}

/// Regular `*.yml` files directly inside `dir`, sorted by name.
///
/// `name_prefix` restricts results to file names starting with it. A missing
/// or unreadable directory yields no files.
fn discover_yaml_files(dir: &Path, name_prefix: Option<&str>) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut files: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_yaml_extension(path))
        .filter(|path| {
            name_prefix.is_none_or(|prefix| {
                path.file_name()
                    .and_then(OsStr::to_str)
                    .is_some_and(|name| name.starts_with(prefix))
            })
        })
        .collect();

    files.sort();
    files
}

fn has_yaml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case(YAML_EXTENSION))
}

/// Parse one settings file.
///
/// Returns `None` for an empty document. The file handle is closed before
/// parsing starts.
fn load_document(path: &Path) -> ConfigResult<Option<Mapping>> {
    debug!("Load config file: {}", path.display());

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if is_blank_document(&content) {
        return Ok(None);
    }

    let mut document: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    document.apply_merge().map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(key) = non_finite_key(&document, &mut Vec::new()) {
        return Err(ConfigError::NonFiniteNumber {
            path: path.to_path_buf(),
            key,
        });
    }

    match document {
        serde_yaml::Value::Null => Ok(None),
        serde_yaml::Value::Mapping(_) => {
            let value = serde_json::to_value(&document).map_err(|source| ConfigError::Convert {
                path: path.to_path_buf(),
                source,
            })?;
            match value {
                Value::Object(map) => Ok(Some(map)),
                other => Err(ConfigError::InvalidDocument {
                    path: path.to_path_buf(),
                    found: kind_of(&other),
                }),
            }
        }
        other => Err(ConfigError::InvalidDocument {
            path: path.to_path_buf(),
            found: yaml_kind(&other),
        }),
    }
}

/// Dotted key of the first `.nan` / `.inf` value, which the settings tree cannot hold.
fn non_finite_key(value: &serde_yaml::Value, trail: &mut Vec<String>) -> Option<String> {
    match value {
        serde_yaml::Value::Number(n) if n.is_nan() || n.is_infinite() => Some(trail.join(".")),
        serde_yaml::Value::Sequence(items) => items.iter().enumerate().find_map(|(index, item)| {
            trail.push(index.to_string());
            let found = non_finite_key(item, trail);
            trail.pop();
            found
        }),
        serde_yaml::Value::Mapping(map) => map.iter().find_map(|(key, item)| {
            let key = match key {
                serde_yaml::Value::String(s) => s.clone(),
                other => serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            };
            trail.push(key);
            let found = non_finite_key(item, trail);
            trail.pop();
            found
        }),
        serde_yaml::Value::Tagged(tagged) => non_finite_key(&tagged.value, trail),
        _ => None,
    }
}

/// True for documents holding only whitespace, comments and markers.
fn is_blank_document(content: &str) -> bool {
    content.lines().map(str::trim).all(|line| {
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}
