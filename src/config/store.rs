//! The merged, read-only settings store and its lookup views.

use super::keypath::KeyPath;
use super::loader::ConfigSource;
use super::merge::{Mapping, kind_of};
use crate::error::{LookupError, LookupResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Merged settings plus the metadata they were loaded with.
///
/// Built by [`ConfigStore::load`]; never mutated afterwards.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    pub(super) root: Mapping,
    pub(super) env_name: String,
    pub(super) env_value: String,
    pub(super) prefix: String,
    pub(super) splitter: String,
    pub(super) raise_on_missing: bool,
    pub(super) config_dir: PathBuf,
    pub(super) sources: Vec<ConfigSource>,
}

impl ConfigStore {
    /// The resolved active environment, e.g. `development`.
    pub fn current_env(&self) -> &str {
        &self.env_value
    }

    /// Name of the variable that selected the environment.
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Upper-cased override prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn splitter(&self) -> &str {
        &self.splitter
    }

    pub fn raise_on_missing(&self) -> bool {
        self.raise_on_missing
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Contributing sources, in the order they were applied.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// The whole merged tree.
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// A view over the root mapping.
    pub fn view(&self) -> Section<'_> {
        Section {
            map: &self.root,
            base: KeyPath::default(),
            splitter: &self.splitter,
            raise_on_missing: self.raise_on_missing,
        }
    }

    /// Look up a single key or a splitter-joined compound key.
    pub fn get(&self, name: &str) -> LookupResult<Option<&Value>> {
        self.view().get(name)
    }

    pub fn get_path(&self, path: &KeyPath) -> LookupResult<Option<&Value>> {
        self.view().get_path(path)
    }

    /// Look up a nested mapping for further lookups.
    pub fn section(&self, name: &str) -> LookupResult<Option<Section<'_>>> {
        self.view().section(name)
    }

    pub fn get_str(&self, name: &str) -> LookupResult<Option<&str>> {
        self.view().get_str(name)
    }

    /// Deserialize the value at `name` into `T`.
    pub fn extract<T: DeserializeOwned>(&self, name: &str) -> LookupResult<Option<T>> {
        self.view().extract(name)
    }

    /// True if `name` resolves, regardless of the missing-key policy.
    pub fn contains(&self, name: &str) -> bool {
        self.view().contains(name)
    }

    /// Key-sorted, indented rendering of the merged tree (debugging only).
    pub fn dump(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = serde_json::to_string_pretty(&self.root).map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

/// Borrowed view over a mapping inside a [`ConfigStore`].
///
/// Lookups through a section report paths from the store root and follow the
/// store's missing-key policy.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    map: &'a Mapping,
    base: KeyPath,
    splitter: &'a str,
    raise_on_missing: bool,
}

impl<'a> Section<'a> {
    /// Path of this section from the store root (empty for the root).
    pub fn path(&self) -> &KeyPath {
        &self.base
    }

    pub fn as_map(&self) -> &'a Mapping {
        self.map
    }

    pub fn keys(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn get(&self, name: &str) -> LookupResult<Option<&'a Value>> {
        self.get_path(&KeyPath::parse(name, self.splitter))
    }

    /// Descend `path` one segment at a time.
    ///
    /// A missing segment, or an intermediate value that is not a mapping,
    /// is an error under the strict policy and `Ok(None)` otherwise.
    pub fn get_path(&self, path: &KeyPath) -> LookupResult<Option<&'a Value>> {
        match find(self.map, path) {
            Ok(value) => Ok(Some(value)),
            Err(segment) => {
                let requested = self.base.join(path).to_string();
                if self.raise_on_missing {
                    Err(LookupError::KeyNotFound {
                        segment: segment.to_string(),
                        path: requested,
                    })
                } else {
                    warn!(key = %requested, "Key \"{}\" not found!", segment);
                    Ok(None)
                }
            }
        }
    }

    pub fn section(&self, name: &str) -> LookupResult<Option<Section<'a>>> {
        let path = KeyPath::parse(name, self.splitter);
        match self.get_path(&path)? {
            Some(Value::Object(map)) => Ok(Some(Section {
                map,
                base: self.base.join(&path),
                splitter: self.splitter,
                raise_on_missing: self.raise_on_missing,
            })),
            Some(other) => Err(LookupError::TypeMismatch {
                path: self.base.join(&path).to_string(),
                expected: "a mapping",
                found: kind_of(other),
            }),
            None => Ok(None),
        }
    }

    pub fn get_str(&self, name: &str) -> LookupResult<Option<&'a str>> {
        match self.get(name)? {
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(LookupError::TypeMismatch {
                path: self.full_path(name),
                expected: "a string",
                found: kind_of(other),
            }),
            None => Ok(None),
        }
    }

    pub fn extract<T: DeserializeOwned>(&self, name: &str) -> LookupResult<Option<T>> {
        let Some(value) = self.get(name)? else {
            return Ok(None);
        };
        T::deserialize(value)
            .map(Some)
            .map_err(|source| LookupError::Deserialize {
                path: self.full_path(name),
                source,
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        find(self.map, &KeyPath::parse(name, self.splitter)).is_ok()
    }

    fn full_path(&self, name: &str) -> String {
        self.base
            .join(&KeyPath::parse(name, self.splitter))
            .to_string()
    }
}

/// Walk `path` from `map`; on failure return the first unresolved segment.
fn find<'m, 'p>(map: &'m Mapping, path: &'p KeyPath) -> Result<&'m Value, &'p str> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err("");
    };

    let mut current = map;
    for segment in parents {
        match current.get(segment) {
            Some(Value::Object(next)) => current = next,
            _ => return Err(segment.as_str()),
        }
    }
    current.get(leaf).ok_or(leaf)
}
