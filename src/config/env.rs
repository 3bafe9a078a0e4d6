//! Environment variable sources.
//!
//! The loader never reads `std::env` directly: it works from an
//! [`EnvSnapshot`], captured from the process once per load or built from
//! explicit pairs in tests.

use super::keypath::KeyPath;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Immutable, name-sorted capture of environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    ///
    /// Variables whose name or value is not valid UTF-8 are skipped.
    pub fn capture() -> Self {
        std::env::vars_os()
            .filter_map(|(name, value)| Some((name.into_string().ok()?, value.into_string().ok()?)))
            .collect()
    }

    /// Exact-name lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Variables whose name starts with `prefix`, ignoring ASCII case.
    ///
    /// Yields `(full name, name remainder after the prefix, value)`.
    pub fn with_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str, &'a str)> + 'a {
        self.vars.iter().filter_map(move |(name, value)| {
            let head = name.get(..prefix.len())?;
            head.eq_ignore_ascii_case(prefix)
                .then(|| (name.as_str(), &name[prefix.len()..], value.as_str()))
        })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvSnapshot {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// One override decoded from an environment variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvOverride {
    /// Variable name as found in the environment.
    pub var: String,
    /// Key path the value is written to.
    pub path: KeyPath,
    /// Raw value, stored as a string.
    pub value: String,
}

/// Decode every prefixed variable into an override, in variable-name order.
///
/// A variable that decodes to an empty path, or to a path with an empty
/// segment, is skipped.
pub fn collect_overrides(env: &EnvSnapshot, prefix: &str, splitter: &str) -> Vec<EnvOverride> {
    let mut overrides = Vec::new();

    for (var, rest, value) in env.with_prefix(prefix) {
        let path = KeyPath::from_env_name(rest, splitter);
        if path.is_empty() || path.has_empty_segment() {
            warn!(variable = %var, "Ignoring env variable: no usable key path");
            continue;
        }

        debug!(variable = %var, key = %path, "Found env variable");
        overrides.push(EnvOverride {
            var: var.to_string(),
            path,
            value: value.to_string(),
        });
    }

    overrides
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> EnvSnapshot {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_get_exact_name() {
        let env = snapshot(&[("APP_ENV", "production")]);
        assert_eq!(env.get("APP_ENV"), Some("production"));
        assert_eq!(env.get("app_env"), None);
    }

    #[test]
    fn test_prefix_match_ignores_case() {
        let env = snapshot(&[
            ("SETTINGS__A", "1"),
            ("settings__b", "2"),
            ("OTHER__C", "3"),
            ("SET", "4"),
        ]);
        let names: Vec<_> = env.with_prefix("Settings").map(|(name, _, _)| name).collect();
        assert_eq!(names, vec!["SETTINGS__A", "settings__b"]);
    }

    #[test]
    fn test_prefix_on_multibyte_name() {
        let env = snapshot(&[("SETTINGSé__A", "1"), ("é", "2")]);
        let matched: Vec<_> = env.with_prefix("SETTINGS").map(|(_, rest, _)| rest).collect();
        assert_eq!(matched, vec!["é__A"]);
        assert_eq!(env.with_prefix("SETTINGSX").count(), 0);
    }

    #[test]
    fn test_collect_overrides() {
        let env = snapshot(&[
            ("SETTINGS__CUSTOM__NEW__VAR", "environment value"),
            ("SETTINGS__VAR__FROM__ENV", "other"),
            ("PATH", "/usr/bin"),
        ]);
        let overrides = collect_overrides(&env, "SETTINGS", "__");
        assert_eq!(overrides.len(), 2);
        assert_eq!(overrides[0].path, KeyPath::new(["custom", "new", "var"]));
        assert_eq!(overrides[0].value, "environment value");
        assert_eq!(overrides[1].var, "SETTINGS__VAR__FROM__ENV");
    }

    #[test]
    fn test_collect_overrides_skips_unusable_names() {
        let env = snapshot(&[
            ("SETTINGS", "bare prefix"),
            ("SETTINGS____", "only splitters"),
            ("SETTINGS__A____B", "empty segment"),
            ("SETTINGS__OK", "kept"),
        ]);
        let overrides = collect_overrides(&env, "SETTINGS", "__");
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].path, KeyPath::new(["ok"]));
    }

    #[test]
    fn test_collect_overrides_custom_prefix_and_splitter() {
        let env = snapshot(&[("MYPREFIX_._._CUSTOM_._._NEW_._._VAR", "val")]);
        let overrides = collect_overrides(&env, "myprefix", "_._._");
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides[0].path, KeyPath::new(["custom", "new", "var"]));
    }

    #[test]
    fn test_capture_reads_process_env() {
        // cargo sets CARGO_* for test binaries.
        let env = EnvSnapshot::capture();
        assert!(!env.is_empty());
    }
}
