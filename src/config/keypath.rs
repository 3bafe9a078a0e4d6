//! Key paths into the settings tree.
//!
//! A [`KeyPath`] is the ordered list of mapping keys leading to a value,
//! outermost first. Paths come from two places: delimiter-joined lookup
//! names (`"multilevel__level2"`) and override variable names
//! (`SETTINGS__CUSTOM__NEW__VAR`).

use std::fmt;

/// Ordered sequence of key segments, leftmost segment is outermost.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath {
    segments: Vec<String>,
}

impl KeyPath {
    /// Create a path from explicit segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Split a delimiter-joined lookup name.
    ///
    /// Segments keep their case: lookups match keys exactly.
    pub fn parse(name: &str, splitter: &str) -> Self {
        if name.is_empty() {
            return Self::default();
        }
        Self::new(name.split(splitter))
    }

    /// Decompose the part of an override variable name that follows the prefix.
    ///
    /// Leading splitter characters are dropped and every segment is lower-cased.
    pub fn from_env_name(rest: &str, splitter: &str) -> Self {
        let rest = rest.trim_start_matches(|c: char| splitter.contains(c));
        if rest.is_empty() {
            return Self::default();
        }
        Self::new(rest.split(splitter).map(str::to_lowercase))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if any segment is the empty string (e.g. `a____b` with `__`).
    pub fn has_empty_segment(&self) -> bool {
        self.segments.iter().any(String::is_empty)
    }

    pub fn push(&mut self, segment: impl Into<String>) {
        self.segments.push(segment.into());
    }

    /// Concatenate two paths, `self` first.
    pub fn join(&self, other: &KeyPath) -> KeyPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        KeyPath { segments }
    }

    /// Split into the parent path and the leaf segment.
    pub fn split_last(&self) -> Option<(&str, &[String])> {
        self.segments
            .split_last()
            .map(|(last, parents)| (last.as_str(), parents))
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl<S: Into<String>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
