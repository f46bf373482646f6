//! Capability tags carried by servers and required by delivery services

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Set of opaque capability tags.
///
/// Ordered so that anything derived from it (logs, skip reports) is stable
/// across runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<String>);

impl CapabilitySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a tag, returning false if it was already present
    pub fn insert(&mut self, capability: impl Into<String>) -> bool {
        self.0.insert(capability.into())
    }

    /// Check membership of a single tag
    pub fn contains(&self, capability: &str) -> bool {
        self.0.contains(capability)
    }

    /// True when no tags are present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of tags
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate tags in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Union of two sets
    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        Self(self.0.union(&other.0).cloned().collect())
    }
}

impl<S: Into<String>> FromIterator<S> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}
