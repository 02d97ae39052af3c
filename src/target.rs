//! [`TargetId`]: the thing a task produces. Either a file path or an
//! abstract name written `:like-this`, per the distinction every other
//! module (registry, hash cache, resolver) has to respect.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A target name. Abstract targets start with `:` and are never backed by a
/// file on disk; everything else is a path relative to the working
/// directory the engine was started in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Display, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abstract targets (`:foo`) are never backed by a file and are never
    /// cached: their task always reruns.
    pub fn is_abstract(&self) -> bool {
        self.0.starts_with(':')
    }
}

impl From<&str> for TargetId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for TargetId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for TargetId {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Helper for building a `Vec<TargetId>` from any iterator of stringy
/// values, used at every call site that takes target lists.
pub fn targets(items: impl IntoIterator<Item = impl Into<TargetId>>) -> Vec<TargetId> {
    items.into_iter().map(Into::into).collect()
}
