//! The cache key type and the on-disk persisted cache (`maek-cache.json`):
//! a flat map from target name to the canonical JSON form of the key that
//! produced it last time, reloaded and pruned of stale entries at the start
//! of every run, and rewritten atomically at the end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use color_eyre::eyre::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fs;
use crate::target::TargetId;

/// A cache key is any JSON-serializable nested sequence; two keys are equal
/// exactly when their canonical JSON string forms are equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(Value);

impl CacheKey {
    pub fn new(value: impl Serialize) -> Self {
        Self(serde_json::to_value(value).expect("cache key values are always representable as JSON"))
    }

    pub fn canonical(&self) -> String {
        self.0.to_string()
    }
}

impl PartialEq<Value> for CacheKey {
    fn eq(&self, other: &Value) -> bool {
        self.0 == *other
    }
}

/// The persisted cache file: target name to that target's last-known key,
/// serialized as its canonical JSON.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile(HashMap<String, Value>);

pub struct PersistedCache {
    path: PathBuf,
}

impl PersistedCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the persisted map, dropping (and logging) any entry that fails
    /// to parse as JSON rather than failing the whole load — a corrupted
    /// single entry shouldn't cold-start the entire build.
    pub async fn load(&self) -> HashMap<TargetId, CacheKey> {
        let contents = match fs::read_optional_to_string(&self.path).await {
            Ok(Some(s)) => s,
            Ok(None) => return HashMap::new(),
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "failed to read cache file, starting cold");
                return HashMap::new();
            }
        };

        let parsed: CacheFile = match serde_json::from_str(&contents) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "cache file is corrupt, starting cold");
                return HashMap::new();
            }
        };

        parsed
            .0
            .into_iter()
            .map(|(k, v)| (TargetId::new(k), CacheKey(v)))
            .collect()
    }

    /// Rewrite the cache file atomically (temp file + rename) so a crash
    /// mid-write never corrupts the previous, still-valid cache.
    pub async fn save(&self, entries: &HashMap<TargetId, CacheKey>) -> Result<()> {
        let map: HashMap<String, Value> = entries
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), v.0.clone()))
            .collect();
        let contents = serde_json::to_string_pretty(&map)?;
        fs::write_atomic(&self.path, contents).await
    }
}

pub fn default_cache_path(root: impl AsRef<Path>) -> PathBuf {
    root.as_ref().join("maek-cache.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_form_is_order_sensitive_on_arrays_but_not_object_identity() {
        let a = CacheKey::new(serde_json::json!(["a", "b"]));
        let b = CacheKey::new(serde_json::json!(["b", "a"]));
        assert_ne!(a.canonical(), b.canonical());
        let c = CacheKey::new(serde_json::json!(["a", "b"]));
        assert_eq!(a.canonical(), c.canonical());
    }

    #[tokio::test]
    async fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maek-cache.json");
        let cache = PersistedCache::new(&path);

        let mut entries = HashMap::new();
        entries.insert(TargetId::new("obj/a.o"), CacheKey::new(serde_json::json!(["cmd", "a.o:abc"])));
        cache.save(&entries).await.unwrap();

        let loaded = cache.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[&TargetId::new("obj/a.o")], entries[&TargetId::new("obj/a.o")]);
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist.json");
        let cache = PersistedCache::new(&path);
        assert!(cache.load().await.is_empty());
    }
}
