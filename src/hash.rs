//! Content hashing and the per-run hash cache.
//!
//! A hash record is the string `"<path>:<digest>"`, base64 of a 128-bit
//! blake3 digest, or `"<path>:x"` when the file is missing or unreadable.
//! [`HashCache`] memoizes these per run so that a prerequisite read by many
//! tasks is only hashed from disk once, and lets the compile/link tasks
//! invalidate an entry immediately before they rewrite the file it names.

use base64::Engine as _;
use dashmap::DashMap;
use std::sync::Arc;

use crate::fs;
use crate::target::TargetId;

const DIGEST_LEN: usize = 16;

/// Hash 128 bits of blake3 output and base64-encode them, or return the `x`
/// sentinel if the file can't be read.
pub async fn hash_record(path: &str) -> String {
    match fs::read_buffered(path).await {
        Ok(bytes) => {
            let full = blake3::hash(&bytes);
            let digest = base64::engine::general_purpose::STANDARD.encode(&full.as_bytes()[..DIGEST_LEN]);
            format!("{path}:{digest}")
        }
        Err(_) => format!("{path}:x"),
    }
}

/// Per-run memoization of [`hash_record`], keyed on path. Entries are
/// dropped explicitly by [`HashCache::invalidate`] so a task that's about to
/// rewrite a file never hands a stale record to a concurrent reader.
#[derive(Clone, Default)]
pub struct HashCache {
    entries: Arc<DashMap<String, String>>,
}

impl HashCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hash cache-affecting invalidation for a single path. Idempotent.
    pub fn invalidate(&self, path: &str) {
        self.entries.remove(path);
    }

    /// Hash cache-affecting invalidation for every path naming a target.
    pub fn invalidate_targets(&self, ids: &[TargetId]) {
        for id in ids {
            self.invalidate(id.as_str());
        }
    }

    async fn record(&self, path: &str) -> String {
        if let Some(existing) = self.entries.get(path) {
            return existing.clone();
        }
        let record = hash_record(path).await;
        self.entries.insert(path.to_string(), record.clone());
        record
    }

    /// Hash every path in parallel, returning one record per path in the
    /// order given. Callers that need a canonical key sort the result
    /// themselves: the cache makes no ordering guarantees of its own.
    pub async fn records(&self, paths: &[&str]) -> Vec<String> {
        let futs = paths.iter().map(|p| self.record(p));
        futures::future::join_all(futs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn missing_file_hashes_to_sentinel() {
        let record = hash_record("/no/such/file/hopefully-anywhere").await;
        assert_eq!(record, "/no/such/file/hopefully-anywhere:x");
    }

    #[tokio::test]
    async fn invalidate_forces_rehash() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        tokio::fs::write(&path, b"one").await.unwrap();
        let cache = HashCache::new();
        let path_str = path.to_str().unwrap();
        let first = cache.record(path_str).await;
        tokio::fs::write(&path, b"two").await.unwrap();
        let cached = cache.record(path_str).await;
        assert_eq!(first, cached, "cache should still return the stale record");
        cache.invalidate(path_str);
        let fresh = cache.record(path_str).await;
        assert_ne!(first, fresh);
    }
}
