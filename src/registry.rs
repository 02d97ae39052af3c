//! The task registry: a map from target to the task that produces it.
//! Registering a task for a target that's already claimed replaces the
//! previous entry for that target only — invariant A, "later registration
//! wins", is enforced per-target, not per-task-object.

use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;

use crate::cache::CacheKey;
use crate::target::TargetId;
use crate::task::{TaskBody, TaskEntry};

#[derive(Clone, Default)]
pub struct Registry {
    by_target: Arc<DashMap<TargetId, Arc<TaskEntry>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task body under every target it produces. Per invariant
    /// A, a target already claimed by an earlier registration is silently
    /// overwritten — only the entry for that specific target moves to the
    /// new task; other targets of the old task (if any) keep pointing at
    /// it.
    pub fn register(&self, body: Arc<dyn TaskBody>) {
        let entry = Arc::new(TaskEntry::new(body.clone()));
        for target in body.targets() {
            self.by_target.insert(target.clone(), entry.clone());
        }
    }

    pub fn get(&self, target: &TargetId) -> Option<Arc<TaskEntry>> {
        self.by_target.get(target).map(|e| e.clone())
    }

    /// Every distinct task entry currently registered, deduplicated by
    /// pointer identity (a multi-target task appears once, not once per
    /// target).
    pub fn distinct_entries(&self) -> Vec<Arc<TaskEntry>> {
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for kv in self.by_target.iter() {
            let entry = kv.value();
            let ptr = Arc::as_ptr(entry) as *const ();
            if seen.insert(ptr) {
                out.push(entry.clone());
            }
        }
        out
    }

    /// Whether `candidate` names a target some task in this registry is
    /// responsible for producing — used by the compile task to check
    /// invariant C against dynamically discovered headers.
    pub fn contains(&self, candidate: &TargetId) -> bool {
        self.by_target.contains_key(candidate)
    }

    pub async fn reset_for_new_run(&self) {
        for entry in self.distinct_entries() {
            entry.reset_for_new_run().await;
        }
    }

    /// Install previously persisted cache keys onto the matching entries.
    /// Returns `(assigned, dropped)` counts for logging: `dropped` is the
    /// number of persisted entries whose target no longer has a task
    /// registered (a stale entry from a build description that changed).
    pub async fn install_cached_keys(&self, persisted: HashMap<TargetId, CacheKey>) -> (usize, usize) {
        let mut assigned = 0;
        let mut dropped = 0;
        for (target, key) in persisted {
            match self.get(&target) {
                Some(entry) => {
                    entry.install_cached_key(key).await;
                    assigned += 1;
                }
                None => dropped += 1,
            }
        }
        (assigned, dropped)
    }

    /// Snapshot every entry's currently installed cache key, for writing
    /// back to disk. Targets with no key (abstract tasks, or tasks never
    /// reached this run) are omitted.
    pub async fn collect_cached_keys(&self) -> HashMap<TargetId, CacheKey> {
        let mut out = HashMap::new();
        for kv in self.by_target.iter() {
            let target = kv.key().clone();
            let entry = kv.value();
            if let Some(key) = entry.cached_key().await {
                out.insert(target, key);
            }
        }
        out
    }
}
