//! [`TaskBody`]: the trait every task kind (generic recipe, compile, link)
//! implements, and [`TaskEntry`]: the registry's per-task wrapper that
//! gives each task's body at most one concurrent execution per run.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};

use crate::cache::CacheKey;
use crate::engine::Engine;
use crate::error::MaekError;
use crate::target::TargetId;

/// A task's targets, label, and the two operations the resolver needs:
/// computing a cache key (when one applies) and actually running the
/// recipe. Implemented by the generic rule task and the compile/link task
/// builders.
#[async_trait]
pub trait TaskBody: Send + Sync {
    /// Every target this task produces.
    fn targets(&self) -> &[TargetId];

    /// A human-readable name used in logs, e.g. `"compile src/Level.cpp"`.
    fn label(&self) -> &str;

    /// Compute this task's cache key, or `Ok(None)` if the task has no
    /// `key_fn` — which per invariant B is always the case when any of its
    /// targets is abstract. Implementations that have prerequisites resolve
    /// them before computing the key, so a key is never read out of date
    /// with its inputs.
    async fn key(&self, engine: &Engine) -> Result<Option<CacheKey>, MaekError>;

    /// Run this task's recipe: resolve prerequisites, run commands,
    /// invalidate whatever hash-cache entries the commands invalidate.
    async fn run(&self, engine: &Engine) -> Result<(), MaekError>;
}

type Pending = Arc<OnceCell<Result<(), MaekError>>>;

/// The registry's handle on one task: its body, the last cache key it was
/// built with, and a one-shot cell ensuring the body runs at most once per
/// driver invocation no matter how many callers ask for it concurrently.
///
/// `pending` is itself swapped out for a fresh cell at the start of every
/// driver invocation (see [`reset_for_new_run`](Self::reset_for_new_run)):
/// a `TaskEntry` outlives any single `update()` call (a `Maek` value may
/// drive several builds over its lifetime), so the one-shot cell has to be
/// rebuilt per run rather than living once for the entry's whole lifetime.
pub struct TaskEntry {
    body: Arc<dyn TaskBody>,
    cached_key: Mutex<Option<CacheKey>>,
    pending: Mutex<Pending>,
}

impl TaskEntry {
    pub fn new(body: Arc<dyn TaskBody>) -> Self {
        Self {
            body,
            cached_key: Mutex::new(None),
            pending: Mutex::new(Arc::new(OnceCell::new())),
        }
    }

    pub fn body(&self) -> &Arc<dyn TaskBody> {
        &self.body
    }

    /// Reset the in-memory `pending` dedup cell and installed cache key, as
    /// happens once at the start of every driver invocation before any
    /// cached keys from disk are installed.
    pub async fn reset_for_new_run(&self) {
        *self.cached_key.lock().await = None;
        *self.pending.lock().await = Arc::new(OnceCell::new());
    }

    pub async fn install_cached_key(&self, key: CacheKey) {
        *self.cached_key.lock().await = Some(key);
    }

    pub async fn cached_key(&self) -> Option<CacheKey> {
        self.cached_key.lock().await.clone()
    }

    /// Resolve this task: if a cache hit is found against the installed
    /// key, skip straight to success; otherwise run the body and, if it has
    /// a key_fn, install the freshly computed key. Concurrent callers
    /// within the same run all observe the same single execution, sharing
    /// whichever `pending` cell was current when they each called in.
    pub async fn update(&self, engine: &Engine) -> Result<(), MaekError> {
        let pending = self.pending.lock().await.clone();
        pending.get_or_init(|| async { self.run_once(engine).await }).await.clone()
    }

    async fn run_once(&self, engine: &Engine) -> Result<(), MaekError> {
        let cached = self.cached_key().await;
        if let Some(cached) = cached {
            if let Some(key) = self.body.key(engine).await? {
                if key == cached {
                    tracing::debug!(label = self.body.label(), "cache hit");
                    return Ok(());
                }
            }
        }

        tracing::info!(label = self.body.label(), "building");
        self.body.run(engine).await?;

        if let Some(key) = self.body.key(engine).await? {
            self.install_cached_key(key).await;
        }

        Ok(())
    }
}
