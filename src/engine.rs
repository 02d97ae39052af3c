//! [`Engine`]: the bundle of registry, hash cache, and job limiter that
//! every task body sees, and the demand-driven resolver (§4.5) that walks
//! the task graph from a set of requested targets.

use crate::error::MaekError;
use crate::fs;
use crate::hash::HashCache;
use crate::job::JobLimiter;
use crate::registry::Registry;
use crate::runner;
use crate::target::TargetId;

#[derive(Clone)]
pub struct Engine {
    pub registry: Registry,
    pub hash: HashCache,
    pub jobs: JobLimiter,
}

impl Engine {
    pub fn new(jobs: JobLimiter) -> Self {
        Self {
            registry: Registry::new(),
            hash: HashCache::new(),
            jobs,
        }
    }

    /// Run a command under the job limiter. The only place command
    /// execution is bounded; hashing, cache lookups, and other filesystem
    /// traffic are not subject to the job limit. `label` identifies the task
    /// the command belongs to, so concurrent command output can be
    /// attributed to the task producing it.
    pub async fn run_command(&self, command: &[String], label: &str) -> Result<(), MaekError> {
        let _permit = self.jobs.acquire().await;
        runner::run(command, label).await
    }

    /// Resolve a set of targets requested by `requester`, fanning out
    /// concurrently. Internal errors short-circuit immediately; build
    /// errors are logged as "prerequisite failed" (the detailed cause was
    /// already logged once, at the task that discovered it) and collected,
    /// with the whole resolve reported as failed if any target failed.
    pub async fn resolve(&self, target_ids: &[TargetId], requester: &str) -> Result<(), MaekError> {
        let futs = target_ids.iter().map(|t| self.resolve_one(t));
        let results = futures::future::join_all(futs).await;

        let mut any_failed = false;
        for result in results {
            if let Err(err) = result {
                match &err {
                    MaekError::Internal(_) => return Err(err),
                    MaekError::Build(e) => {
                        tracing::error!(requester, error = %e, "prerequisite failed");
                        any_failed = true;
                    }
                }
            }
        }

        if any_failed {
            Err(MaekError::build("prerequisite failed"))
        } else {
            Ok(())
        }
    }

    async fn resolve_one(&self, target: &TargetId) -> Result<(), MaekError> {
        if let Some(entry) = self.registry.get(target) {
            return entry.update(self).await;
        }

        if target.is_abstract() {
            return Err(MaekError::build(format!(
                "target {target} is abstract but has no task producing it"
            )));
        }

        if fs::is_readable(target.as_str()).await {
            Ok(())
        } else {
            Err(MaekError::build(format!(
                "target {target} has no task producing it and does not exist"
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::job::JobLimiter;
    use crate::tasks::recipe::RecipeTask;

    fn engine() -> Engine {
        Engine::new(JobLimiter::new(4))
    }

    /// Simulate the start of a new driver invocation (`Maek::update`) against
    /// the same engine, the way a library consumer calling `update` twice
    /// would see: `pending` is rebuilt so each task may run again.
    async fn start_new_run(engine: &Engine) {
        engine.registry.reset_for_new_run().await;
    }

    #[tokio::test]
    async fn missing_target_with_no_task_is_a_build_error() {
        let engine = engine();
        let err = engine
            .resolve(&[TargetId::new("/no/such/file-anywhere")], "test")
            .await
            .unwrap_err();
        assert!(matches!(err, MaekError::Build(_)));
    }

    #[tokio::test]
    async fn abstract_target_with_no_task_is_a_build_error() {
        let engine = engine();
        let err = engine.resolve(&[TargetId::new(":phony")], "test").await.unwrap_err();
        assert!(matches!(err, MaekError::Build(_)));
    }

    #[tokio::test]
    async fn abstract_target_task_never_installs_a_cache_key() {
        let engine = engine();
        engine.registry.register(Arc::new(RecipeTask::new(
            vec![TargetId::new(":always")],
            vec![],
            vec![vec!["true".to_string()]],
        )));

        engine.resolve(&[TargetId::new(":always")], "test").await.unwrap();

        let entry = engine.registry.get(&TargetId::new(":always")).unwrap();
        assert!(
            entry.cached_key().await.is_none(),
            "invariant B: an abstract-target task must never persist a cache key"
        );
    }

    #[tokio::test]
    async fn later_registration_for_the_same_target_wins() {
        let engine = engine();

        engine.registry.register(Arc::new(RecipeTask::new(
            vec![TargetId::new(":phase")],
            vec![],
            vec![vec!["false".to_string()]],
        )));
        engine.registry.register(Arc::new(RecipeTask::new(
            vec![TargetId::new(":phase")],
            vec![],
            vec![vec!["true".to_string()]],
        )));

        // The second registration's recipe (`true`) is the one that runs; if
        // the first (`false`) were still installed this would fail.
        engine.resolve(&[TargetId::new(":phase")], "test").await.unwrap();
    }

    #[tokio::test]
    async fn cache_hit_skips_the_recipe_on_the_next_run() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ran");
        let marker_str = marker.to_str().unwrap().to_string();

        let engine = engine();
        // Appends a line each time it actually runs, so a second execution
        // is distinguishable from a skipped one without touching mtimes.
        engine.registry.register(Arc::new(RecipeTask::new(
            vec![TargetId::new(marker_str.clone())],
            vec![],
            vec![vec!["sh".to_string(), "-c".to_string(), format!("echo hit >> {marker_str}")]],
        )));

        let target = TargetId::new(marker_str.clone());
        engine.resolve(&[target.clone()], "test").await.unwrap();
        assert_eq!(std::fs::read_to_string(&marker).unwrap(), "hit\n");

        let installed_key = engine.registry.get(&target).unwrap().cached_key().await.unwrap();

        start_new_run(&engine).await;
        // A fresh run reinstalls the same key it just persisted in memory
        // (in a real driver invocation this would come from `maek-cache.json`).
        engine.registry.get(&target).unwrap().install_cached_key(installed_key).await;

        engine.resolve(&[target.clone()], "test").await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&marker).unwrap(),
            "hit\n",
            "recipe should not have rerun: its key matched the installed cached key"
        );
    }
}
