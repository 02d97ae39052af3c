//! The generic `RULE`-style task: a set of targets, explicit prerequisites,
//! and a sequence of commands. Resolves prerequisites, runs each command in
//! order, then invalidates its targets' hash-cache entries. Unlike compile
//! and link it does not invalidate before running: it has no dedicated
//! probe step to protect, only the single hash-cache invariant that a
//! target's entry must not be stale once the recipe has finished.

use async_trait::async_trait;
use itertools::Itertools;

use crate::cache::CacheKey;
use crate::engine::Engine;
use crate::error::MaekError;
use crate::target::TargetId;
use crate::task::TaskBody;

pub struct RecipeTask {
    targets: Vec<TargetId>,
    prerequisites: Vec<TargetId>,
    recipe: Vec<Vec<String>>,
    label: String,
}

impl RecipeTask {
    pub fn new(targets: Vec<TargetId>, prerequisites: Vec<TargetId>, recipe: Vec<Vec<String>>) -> Self {
        let label = format!("rule {}", targets.iter().map(TargetId::as_str).join(" "));
        Self {
            targets,
            prerequisites,
            recipe,
            label,
        }
    }

    fn is_abstract(&self) -> bool {
        self.targets.iter().any(TargetId::is_abstract)
    }
}

#[async_trait]
impl TaskBody for RecipeTask {
    fn targets(&self) -> &[TargetId] {
        &self.targets
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn key(&self, engine: &Engine) -> Result<Option<CacheKey>, MaekError> {
        // Invariant B: a task with any abstract target never has a key_fn
        // and therefore always reruns.
        if self.is_abstract() {
            return Ok(None);
        }

        engine.resolve(&self.prerequisites, &self.label).await?;

        let mut paths: Vec<&str> = self.targets.iter().map(TargetId::as_str).collect();
        paths.extend(self.prerequisites.iter().map(TargetId::as_str));
        let records = engine.hash.records(&paths).await;

        Ok(Some(CacheKey::new((&self.recipe, records))))
    }

    async fn run(&self, engine: &Engine) -> Result<(), MaekError> {
        engine.resolve(&self.prerequisites, &self.label).await?;

        for command in &self.recipe {
            engine.run_command(command, &self.label).await?;
        }

        engine.hash.invalidate_targets(&self.targets);
        Ok(())
    }
}
