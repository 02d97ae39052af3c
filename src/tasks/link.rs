//! The `LINK`-style task: a set of object files to one executable.

use async_trait::async_trait;

use crate::cache::CacheKey;
use crate::engine::Engine;
use crate::error::MaekError;
use crate::fs;
use crate::target::TargetId;
use crate::task::TaskBody;

pub struct LinkTask {
    objects: Vec<TargetId>,
    exe: TargetId,
    link_cmd: Vec<String>,
    label: String,
}

impl LinkTask {
    pub fn new(objects: Vec<TargetId>, exe: TargetId, link_cmd: Vec<String>) -> Self {
        let label = format!("link {}", exe.as_str());
        Self {
            objects,
            exe,
            link_cmd,
            label,
        }
    }
}

#[async_trait]
impl TaskBody for LinkTask {
    fn targets(&self) -> &[TargetId] {
        std::slice::from_ref(&self.exe)
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn key(&self, engine: &Engine) -> Result<Option<CacheKey>, MaekError> {
        engine.resolve(&self.objects, &self.label).await?;

        let mut paths: Vec<&str> = vec![self.exe.as_str()];
        paths.extend(self.objects.iter().map(TargetId::as_str));
        let records = engine.hash.records(&paths).await;

        Ok(Some(CacheKey::new((&self.link_cmd, records))))
    }

    async fn run(&self, engine: &Engine) -> Result<(), MaekError> {
        engine.resolve(&self.objects, &self.label).await?;

        engine.hash.invalidate(self.exe.as_str());
        fs::ensure_parent_dir(self.exe.as_str())
            .await
            .map_err(MaekError::internal)?;

        engine.run_command(&self.link_cmd, &self.label).await?;

        engine.hash.invalidate(self.exe.as_str());
        Ok(())
    }
}
