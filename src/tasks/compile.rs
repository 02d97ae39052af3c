//! The `CPP`-style compile task: one source file to one object file, with
//! header dependencies discovered dynamically by running a dependency-probe
//! command and parsing its make-style dep-info output.

use async_trait::async_trait;

use crate::cache::CacheKey;
use crate::depfile;
use crate::engine::Engine;
use crate::error::{BuildError, MaekError};
use crate::fs;
use crate::target::TargetId;
use crate::task::TaskBody;

pub struct CompileTask {
    source: TargetId,
    object: TargetId,
    dep_file: TargetId,
    explicit_prereqs: Vec<TargetId>,
    compile_cmd: Vec<String>,
    probe_cmd: Vec<String>,
    label: String,
}

impl CompileTask {
    pub fn new(
        source: TargetId,
        object: TargetId,
        dep_file: TargetId,
        depends: &[String],
        compile_cmd: Vec<String>,
        probe_cmd: Vec<String>,
    ) -> Self {
        let mut explicit_prereqs = vec![source.clone()];
        explicit_prereqs.extend(depends.iter().map(TargetId::new));

        let label = format!("compile {}", source.as_str());
        Self {
            source,
            object,
            dep_file,
            explicit_prereqs,
            compile_cmd,
            probe_cmd,
            label,
        }
    }

    /// Run the dependency probe and parse its output into the sorted list
    /// of discovered headers not already among the explicit prerequisites.
    /// `None` (rather than an empty file) if the probe hasn't produced a
    /// dep-info file yet.
    async fn discover_headers(&self, engine: &Engine) -> Result<Vec<String>, MaekError> {
        let Some(contents) = fs::read_optional_to_string(self.dep_file.as_str())
            .await
            .map_err(MaekError::internal)?
        else {
            return Ok(Vec::new());
        };

        let mut discovered = depfile::parse(&contents)?;
        let explicit: std::collections::HashSet<&str> =
            self.explicit_prereqs.iter().map(TargetId::as_str).collect();
        discovered.retain(|h| !explicit.contains(h.as_str()));

        for header in &discovered {
            let header_target = TargetId::new(header.as_str());
            if engine.registry.contains(&header_target) {
                return Err(BuildError::new(format!(
                    "discovered header {header} is itself a registered target, which compile tasks cannot depend on"
                ))
                .into());
            }
        }

        Ok(discovered)
    }
}

#[async_trait]
impl TaskBody for CompileTask {
    fn targets(&self) -> &[TargetId] {
        std::slice::from_ref(&self.object)
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn key(&self, engine: &Engine) -> Result<Option<CacheKey>, MaekError> {
        engine.resolve(&self.explicit_prereqs, &self.label).await?;
        let discovered = self.discover_headers(engine).await?;

        // discovered is already sorted lexically by the dep-file parser.
        let mut paths: Vec<&str> = vec![self.object.as_str(), self.dep_file.as_str()];
        paths.extend(self.explicit_prereqs.iter().map(TargetId::as_str));
        paths.extend(discovered.iter().map(String::as_str));

        let records = engine.hash.records(&paths).await;

        Ok(Some(CacheKey::new((&self.compile_cmd, &self.probe_cmd, records))))
    }

    async fn run(&self, engine: &Engine) -> Result<(), MaekError> {
        engine.resolve(&self.explicit_prereqs, &self.label).await?;

        engine.hash.invalidate(self.object.as_str());
        engine.hash.invalidate(self.dep_file.as_str());

        fs::ensure_parent_dir(self.object.as_str())
            .await
            .map_err(MaekError::internal)?;
        fs::ensure_parent_dir(self.dep_file.as_str())
            .await
            .map_err(MaekError::internal)?;

        engine.run_command(&self.compile_cmd, &self.label).await?;
        engine.run_command(&self.probe_cmd, &self.label).await?;

        engine.hash.invalidate(self.object.as_str());
        engine.hash.invalidate(self.dep_file.as_str());

        // Parse the dep-file now so a registry collision is reported as
        // soon as this build produced it, not deferred to the next key()
        // call.
        self.discover_headers(engine).await?;

        Ok(())
    }
}
