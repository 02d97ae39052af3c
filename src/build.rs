//! [`Maek`]: the public entry point a build description is written against.
//! `rule`/`cpp`/`link` register tasks; `update` is the driver (§4.9): reset
//! per-run state, install the persisted cache, resolve the requested roots,
//! and persist the cache back to disk regardless of outcome.

use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{default_cache_path, PersistedCache};
use crate::engine::Engine;
use crate::error::MaekError;
use crate::fs;
use crate::job::JobLimiter;
use crate::options::{self, Options, OptionsConfig};
use crate::platform::{self, Os};
use crate::target::{targets, TargetId};
use crate::task::TaskBody;
use crate::tasks::compile::CompileTask;
use crate::tasks::link::LinkTask;
use crate::tasks::recipe::RecipeTask;

const CONFIG_FILE: &str = "maek.toml";

pub struct Maek {
    engine: Engine,
    options: Options,
    os: Os,
    cache_path: PathBuf,
}

impl Maek {
    /// Build a driver with the platform's defaults merged against an
    /// optional `maek.toml` in the working directory (§4.12): a missing
    /// file is not an error, but a present one with an unrecognized key is.
    pub async fn new() -> color_eyre::Result<Self> {
        let os = Os::current()?;
        let mut global_options = Options::defaults(os);
        if let Some(contents) = fs::read_optional_to_string(CONFIG_FILE).await? {
            let config = options::parse_config(&contents)?;
            global_options = global_options.merged(&config);
        }

        Ok(Self {
            engine: Engine::new(JobLimiter::new(JobLimiter::default_capacity())),
            options: global_options,
            os,
            cache_path: default_cache_path("."),
        })
    }

    pub fn with_global_options(mut self, config: &OptionsConfig) -> Self {
        self.options = self.options.merged(config);
        self
    }

    pub fn with_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_path = path.into();
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.engine.jobs = JobLimiter::new(jobs);
        self
    }

    /// Register a generic rule: a set of targets produced from a set of
    /// prerequisites by running a sequence of commands.
    pub fn rule(
        &self,
        rule_targets: impl IntoIterator<Item = impl Into<TargetId>>,
        prerequisites: impl IntoIterator<Item = impl Into<TargetId>>,
        recipe: Vec<Vec<String>>,
    ) {
        let body: Arc<dyn TaskBody> = Arc::new(RecipeTask::new(targets(rule_targets), targets(prerequisites), recipe));
        self.engine.registry.register(body);
    }

    /// Register a compile task for one C++ source file and return the
    /// object file target it produces.
    pub fn cpp(&self, source: impl Into<TargetId>, overrides: Option<&OptionsConfig>) -> color_eyre::Result<TargetId> {
        let source: TargetId = source.into();
        let opts = match overrides {
            Some(o) => self.options.merged(o),
            None => self.options.clone(),
        };

        let stem = source
            .as_str()
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(source.as_str());
        let object = TargetId::new(format!("{}{stem}{}", opts.obj_prefix, opts.obj_suffix));
        let dep_file = TargetId::new(format!("{}{stem}.d", opts.obj_prefix));

        let compile_cmd = platform::compile_command(self.os, source.as_str(), object.as_str(), &opts.cpp_flags)?;
        let probe_cmd = platform::probe_command(self.os, source.as_str(), dep_file.as_str(), &opts.cpp_flags)?;

        let body: Arc<dyn TaskBody> = Arc::new(CompileTask::new(
            source,
            object.clone(),
            dep_file,
            &opts.depends,
            compile_cmd,
            probe_cmd,
        ));
        self.engine.registry.register(body);
        Ok(object)
    }

    /// Register a link task for a set of object files and return the
    /// executable target it produces.
    pub fn link(
        &self,
        objects: impl IntoIterator<Item = impl Into<TargetId>>,
        exe_stem: impl AsRef<str>,
        overrides: Option<&OptionsConfig>,
    ) -> color_eyre::Result<TargetId> {
        let objects = targets(objects);
        let opts = match overrides {
            Some(o) => self.options.merged(o),
            None => self.options.clone(),
        };

        let exe = TargetId::new(format!("{}{}", exe_stem.as_ref(), opts.exe_suffix));
        let object_strs: Vec<String> = objects.iter().map(|t| t.as_str().to_string()).collect();
        let link_cmd = platform::link_command(self.os, &object_strs, exe.as_str(), &opts.link_libs)?;

        let body: Arc<dyn TaskBody> = Arc::new(LinkTask::new(objects, exe.clone(), link_cmd));
        self.engine.registry.register(body);
        Ok(exe)
    }

    /// Run the driver: reset per-run state, load the persisted cache,
    /// resolve the requested root targets, then persist the cache back to
    /// disk regardless of whether the resolve succeeded.
    pub async fn update(&self, roots: impl IntoIterator<Item = impl Into<TargetId>>) -> Result<(), MaekError> {
        let roots = targets(roots);

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            jobs = self.engine.jobs.capacity(),
            targets = ?roots,
            "starting build"
        );

        self.engine.registry.reset_for_new_run().await;

        let persisted = PersistedCache::new(&self.cache_path);
        let loaded = persisted.load().await;
        let (assigned, dropped) = self.engine.registry.install_cached_keys(loaded).await;
        tracing::info!(assigned, dropped, "installed persisted cache");

        let result = self.engine.resolve(&roots, "user").await;

        let entries = self.engine.registry.collect_cached_keys().await;
        let cached_count = entries.len();
        if let Err(e) = persisted.save(&entries).await {
            tracing::warn!(error = %e, "failed to persist cache");
        }

        match &result {
            Ok(()) => tracing::info!(cached_count, "build succeeded"),
            Err(MaekError::Build(e)) => tracing::error!(error = %e, cached_count, "build failed"),
            Err(MaekError::Internal(_)) => {}
        }

        result
    }
}
