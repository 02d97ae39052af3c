//! Maek: a small, hackable, content-addressed parallel build engine.
//!
//! A build description registers tasks against [`Maek`] (generic rules, or
//! the `cpp`/`link` specializations) and then calls [`Maek::update`] to
//! resolve a set of root targets. Tasks are content-addressed: a task only
//! reruns when its cache key — its command plus hashes of its inputs and
//! outputs — changes from the last run, and `maek-cache.json` persists keys
//! between invocations.

pub mod build;
pub mod cache;
pub mod depfile;
pub mod engine;
pub mod error;
pub mod fs;
pub mod hash;
pub mod job;
pub mod log;
pub mod options;
pub mod platform;
pub mod registry;
pub mod runner;
pub mod target;
pub mod task;
pub mod tasks;

pub use build::Maek;
pub use error::{BuildError, MaekError};
pub use options::OptionsConfig;
pub use target::TargetId;
