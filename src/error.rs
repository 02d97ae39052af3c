//! The two error kinds that flow out of the engine: [`BuildError`], which is
//! expected, user-facing, and already logged by the time it reaches a
//! caller, and [`MaekError::Internal`], which wraps an unexpected
//! [`color_eyre::Report`] and is left to propagate with its full diagnostic.

use std::fmt;
use std::sync::Arc;

use color_eyre::Report;
use derive_more::Display;

/// An error a build description is expected to hit: a failing command, a
/// missing file, a malformed dependency file, a registry collision. Carries
/// only a message, since the detailed cause was already logged once at the
/// point of discovery.
#[derive(Debug, Clone, Display)]
#[display("{message}")]
pub struct BuildError {
    message: String,
}

impl BuildError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::error::Error for BuildError {}

/// The error type threaded through resolution. `Build` is the expected
/// "a prerequisite failed" case; `Internal` is everything else (I/O errors
/// outside the build graph, bugs) and carries the original report so the
/// root driver can print it in full.
#[derive(Debug, Clone)]
pub enum MaekError {
    Build(BuildError),
    Internal(Arc<Report>),
}

impl MaekError {
    pub fn build(message: impl Into<String>) -> Self {
        Self::Build(BuildError::new(message))
    }

    pub fn internal(report: Report) -> Self {
        Self::Internal(Arc::new(report))
    }
}

impl fmt::Display for MaekError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaekError::Build(e) => write!(f, "{e}"),
            MaekError::Internal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for MaekError {}

impl From<BuildError> for MaekError {
    fn from(e: BuildError) -> Self {
        MaekError::Build(e)
    }
}

impl From<Report> for MaekError {
    fn from(e: Report) -> Self {
        MaekError::internal(e)
    }
}
