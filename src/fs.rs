//! Small async filesystem helpers, in the teacher's style of wrapping
//! `tokio::fs` with `color_eyre` context rather than bare `io::Error`s.

use color_eyre::eyre::{Context, Result};
use std::path::Path;

pub async fn read_buffered(path: impl AsRef<Path>) -> Result<Vec<u8>> {
    let path = path.as_ref();
    tokio::fs::read(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

pub async fn read_to_string(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))
}

pub async fn write(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

pub async fn create_dir_all(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path)
        .await
        .with_context(|| format!("creating directory {}", path.display()))
}

/// `mkdir -p` the parent directory of a file target, a no-op if the path has
/// no parent component.
pub async fn ensure_parent_dir(path: impl AsRef<Path>) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            create_dir_all(parent).await?;
        }
    }
    Ok(())
}

/// Whether a path exists and can be read, used when the resolver falls
/// through to the filesystem for a target with no registered task.
pub async fn is_readable(path: &str) -> bool {
    tokio::fs::File::open(path).await.is_ok()
}

/// Best-effort read used only for optional files (dep-info output): `None`
/// when the file doesn't exist yet, an error for anything else.
pub async fn read_optional_to_string(path: impl AsRef<Path>) -> Result<Option<String>> {
    let path = path.as_ref();
    match tokio::fs::read_to_string(path).await {
        Ok(s) => Ok(Some(s)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

/// Atomic rewrite: write to a sibling temp file, then rename over the
/// destination, so a crash mid-write never leaves a half-written cache file.
pub async fn write_atomic(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<()> {
    let path = path.as_ref();
    let tmp = path.with_extension("tmp");
    write(&tmp, contents).await?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))
}
