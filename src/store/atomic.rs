//! Write-temp-then-rename helper for durable store writes.
//!
//! Every JSON/text write under the store root goes through this so a crash
//! mid-write never leaves a half-written `stack.json`/`prs.json` behind.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use crate::error::StackError;

/// Write `content` to `path` via a sibling temp file, then rename it over
/// the target. The rename is atomic on the same filesystem, so readers
/// never observe a partially written file.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("failed to create directory {:?}", parent))?;
    }

    let tmp_path = path.with_extension(tmp_extension(path));

    {
        let mut file = File::create(&tmp_path).with_context(|| format!("failed to create temp file {:?}", tmp_path))?;
        file.write_all(content).with_context(|| format!("failed to write temp file {:?}", tmp_path))?;
        file.sync_all().ok();
    }

    fs::rename(&tmp_path, path).with_context(|| format!("failed to rename {:?} to {:?}", tmp_path, path))?;

    Ok(())
}

/// Serialize `value` as pretty JSON and write it atomically.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value).context("failed to serialize JSON")?;
    write_atomic(path, content.as_bytes())
}

#[derive(Serialize)]
struct VersionedRef<'a, T> {
    version: u32,
    #[serde(flatten)]
    inner: &'a T,
}

#[derive(Deserialize)]
struct VersionedOwned<T> {
    version: u32,
    #[serde(flatten)]
    inner: T,
}

/// Serialize `value` under a `{"version": N, ...}` envelope and write it
/// atomically.
pub fn write_versioned_json_atomic<T: Serialize>(path: &Path, version: u32, value: &T) -> Result<()> {
    write_json_atomic(path, &VersionedRef { version, inner: value })
}

/// Read a `{"version": N, ...}` envelope written by `write_versioned_json_atomic`.
///
/// Returns `Ok(None)` if the file doesn't exist. Refuses (`StackError::PersistenceError`)
/// a file whose `version` is newer than `current_version` rather than guessing at a
/// schema it doesn't understand.
pub fn read_versioned_json<T: DeserializeOwned>(
    path: &Path,
    current_version: u32,
) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).with_context(|| format!("failed to read {:?}", path))?;
    let envelope: VersionedOwned<T> = serde_json::from_str(&content)
        .with_context(|| format!("{:?} is corrupted; delete it to recover", path))?;

    if envelope.version > current_version {
        return Err(StackError::PersistenceError(format!(
            "{:?} was written by a newer version (schema v{}, this build understands up to v{}); refusing to read it",
            path, envelope.version, current_version
        ))
        .into());
    }

    Ok(Some(envelope.inner))
}

fn tmp_extension(path: &Path) -> String {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{}.tmp", ext),
        None => "tmp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_atomic_creates_file_with_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("file.txt");
        write_atomic(&path, b"hello").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello");
    }

    #[test]
    fn write_atomic_overwrites_existing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("file.txt");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stack.json");
        write_atomic(&path, b"{}").unwrap();
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[derive(serde::Serialize)]
    struct Sample {
        a: u32,
    }

    #[test]
    fn write_json_atomic_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.json");
        write_json_atomic(&path, &Sample { a: 7 }).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"a\": 7"));
    }
}
