//! Persistent store: reads and writes the per-repo on-disk area under
//! `<git-dir>/stack/` — stack descriptors, PR data, the install marker, the
//! current-stack pointer, and rebase-recovery state.

pub mod atomic;
pub mod local_draft;
pub mod lock;
pub mod pr_data;
pub mod rebase_state;
pub mod stack;

pub use lock::OperationLock;
pub use pr_data::PrData;
pub use rebase_state::RebaseState;
pub use stack::StackDescriptor;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::vcs::find_git_root;

/// Root of the persisted store, `<git-dir>/stack/`.
pub fn store_root() -> Result<PathBuf> {
    let git_root = find_git_root()?;
    Ok(git_root.join(".git").join("stack"))
}

pub fn store_root_from(git_root: &Path) -> PathBuf {
    git_root.join(".git").join("stack")
}

fn stack_dir(store_root: &Path, name: &str) -> PathBuf {
    store_root.join(name)
}

/// Presence of this file means hooks are installed for the repository.
pub fn is_installed(store_root: &Path) -> bool {
    store_root.join("installed").exists()
}

pub fn mark_installed(store_root: &Path) -> Result<()> {
    fs::create_dir_all(store_root)?;
    atomic::write_atomic(&store_root.join("installed"), b"")
}

pub fn mark_uninstalled(store_root: &Path) -> Result<()> {
    let marker = store_root.join("installed");
    if marker.exists() {
        fs::remove_file(&marker).context("failed to remove install marker")?;
    }
    Ok(())
}

/// Name of the current stack, if any.
pub fn read_current(store_root: &Path) -> Result<Option<String>> {
    let path = store_root.join("current");
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).context("failed to read current-stack marker")?;
    let name = content.trim().to_string();
    if name.is_empty() {
        Ok(None)
    } else {
        Ok(Some(name))
    }
}

pub fn write_current(store_root: &Path, name: &str) -> Result<()> {
    fs::create_dir_all(store_root)?;
    atomic::write_atomic(&store_root.join("current"), name.as_bytes())
}

pub fn clear_current(store_root: &Path) -> Result<()> {
    let path = store_root.join("current");
    if path.exists() {
        fs::remove_file(&path).context("failed to clear current-stack marker")?;
    }
    Ok(())
}

/// List the names of all stacks with persisted metadata.
pub fn list_stack_names(store_root: &Path) -> Result<Vec<String>> {
    if !store_root.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in fs::read_dir(store_root).context("failed to read store root")? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                if stack_dir(store_root, name).join("stack.json").exists() {
                    names.push(name.to_string());
                }
            }
        }
    }
    names.sort();
    Ok(names)
}

pub fn read_last_sync(store_root: &Path, name: &str) -> Result<Option<DateTime<Utc>>> {
    let path = stack_dir(store_root, name).join("last_sync");
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path).context("failed to read last_sync")?;
    let ts = DateTime::parse_from_rfc3339(content.trim())
        .context("last_sync file contains invalid RFC3339 timestamp")?
        .with_timezone(&Utc);
    Ok(Some(ts))
}

pub fn write_last_sync(store_root: &Path, name: &str, timestamp: DateTime<Utc>) -> Result<()> {
    let dir = stack_dir(store_root, name);
    fs::create_dir_all(&dir)?;
    atomic::write_atomic(&dir.join("last_sync"), timestamp.to_rfc3339().as_bytes())
}

pub fn delete_stack_dir(store_root: &Path, name: &str) -> Result<()> {
    let dir = stack_dir(store_root, name);
    if dir.exists() {
        fs::remove_dir_all(&dir).with_context(|| format!("failed to remove stack directory for '{}'", name))?;
    }
    Ok(())
}
