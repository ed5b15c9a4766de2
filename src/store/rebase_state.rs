//! Rebase-recovery state: `<name>/rebase.json`.
//!
//! Written before any multi-step VCS rebase and cleared on success.
//! Its presence after a crash is what `--recover` inspects to decide whether
//! a conflict is still being resolved, has finished externally, or was
//! aborted, to support the restack recovery algorithm.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::atomic::{read_versioned_json, write_versioned_json_atomic};

const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RebaseState {
    pub stack_branch: String,
    pub old_hash: String,
    pub new_hash: String,
    pub original_head: String,
}

impl RebaseState {
    fn path(store_root: &Path, name: &str) -> std::path::PathBuf {
        store_root.join(name).join("rebase.json")
    }

    pub fn load(store_root: &Path, name: &str) -> Result<Option<Self>> {
        read_versioned_json(&Self::path(store_root, name), CURRENT_VERSION)
    }

    pub fn save(&self, store_root: &Path, name: &str) -> Result<()> {
        write_versioned_json_atomic(&Self::path(store_root, name), CURRENT_VERSION, self)
    }

    pub fn clear(store_root: &Path, name: &str) -> Result<()> {
        let path = Self::path(store_root, name);
        if path.exists() {
            fs::remove_file(&path).context("failed to clear rebase recovery state")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> RebaseState {
        RebaseState {
            stack_branch: "alice/stack-feature/TOP".to_string(),
            old_hash: "aaaa".to_string(),
            new_hash: "bbbb".to_string(),
            original_head: "alice/stack-feature/TOP".to_string(),
        }
    }

    #[test]
    fn save_load_clear_cycle() {
        let dir = tempdir().unwrap();
        let state = sample();
        state.save(dir.path(), "feature").unwrap();
        assert_eq!(RebaseState::load(dir.path(), "feature").unwrap(), Some(state));

        RebaseState::clear(dir.path(), "feature").unwrap();
        assert_eq!(RebaseState::load(dir.path(), "feature").unwrap(), None);
    }

    #[test]
    fn clear_is_idempotent_when_absent() {
        let dir = tempdir().unwrap();
        assert!(RebaseState::clear(dir.path(), "feature").is_ok());
    }

    #[test]
    fn load_refuses_a_newer_schema_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature");
        fs::create_dir_all(&path).unwrap();
        let newer = serde_json::json!({
            "version": CURRENT_VERSION + 1,
            "stack_branch": "alice/stack-feature/TOP",
            "old_hash": "aaaa",
            "new_hash": "bbbb",
            "original_head": "alice/stack-feature/TOP",
        });
        fs::write(path.join("rebase.json"), serde_json::to_string(&newer).unwrap()).unwrap();
        let err = RebaseState::load(dir.path(), "feature").unwrap_err();
        assert!(err.to_string().contains("newer version"));
    }
}
