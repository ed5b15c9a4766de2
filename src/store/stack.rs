//! Stack descriptor persistence: `<name>/stack.json`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::atomic::{read_versioned_json, write_versioned_json_atomic};

const CURRENT_VERSION: u32 = 1;

/// On-disk stack descriptor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StackDescriptor {
    pub name: String,
    pub username: String,
    pub base: String,
    pub stack_branch: String,
    pub owner: String,
    pub repo: String,
}

impl StackDescriptor {
    fn path(store_root: &Path, name: &str) -> std::path::PathBuf {
        store_root.join(name).join("stack.json")
    }

    pub fn load(store_root: &Path, name: &str) -> Result<Option<Self>> {
        read_versioned_json(&Self::path(store_root, name), CURRENT_VERSION)
    }

    pub fn save(&self, store_root: &Path) -> Result<()> {
        write_versioned_json_atomic(&Self::path(store_root, &self.name), CURRENT_VERSION, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn sample() -> StackDescriptor {
        StackDescriptor {
            name: "feature".to_string(),
            username: "alice".to_string(),
            base: "main".to_string(),
            stack_branch: "alice/stack-feature/TOP".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        }
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let descriptor = sample();
        descriptor.save(dir.path()).unwrap();
        let loaded = StackDescriptor::load(dir.path(), "feature").unwrap().unwrap();
        assert_eq!(loaded, descriptor);
    }

    #[test]
    fn load_missing_returns_none() {
        let dir = tempdir().unwrap();
        assert!(StackDescriptor::load(dir.path(), "nope").unwrap().is_none());
    }

    #[test]
    fn load_corrupted_errors_with_recovery_hint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature");
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("stack.json"), "not json").unwrap();
        let err = StackDescriptor::load(dir.path(), "feature").unwrap_err();
        assert!(err.to_string().contains("corrupted"));
    }

    #[test]
    fn load_refuses_a_newer_schema_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature");
        fs::create_dir_all(&path).unwrap();
        let newer = serde_json::json!({
            "version": CURRENT_VERSION + 1,
            "name": "feature",
            "username": "alice",
            "base": "main",
            "stack_branch": "alice/stack-feature/TOP",
            "owner": "acme",
            "repo": "widgets",
        });
        fs::write(path.join("stack.json"), serde_json::to_string(&newer).unwrap()).unwrap();
        let err = StackDescriptor::load(dir.path(), "feature").unwrap_err();
        assert!(err.to_string().contains("newer version"));
    }
}
