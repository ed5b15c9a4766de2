//! Persisted PR metadata: `<name>/prs.json`.
//!
//! This is distinct from `host::PrRecord` (the host adapter's live view of a
//! PR): `store::pr_data::PrRecord` is the engine's own cached snapshot, keyed
//! by the change's stable UUID rather than the host's PR number, and carries
//! the timestamps the engine needs for sync-decision logic.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::StackError;
use crate::host::PrState;
use crate::identity::Uuid16;

use super::atomic::write_json_atomic;

const CURRENT_VERSION: u32 = 1;

/// Cached PR state for a single change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrRecord {
    pub number: u64,
    pub url: String,
    pub state: PrState,
    pub remote_title: String,
    pub remote_body: String,
    pub remote_base: String,
    pub remote_head: String,
    pub remote_draft: bool,
    pub last_pushed_commit: String,
    /// Cached ID of the bot-authored visualization comment, if any.
    pub comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{version, prs: {uuid: PrRecord, ...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrData {
    pub version: u32,
    pub prs: HashMap<Uuid16, PrRecord>,
}

impl PrData {
    pub fn new() -> Self {
        Self { version: CURRENT_VERSION, prs: HashMap::new() }
    }

    fn path(store_root: &Path, name: &str) -> std::path::PathBuf {
        store_root.join(name).join("prs.json")
    }

    pub fn load(store_root: &Path, name: &str) -> Result<Self> {
        let path = Self::path(store_root, name);
        if !path.exists() {
            return Ok(Self::new());
        }

        let content = fs::read_to_string(&path).with_context(|| format!("failed to read {:?}", path))?;
        let data: PrData = serde_json::from_str(&content)
            .with_context(|| format!("PR data at {:?} is corrupted; delete it to recover", path))?;

        if data.version > CURRENT_VERSION {
            return Err(StackError::PersistenceError(format!(
                "{:?} was written by a newer version (schema v{}, this build understands up to v{}); refusing to read it",
                path, data.version, CURRENT_VERSION
            ))
            .into());
        }

        Ok(data)
    }

    pub fn save(&self, store_root: &Path, name: &str) -> Result<()> {
        write_json_atomic(&Self::path(store_root, name), self)
    }

    pub fn get(&self, uuid: &Uuid16) -> Option<&PrRecord> {
        self.prs.get(uuid)
    }

    pub fn set(&mut self, uuid: Uuid16, record: PrRecord) {
        self.prs.insert(uuid, record);
    }

    pub fn remove(&mut self, uuid: &Uuid16) -> Option<PrRecord> {
        self.prs.remove(uuid)
    }

    /// Cached records for changes the host reports as merged, for folding
    /// back into a stack snapshot as retained-but-inactive changes.
    pub fn merged_records(&self) -> impl Iterator<Item = (&Uuid16, &PrRecord)> {
        self.prs.iter().filter(|(_, record)| record.state == PrState::Merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_record() -> PrRecord {
        let now = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        PrRecord {
            number: 42,
            url: "https://example.invalid/pull/42".to_string(),
            state: PrState::Open,
            remote_title: "Add feature".to_string(),
            remote_body: "Body".to_string(),
            remote_base: "main".to_string(),
            remote_head: "alice/stack-feature/abcdef0123456789".to_string(),
            remote_draft: false,
            last_pushed_commit: "deadbeef".to_string(),
            comment_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn load_missing_returns_empty_data_at_current_version() {
        let dir = tempdir().unwrap();
        let data = PrData::load(dir.path(), "feature").unwrap();
        assert_eq!(data.version, CURRENT_VERSION);
        assert!(data.prs.is_empty());
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let uuid = Uuid16::generate();
        let mut data = PrData::new();
        data.set(uuid.clone(), sample_record());
        data.save(dir.path(), "feature").unwrap();

        let loaded = PrData::load(dir.path(), "feature").unwrap();
        assert_eq!(loaded.get(&uuid), Some(&sample_record()));
    }

    #[test]
    fn remove_drops_entry() {
        let uuid = Uuid16::generate();
        let mut data = PrData::new();
        data.set(uuid.clone(), sample_record());
        assert!(data.remove(&uuid).is_some());
        assert!(data.get(&uuid).is_none());
    }

    #[test]
    fn load_refuses_a_newer_schema_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("feature");
        fs::create_dir_all(&path).unwrap();
        let newer = serde_json::json!({ "version": CURRENT_VERSION + 1, "prs": {} });
        fs::write(path.join("prs.json"), serde_json::to_string(&newer).unwrap()).unwrap();
        let err = PrData::load(dir.path(), "feature").unwrap_err();
        assert!(err.to_string().contains("newer version"));
    }
}
