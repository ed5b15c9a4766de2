//! Persisted local-draft flags: `<name>/local_drafts.json`.
//!
//! Tracks which changes the user has marked draft/ready locally before
//! they have a PR yet (or independent of the host's own draft flag), so
//! the push engine's desired-spec computation can read it back.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::identity::Uuid16;

use super::atomic::write_json_atomic;

const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct LocalDraftData {
    version: u32,
    uuids: HashSet<Uuid16>,
}

fn path(store_root: &Path, name: &str) -> std::path::PathBuf {
    store_root.join(name).join("local_drafts.json")
}

fn load(store_root: &Path, name: &str) -> Result<LocalDraftData> {
    let file = path(store_root, name);
    if !file.exists() {
        return Ok(LocalDraftData { version: CURRENT_VERSION, uuids: HashSet::new() });
    }
    let content = fs::read_to_string(&file).with_context(|| format!("failed to read {:?}", file))?;
    serde_json::from_str(&content).with_context(|| format!("local draft data at {:?} is corrupted", file))
}

/// The full set of UUIDs currently marked local-draft for a stack.
pub fn read_all(store_root: &Path, name: &str) -> Result<HashSet<Uuid16>> {
    Ok(load(store_root, name)?.uuids)
}

/// Set or clear the local-draft flag for one change.
pub fn set(store_root: &Path, name: &str, uuid: &Uuid16, draft: bool) -> Result<()> {
    let mut data = load(store_root, name)?;
    if draft {
        data.uuids.insert(uuid.clone());
    } else {
        data.uuids.remove(uuid);
    }
    write_json_atomic(&path(store_root, name), &data)
}
