//! Reference and blob operations for Vcs.
//!
//! These delegate to the active `GitBackend`, which hides the reftable vs.
//! files format difference.

use anyhow::Result;

use super::{Oid, Vcs};

impl Vcs {
    /// Find a reference by name. Returns `None` if it doesn't exist.
    pub fn find_reference(&self, name: &str) -> Result<Option<Oid>> {
        match self.backend.find_reference(name)? {
            Some((_, oid)) => Ok(Some(oid)),
            None => Ok(None),
        }
    }

    /// List references matching a glob pattern, e.g. `refs/stack/backup/*`.
    pub fn list_references(&self, glob_pattern: &str) -> Result<Vec<(String, Oid)>> {
        self.backend.list_references(glob_pattern)
    }

    /// Create or update a reference. Fails if it exists unless `force`.
    pub fn create_reference(&self, name: &str, target: &Oid, force: bool, msg: &str) -> Result<()> {
        self.backend.create_reference(name, target, force, msg)
    }

    /// Delete a reference. Idempotent: succeeds even if it doesn't exist.
    pub fn delete_reference(&self, name: &str) -> Result<()> {
        self.backend.delete_reference(name)
    }

    pub fn create_blob(&self, content: &[u8]) -> Result<Oid> {
        self.backend.create_blob(content)
    }

    pub fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>> {
        self.backend.read_blob(oid)
    }
}
