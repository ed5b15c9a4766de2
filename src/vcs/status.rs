//! Git status parsing, particularly for conflict detection.

use anyhow::{Context, Result};
use std::fmt;

use super::Vcs;

/// A file in conflict state during a rebase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictedFile {
    pub path: String,
    pub conflict_type: ConflictType,
}

/// Type of merge conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictType {
    /// Both modified (UU)
    BothModified,
    /// Both added (AA)
    BothAdded,
    /// Deleted by us (DU)
    DeletedByUs,
    /// Deleted by them (UD)
    DeletedByThem,
    /// Added by us (AU)
    AddedByUs,
    /// Added by them (UA)
    AddedByThem,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::BothModified => write!(f, "both modified"),
            ConflictType::BothAdded => write!(f, "both added"),
            ConflictType::DeletedByUs => write!(f, "deleted by us"),
            ConflictType::DeletedByThem => write!(f, "deleted by them"),
            ConflictType::AddedByUs => write!(f, "added by us"),
            ConflictType::AddedByThem => write!(f, "added by them"),
        }
    }
}

impl Vcs {
    /// List files currently in conflict state via `git status --porcelain`.
    pub fn get_conflicted_files(&self) -> Result<Vec<ConflictedFile>> {
        let output = std::process::Command::new("git")
            .args(["status", "--porcelain"])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git status")?;

        if !output.status.success() {
            anyhow::bail!("git status failed");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);

        let mut conflicts = Vec::new();
        for line in stdout.lines() {
            if line.len() < 3 {
                continue;
            }

            let x = line.chars().next().unwrap();
            let y = line.chars().nth(1).unwrap();
            let path = line[3..].to_string();

            let conflict_type = match (x, y) {
                ('U', 'U') => Some(ConflictType::BothModified),
                ('A', 'A') => Some(ConflictType::BothAdded),
                ('D', 'U') => Some(ConflictType::DeletedByUs),
                ('U', 'D') => Some(ConflictType::DeletedByThem),
                ('A', 'U') => Some(ConflictType::AddedByUs),
                ('U', 'A') => Some(ConflictType::AddedByThem),
                _ => None,
            };

            if let Some(conflict_type) = conflict_type {
                conflicts.push(ConflictedFile { path, conflict_type });
            }
        }

        Ok(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_type_display() {
        assert_eq!(ConflictType::BothModified.to_string(), "both modified");
        assert_eq!(ConflictType::BothAdded.to_string(), "both added");
        assert_eq!(ConflictType::DeletedByUs.to_string(), "deleted by us");
        assert_eq!(ConflictType::DeletedByThem.to_string(), "deleted by them");
        assert_eq!(ConflictType::AddedByUs.to_string(), "added by us");
        assert_eq!(ConflictType::AddedByThem.to_string(), "added by them");
    }
}
