//! Branch operations for Vcs.

use anyhow::{bail, Context, Result};
use std::path::PathBuf;

use super::verbose_cmd;
use super::Vcs;

impl Vcs {
    /// Get the name of the currently checked out branch.
    pub fn get_current_branch_name(&self) -> Result<String> {
        self.backend.get_current_branch()
    }

    /// Short commit info for a branch (hash + message summary), for display.
    pub fn get_branch_commit_info(&self, branch: &str) -> Option<String> {
        let short_id = self.backend.get_short_sha(branch).ok()?;
        let message = self.backend.get_commit_subject(branch).ok()?;
        Some(format!("({} {})", short_id, message))
    }

    /// Create a new branch and switch to it.
    pub fn create_branch(&self, name: &str) -> Result<()> {
        verbose_cmd("checkout", &["-b", name]);
        self.backend.create_branch(name)
    }

    pub fn branch_exists(&self, name: &str) -> Result<bool> {
        self.backend.branch_exists(name)
    }

    /// Checkout a branch (force mode), resetting the working tree and index.
    /// Used by rebase/restack operations.
    pub fn checkout_branch(&self, name: &str) -> Result<()> {
        verbose_cmd("checkout", &["-f", name]);
        self.backend.checkout_branch_force(name)
    }

    /// Checkout a branch with full safety checks: fails on uncommitted
    /// changes or if the branch is checked out in another worktree.
    pub fn checkout_branch_worktree_safe(&self, name: &str) -> Result<()> {
        if self.has_staged_or_modified_changes()? {
            bail!(
                "Cannot checkout '{}' - you have uncommitted changes.\n\
                Commit or stash your changes first:\n\
                • git add -A && git commit -m \"WIP\"\n\
                • git stash",
                name
            );
        }

        if let Some(worktree_path) = self.get_worktree_path_for_branch(name)? {
            bail!(
                "Branch '{}' is already checked out at:\n  \
                 {}",
                name,
                worktree_path.display()
            );
        }

        verbose_cmd("checkout", &[name]);
        self.backend.checkout_branch(name)
    }

    /// If `branch` is checked out in some other worktree, return its path.
    fn get_worktree_path_for_branch(&self, branch: &str) -> Result<Option<PathBuf>> {
        let output = std::process::Command::new("git")
            .args(["worktree", "list", "--porcelain"])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git worktree list")?;

        if !output.status.success() {
            return Ok(None);
        }

        let text = String::from_utf8_lossy(&output.stdout);
        let target = format!("refs/heads/{}", branch);

        let mut current_path: Option<PathBuf> = None;
        for line in text.lines() {
            if let Some(path) = line.strip_prefix("worktree ") {
                current_path = Some(PathBuf::from(path));
            } else if let Some(branch_ref) = line.strip_prefix("branch ") {
                if branch_ref == target {
                    if let Some(path) = &current_path {
                        if path != &self.workdir {
                            return Ok(Some(path.clone()));
                        }
                    }
                }
            }
        }

        Ok(None)
    }

    pub fn list_branches(&self) -> Result<Vec<String>> {
        self.backend.list_branches()
    }

    pub fn delete_branch(&self, name: &str) -> Result<()> {
        verbose_cmd("branch", &["-D", name]);
        self.backend.delete_branch(name)
    }

    pub fn rename_branch(&self, old_name: &str, new_name: &str) -> Result<()> {
        verbose_cmd("branch", &["-m", old_name, new_name]);
        self.backend.rename_branch(old_name, new_name)
    }

    /// Fast-forward merge a branch into the current branch.
    pub fn merge_branch_ff(&self, branch_name: &str) -> Result<()> {
        let current_branch = self.get_current_branch_name()?;
        if !self.backend.is_ancestor(&current_branch, branch_name)? {
            bail!(
                "Cannot fast-forward: branch '{}' has diverged from '{}'",
                current_branch,
                branch_name
            );
        }

        verbose_cmd("merge", &["--ff-only", branch_name]);
        let output = std::process::Command::new("git")
            .args(["merge", "--ff-only", branch_name])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to fast-forward merge '{}'", branch_name))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to fast-forward merge '{}': {}", branch_name, stderr.trim());
        }

        Ok(())
    }

    /// Create a branch at the current HEAD without switching to it.
    pub fn create_branch_at_head(&self, name: &str) -> Result<()> {
        verbose_cmd("branch", &[name]);
        self.backend.create_branch_at(name, "HEAD")
    }

    /// Create a branch at a specific ref (commit or branch) without switching.
    pub fn create_branch_at_ref(&self, name: &str, at_ref: &str) -> Result<()> {
        verbose_cmd("branch", &[name, at_ref]);
        self.backend.create_branch_at(name, at_ref)
    }
}
