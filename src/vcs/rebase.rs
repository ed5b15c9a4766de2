//! Rebase operations for Vcs.
//!
//! git2 has no direct rebase support, so these shell out to the `git` CLI
//! regardless of which `GitBackend` is active.

use anyhow::{bail, Context, Result};
use colored::Colorize;

use crate::program_name::program_name;

use super::verbose_cmd;
use super::Vcs;

/// Outcome of a rebase operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebaseOutcome {
    Success,
    /// Paused due to conflicts requiring user resolution.
    Conflicts,
}

impl RebaseOutcome {
    pub fn has_conflicts(&self) -> bool {
        matches!(self, RebaseOutcome::Conflicts)
    }
}

impl Vcs {
    /// Rebase a branch onto a new base.
    pub fn rebase_onto(&self, branch: &str, onto: &str) -> Result<RebaseOutcome> {
        if self.has_staged_or_modified_changes()? {
            bail!(
                "Cannot rebase - you have uncommitted changes.\n\
                Commit or stash your changes first:\n\
                • git add -A && git commit -m \"WIP\"\n\
                • git stash"
            );
        }

        self.checkout_branch_worktree_safe(branch)?;

        verbose_cmd("rebase", &[onto]);
        let output = std::process::Command::new("git")
            .args(["rebase", onto])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rebase")?;

        if output.status.success() {
            return Ok(RebaseOutcome::Success);
        }

        if self.rebase_in_progress()? {
            return Ok(RebaseOutcome::Conflicts);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git rebase failed: {}", stderr.trim());
    }

    /// Rebase a branch onto its parent using `--fork-point`, which uses the
    /// reflog to find the correct base even if the parent has been amended.
    pub fn rebase_fork_point(&self, branch: &str, onto: &str) -> Result<RebaseOutcome> {
        self.checkout_branch(branch)?;

        verbose_cmd("rebase", &["--fork-point", onto]);
        let output = std::process::Command::new("git")
            .args(["rebase", "--fork-point", onto])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rebase --fork-point")?;

        if output.status.success() {
            return Ok(RebaseOutcome::Success);
        }

        if self.rebase_in_progress()? {
            return Ok(RebaseOutcome::Conflicts);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("fatal:") {
            eprintln!(
                "{} fork-point detection failed for '{}' (no reflog?), using standard rebase",
                "⚠".yellow(),
                branch
            );
            eprintln!("  This may include extra commits. If you see unexpected conflicts,");
            eprintln!(
                "  run '{} abort' and manually rebase with the correct base.",
                program_name()
            );
            return self.rebase_onto(branch, onto);
        }

        bail!("git rebase --fork-point failed: {}", stderr.trim());
    }

    /// Rebase a branch onto `new_base`, replaying only the commits not
    /// already reachable from `old_base`.
    pub fn rebase_onto_from(&self, branch: &str, new_base: &str, old_base: &str) -> Result<RebaseOutcome> {
        self.checkout_branch_worktree_safe(branch)?;

        verbose_cmd("rebase", &["--onto", new_base, old_base]);
        let output = std::process::Command::new("git")
            .args(["rebase", "--onto", new_base, old_base])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rebase --onto")?;

        if output.status.success() {
            return Ok(RebaseOutcome::Success);
        }

        if self.rebase_in_progress()? {
            return Ok(RebaseOutcome::Conflicts);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git rebase --onto failed: {}", stderr.trim());
    }

    /// Rebase the range `(old_base, original_tip]` onto `new_base`, checking
    /// out `original_tip` detached first (the explicit 3-argument form of
    /// `rebase --onto`). Leaves HEAD detached at the new tip on success; the
    /// caller is responsible for moving the owning branch ref there, since
    /// at call time that ref may already point somewhere else (an amend
    /// hard-resets the stack branch to the synthesized commit before this
    /// runs, so `original_tip`'s descendants are otherwise unreachable from
    /// any branch).
    pub fn rebase_onto_range(&self, new_base: &str, old_base: &str, original_tip: &str) -> Result<RebaseOutcome> {
        let output = std::process::Command::new("git")
            .args(["checkout", "--detach", original_tip])
            .current_dir(&self.workdir)
            .output()
            .context("failed to detach HEAD for rebase --onto")?;
        if !output.status.success() {
            bail!("failed to check out '{}' detached: {}", original_tip, String::from_utf8_lossy(&output.stderr).trim());
        }

        verbose_cmd("rebase", &["--onto", new_base, old_base]);
        let output = std::process::Command::new("git")
            .args(["rebase", "--onto", new_base, old_base])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rebase --onto")?;

        if output.status.success() {
            return Ok(RebaseOutcome::Success);
        }

        if self.rebase_in_progress()? {
            return Ok(RebaseOutcome::Conflicts);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git rebase --onto failed: {}", stderr.trim());
    }

    pub fn rebase_abort(&self) -> Result<()> {
        let status = std::process::Command::new("git")
            .args(["rebase", "--abort"])
            .current_dir(&self.workdir)
            .status()
            .context("failed to run git rebase --abort")?;

        if !status.success() {
            bail!("git rebase --abort failed");
        }
        Ok(())
    }

    pub fn rebase_continue(&self) -> Result<RebaseOutcome> {
        use std::process::Stdio;

        let output = std::process::Command::new("git")
            .args(["rebase", "--continue"])
            .env("GIT_EDITOR", "true")
            .stdin(Stdio::null())
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rebase --continue")?;

        if output.status.success() {
            Ok(RebaseOutcome::Success)
        } else {
            Ok(RebaseOutcome::Conflicts)
        }
    }

    pub fn rebase_in_progress(&self) -> Result<bool> {
        let rebase_merge = self.git_dir.join("rebase-merge");
        let rebase_apply = self.git_dir.join("rebase-apply");
        Ok(rebase_merge.exists() || rebase_apply.exists())
    }

    /// True if `base` is an ancestor of `branch`, i.e. `branch` is already
    /// rebased onto `base`. Used by crash recovery to skip completed steps.
    pub fn is_branch_based_on(&self, branch: &str, base: &str) -> Result<bool> {
        self.backend.is_ancestor(base, branch)
    }
}
