//! Remote operations for Vcs.

use anyhow::{bail, Context, Result};

use super::verbose_cmd;
use super::Vcs;

/// Sync state between a local branch and its remote tracking branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSyncState {
    InSync,
    /// Local has commits not yet pushed to remote.
    Ahead(usize),
    /// Remote has commits not yet pulled to local.
    Behind(usize),
    /// Both sides have diverged from their common ancestor.
    Diverged { local_ahead: usize, remote_ahead: usize },
    /// No remote tracking branch exists.
    NoRemote,
}

/// Result of syncing a branch from remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncBranchResult {
    Updated(usize),
    AlreadySynced,
    LocalAhead(usize),
    /// Was diverged, force-reset to remote.
    ForceSynced,
    Diverged { local_ahead: usize, remote_ahead: usize },
    NoRemote,
}

impl Vcs {
    /// Fetch from remote via the `git` CLI for reliable credential handling.
    pub fn fetch_remote(&self, remote: &str) -> Result<()> {
        verbose_cmd("fetch", &[remote]);

        if !self.has_remote(remote)? {
            bail!(
                "No remote '{}' configured. Add one with: git remote add {} <url>",
                remote,
                remote
            );
        }

        let output = std::process::Command::new("git")
            .args(["fetch", remote])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git fetch")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "Authentication failed. Check:\n\
                • SSH keys are set up and added to agent (ssh-add -l)\n\
                • Remote URL is correct (git remote -v)\n\
                \nGit error: {}",
                stderr.trim()
            );
        }

        Ok(())
    }

    pub fn fetch_origin(&self) -> Result<()> {
        self.fetch_remote(&self.remote)
    }

    /// Push a branch to its remote, using `--force-with-lease` to avoid
    /// clobbering commits a coworker may have pushed since the last fetch.
    pub fn push_branch(&self, branch: &str, force_with_lease: bool) -> Result<()> {
        let mut args = vec!["push"];
        if force_with_lease {
            args.push("--force-with-lease");
        }
        args.push(&self.remote);
        let refspec = format!("{branch}:{branch}");
        args.push(&refspec);

        verbose_cmd("push", &args[1..]);
        let output = std::process::Command::new("git")
            .args(&args)
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git push")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to push '{}': {}", branch, stderr.trim());
        }

        Ok(())
    }

    pub fn fast_forward_branch(&self, branch: &str) -> Result<()> {
        self.checkout_branch(branch)?;

        let upstream_name = format!("{}/{}", self.remote, branch);
        verbose_cmd("merge", &["--ff-only", &upstream_name]);

        let output = std::process::Command::new("git")
            .args(["merge", "--ff-only", &upstream_name])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git merge --ff-only")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to fast-forward branch: {}", stderr.trim());
        }

        Ok(())
    }

    pub fn get_remote_url(&self, remote_name: &str) -> Result<String> {
        let output = std::process::Command::new("git")
            .args(["remote", "get-url", remote_name])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git remote get-url")?;

        if !output.status.success() {
            bail!("no '{}' remote configured", remote_name);
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Compare a local branch against its remote tracking branch.
    pub fn check_remote_sync_with_remote(&self, branch: &str, remote: &str) -> Result<BranchSyncState> {
        let remote_branch = format!("{}/{}", remote, branch);

        let check = std::process::Command::new("git")
            .args(["show-ref", "--verify", "--quiet", &format!("refs/remotes/{}", remote_branch)])
            .current_dir(&self.workdir)
            .status()
            .context("failed to run git show-ref")?;

        if !check.success() {
            return Ok(BranchSyncState::NoRemote);
        }

        let output = std::process::Command::new("git")
            .args(["rev-list", "--left-right", "--count", &format!("{}...{}", branch, remote_branch)])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rev-list")?;

        if !output.status.success() {
            return Ok(BranchSyncState::Diverged {
                local_ahead: 1,
                remote_ahead: 1,
            });
        }

        let counts = String::from_utf8_lossy(&output.stdout);
        let parts: Vec<&str> = counts.split_whitespace().collect();
        if parts.len() != 2 {
            return Ok(BranchSyncState::InSync);
        }

        let local_ahead: usize = parts[0].parse().unwrap_or(0);
        let remote_ahead: usize = parts[1].parse().unwrap_or(0);

        match (local_ahead, remote_ahead) {
            (0, 0) => Ok(BranchSyncState::InSync),
            (n, 0) => Ok(BranchSyncState::Ahead(n)),
            (0, n) => Ok(BranchSyncState::Behind(n)),
            (l, r) => Ok(BranchSyncState::Diverged {
                local_ahead: l,
                remote_ahead: r,
            }),
        }
    }

    pub fn check_remote_sync(&self, branch: &str) -> Result<BranchSyncState> {
        self.check_remote_sync_with_remote(branch, &self.remote)
    }

    /// Sync a local branch from its remote tracking branch: fast-forward
    /// when behind, force-reset when diverged and `force` is set.
    pub fn sync_branch_from_remote_with_name(&self, branch: &str, remote: &str, force: bool) -> Result<SyncBranchResult> {
        let sync_state = self.check_remote_sync_with_remote(branch, remote)?;

        match sync_state {
            BranchSyncState::NoRemote => Ok(SyncBranchResult::NoRemote),
            BranchSyncState::InSync => Ok(SyncBranchResult::AlreadySynced),
            BranchSyncState::Ahead(n) => Ok(SyncBranchResult::LocalAhead(n)),
            BranchSyncState::Behind(n) => {
                self.fast_forward_to_remote_with_name(branch, remote)?;
                Ok(SyncBranchResult::Updated(n))
            }
            BranchSyncState::Diverged { local_ahead, remote_ahead } => {
                if force {
                    self.fast_forward_to_remote_with_name(branch, remote)?;
                    Ok(SyncBranchResult::ForceSynced)
                } else {
                    Ok(SyncBranchResult::Diverged { local_ahead, remote_ahead })
                }
            }
        }
    }

    pub fn sync_branch_from_remote(&self, branch: &str, force: bool) -> Result<SyncBranchResult> {
        self.sync_branch_from_remote_with_name(branch, &self.remote, force)
    }

    fn fast_forward_to_remote_with_name(&self, branch: &str, remote: &str) -> Result<()> {
        let remote_branch = format!("{}/{}", remote, branch);
        let local_ref = format!("refs/heads/{}", branch);
        let remote_ref = format!("refs/remotes/{}", remote_branch);

        let output = std::process::Command::new("git")
            .args(["rev-parse", &remote_ref])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git rev-parse")?;

        if !output.status.success() {
            bail!("no remote tracking branch for '{}'", branch);
        }

        let remote_sha = String::from_utf8_lossy(&output.stdout).trim().to_string();

        let output = std::process::Command::new("git")
            .args(["update-ref", &local_ref, &remote_sha])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git update-ref")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to fast-forward branch: {}", stderr.trim());
        }

        Ok(())
    }

    /// Returns true if changes were stashed, false if nothing to stash.
    pub fn stash_push(&self, message: &str) -> Result<bool> {
        if !self.has_uncommitted_changes()? {
            return Ok(false);
        }

        verbose_cmd("stash", &["push", "--include-untracked", "-m", message]);

        let output = std::process::Command::new("git")
            .args(["stash", "push", "--include-untracked", "-m", message])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git stash push")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to stash changes: {}", stderr.trim());
        }

        Ok(true)
    }

    pub fn stash_pop(&self) -> Result<()> {
        verbose_cmd("stash", &["pop"]);

        let output = std::process::Command::new("git")
            .args(["stash", "pop"])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git stash pop")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to pop stash: {}", stderr.trim());
        }

        Ok(())
    }

    pub fn delete_remote_branch_with_name(&self, branch: &str, remote: &str) -> Result<()> {
        verbose_cmd("push", &[remote, "--delete", branch]);

        let output = std::process::Command::new("git")
            .args(["push", remote, "--delete", branch])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git push --delete")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to delete remote branch: {}", stderr.trim());
        }

        Ok(())
    }

    pub fn delete_remote_branch(&self, branch: &str) -> Result<()> {
        self.delete_remote_branch_with_name(branch, &self.remote)
    }
}
