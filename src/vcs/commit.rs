//! Commit operations for Vcs.

use anyhow::{bail, Context, Result};

use crate::program_name::program_name;

use super::verbose_cmd;
use super::Vcs;

impl Vcs {
    pub fn stage_all(&self) -> Result<()> {
        self.backend.stage_all()
    }

    /// Stage only updates to already-tracked files (`git add -u`).
    pub fn stage_updates(&self) -> Result<()> {
        self.backend.stage_updates()
    }

    pub fn stage_file(&self, path: &str) -> Result<()> {
        self.backend.stage_file(path)
    }

    pub fn commit(&self, message: &str) -> Result<()> {
        self.backend.commit(message)
    }

    pub fn amend_commit(&self, message: Option<&str>) -> Result<()> {
        self.backend.amend_commit(message)
    }

    pub fn commit_with_editor(&self) -> Result<()> {
        let status = std::process::Command::new("git")
            .args(["commit"])
            .current_dir(&self.workdir)
            .status()
            .context("failed to run git commit")?;

        if !status.success() {
            bail!("git commit failed (editor may have been cancelled)");
        }
        Ok(())
    }

    pub fn amend_with_editor(&self) -> Result<()> {
        let status = std::process::Command::new("git")
            .args(["commit", "--amend"])
            .current_dir(&self.workdir)
            .status()
            .context("failed to run git commit --amend")?;

        if !status.success() {
            bail!("git commit --amend failed (editor may have been cancelled)");
        }
        Ok(())
    }

    /// Run interactive rebase from a base commit. Used by `fixup` with
    /// `--autosquash` to fold a `fixup!`-tagged commit into its target.
    pub fn interactive_rebase(&self, base: &str, autosquash: bool) -> Result<()> {
        if !std::io::IsTerminal::is_terminal(&std::io::stdout()) && !autosquash {
            bail!("Interactive rebase requires a terminal. Cannot run in non-interactive mode.");
        }

        let mut args = vec!["rebase", "-i"];
        if autosquash {
            args.push("--autosquash");
        }
        args.push(base);

        let mut command = std::process::Command::new("git");
        command.args(&args).current_dir(&self.workdir);
        if autosquash {
            command.env("GIT_SEQUENCE_EDITOR", "true");
        }

        let status = command.status().context("failed to run git rebase -i")?;

        if !status.success() {
            if self.rebase_in_progress()? {
                bail!(
                    "Rebase paused due to conflicts. Resolve and run '{} restack --continue' or '{} restack --abort'.",
                    program_name(),
                    program_name()
                );
            }
            bail!("git rebase -i failed");
        }
        Ok(())
    }

    pub fn get_commit_count_since(&self, base: &str) -> Result<usize> {
        self.backend.get_commit_count_since(base)
    }

    /// Commit messages between the current branch and a base, newest first.
    pub fn get_commit_messages_since(&self, base: &str) -> Result<Vec<String>> {
        verbose_cmd("log", &["--format=%s", &format!("{}..HEAD", base)]);
        let output = std::process::Command::new("git")
            .args(["log", "--format=%s", &format!("{}..HEAD", base)])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to get commit messages since '{}'", base))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to get commit messages: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect())
    }

    pub fn soft_reset_to(&self, base: &str) -> Result<()> {
        verbose_cmd("reset", &["--soft", base]);
        let output = std::process::Command::new("git")
            .args(["reset", "--soft", base])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to soft reset to '{}'", base))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to soft reset to '{}': {}", base, stderr.trim());
        }

        Ok(())
    }

    pub fn hard_reset_to(&self, commit_ref: &str) -> Result<()> {
        verbose_cmd("reset", &["--hard", commit_ref]);
        let output = std::process::Command::new("git")
            .args(["reset", "--hard", commit_ref])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to hard reset to '{}'", commit_ref))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to hard reset to '{}': {}", commit_ref, stderr.trim());
        }

        Ok(())
    }

    /// List of commits between two refs as (oid, subject), newest first.
    pub fn get_commits_between(&self, from_ref: &str, to_ref: &str) -> Result<Vec<(String, String)>> {
        let output = std::process::Command::new("git")
            .args(["log", "--format=%H %s", &format!("{}..{}", from_ref, to_ref)])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to get commits between '{}' and '{}'", from_ref, to_ref))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to get commits: {}", stderr.trim());
        }

        let commits = String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter_map(|line| {
                let parts: Vec<&str> = line.splitn(2, ' ').collect();
                match parts.len() {
                    2 => Some((parts[0].to_string(), parts[1].to_string())),
                    1 if !parts[0].is_empty() => Some((parts[0].to_string(), String::new())),
                    _ => None,
                }
            })
            .collect();

        Ok(commits)
    }

    /// Commit hashes between two refs, oldest first (`rev-list --reverse`),
    /// used by the stack context builder to walk base..stackBranch in
    /// chronological order.
    pub fn get_commits_oldest_first(&self, from_ref: &str, to_ref: &str) -> Result<Vec<String>> {
        let output = std::process::Command::new("git")
            .args(["rev-list", "--reverse", &format!("{}..{}", from_ref, to_ref)])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to list commits between '{}' and '{}'", from_ref, to_ref))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to list commits: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect())
    }

    pub fn get_changed_files(&self, from_ref: &str, to_ref: &str) -> Result<Vec<String>> {
        let output = std::process::Command::new("git")
            .args(["diff", "--name-only", from_ref, to_ref])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to get changed files between '{}' and '{}'", from_ref, to_ref))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("failed to get changed files: {}", stderr.trim());
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect())
    }

    pub fn get_file_at_ref(&self, git_ref: &str, path: &str) -> Result<Vec<u8>> {
        let spec = format!("{}:{}", git_ref, path);
        let output = std::process::Command::new("git")
            .args(["show", &spec])
            .current_dir(&self.workdir)
            .output()
            .context(format!("failed to get file '{}' at ref '{}'", path, git_ref))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("file '{}' not found at ref '{}': {}", path, git_ref, stderr.trim());
        }

        Ok(output.stdout)
    }
}
