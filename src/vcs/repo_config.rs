//! Git config read/write for Vcs, used by hook installation (`core.commentChar`).

use anyhow::{bail, Context, Result};

use super::Vcs;

impl Vcs {
    /// Read a git config value (`git config --get <key>`). Returns `None`
    /// if unset rather than erroring, matching git's own exit code for a
    /// missing key.
    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let output = std::process::Command::new("git")
            .args(["config", "--get", key])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git config")?;

        if !output.status.success() {
            return Ok(None);
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok(if value.is_empty() { None } else { Some(value) })
    }

    /// Set a git config value in the repo's local config (`.git/config`).
    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        let output = std::process::Command::new("git")
            .args(["config", key, value])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git config")?;

        if !output.status.success() {
            bail!("failed to set git config {key}: {}", String::from_utf8_lossy(&output.stderr).trim());
        }
        Ok(())
    }
}
