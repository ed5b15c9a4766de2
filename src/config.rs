//! Configuration system for the stack engine.
//!
//! Supports layered configuration from multiple sources (highest priority first):
//! 1. Local override: `.git/stack/config.toml` (per-repo, per-user)
//! 2. User global: `~/.config/stack/config.toml` (personal defaults)
//! 3. Repo shared: `.stack/config.toml` (committed, team-wide)
//!
//! Configuration uses TOML format for readability.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::vcs::find_git_root;

fn default_remote() -> String {
    "origin".to_string()
}

fn default_true() -> bool {
    true
}

fn default_staleness_secs() -> u64 {
    60
}

/// Branch naming configuration for UUID tracking branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchConfig {
    /// Username component used when formatting
    /// `<username>/stack-<name>/<suffix>` branch names. Defaults to the
    /// local git user, resolved lazily if unset.
    #[serde(default)]
    pub username: Option<String>,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self { username: None }
    }
}

/// Sync/refresh behavior configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// How old (seconds) `last_sync` may be before `push`/`restack` warn
    /// that the local view of host state may be stale. Default: 60.
    #[serde(default = "default_staleness_secs")]
    pub staleness_threshold_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            staleness_threshold_secs: default_staleness_secs(),
        }
    }
}

/// PR description visualization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizConfig {
    /// Whether `push` maintains the stack-visualization comment block in
    /// each PR's description. Default: true.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Repository-level configuration (stored in .stack/config.toml, committed)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// Git remote name to use for push/pull operations (default: "origin")
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            remote: default_remote(),
        }
    }
}

/// User-level configuration (stored in ~/.config/stack/)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub branch: BranchConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub viz: VizConfig,
}

/// Local override configuration (stored in .git/stack/)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LocalConfig {
    #[serde(default)]
    pub branch: BranchConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub viz: VizConfig,
}

/// Merged configuration from all layers
#[derive(Debug, Clone)]
pub struct Config {
    pub branch: BranchConfig,
    /// Git remote name (from repo config)
    pub remote: String,
    pub sync: SyncConfig,
    pub viz: VizConfig,
}

impl Config {
    /// Load configuration from all layers, merging with priority:
    /// local > user > repo > defaults
    pub fn load() -> Result<Self> {
        let repo_config = Self::load_repo_config();
        let user_config = Self::load_user_config();
        let local_config = Self::load_local_config();

        let branch = Self::merge_branch_config(&user_config.branch, &local_config.as_ref().map(|c| &c.branch));
        let sync = Self::merge_sync_config(&user_config.sync, &local_config.as_ref().map(|c| &c.sync));
        let viz = Self::merge_viz_config(&user_config.viz, &local_config.as_ref().map(|c| &c.viz));

        // Remote comes from repo config (committed, shared)
        let remote = repo_config.remote;

        Ok(Config {
            branch,
            remote,
            sync,
            viz,
        })
    }

    /// Load repo config from .stack/config.toml (committed, shared)
    fn load_repo_config() -> RepoConfig {
        let path = match Self::repo_config_path() {
            Ok(p) => p,
            Err(_) => return RepoConfig::default(),
        };

        Self::load_toml_file(&path).unwrap_or_default()
    }

    /// Load user config from ~/.config/stack/config.toml
    fn load_user_config() -> UserConfig {
        let path = match Self::user_config_path() {
            Ok(p) => p,
            Err(_) => return UserConfig::default(),
        };

        Self::load_toml_file(&path).unwrap_or_default()
    }

    /// Load local config from .git/stack/config.toml
    fn load_local_config() -> Option<LocalConfig> {
        let path = match Self::local_config_path() {
            Ok(p) => p,
            Err(_) => return None,
        };

        Self::load_toml_file(&path).ok()
    }

    /// Load and parse a TOML config file
    fn load_toml_file<T: for<'de> Deserialize<'de> + Default>(path: &PathBuf) -> Result<T> {
        if !path.exists() {
            return Ok(T::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                eprintln!("Warning: Config file {:?} is invalid ({}), using defaults", path, e);
                Ok(T::default())
            }
        }
    }

    fn merge_branch_config(user: &BranchConfig, local: &Option<&BranchConfig>) -> BranchConfig {
        let mut result = BranchConfig::default();
        if user.username.is_some() {
            result.username = user.username.clone();
        }
        if let Some(local) = local {
            if local.username.is_some() {
                result.username = local.username.clone();
            }
        }
        result
    }

    fn merge_sync_config(user: &SyncConfig, local: &Option<&SyncConfig>) -> SyncConfig {
        let mut result = SyncConfig::default();
        if user.staleness_threshold_secs != default_staleness_secs() {
            result.staleness_threshold_secs = user.staleness_threshold_secs;
        }
        if let Some(local) = local {
            if local.staleness_threshold_secs != default_staleness_secs() {
                result.staleness_threshold_secs = local.staleness_threshold_secs;
            }
        }
        result
    }

    fn merge_viz_config(user: &VizConfig, local: &Option<&VizConfig>) -> VizConfig {
        let mut result = VizConfig::default();
        if !user.enabled {
            result.enabled = false;
        }
        if let Some(local) = local {
            if !local.enabled {
                result.enabled = false;
            }
        }
        result
    }

    /// Get path to user config: ~/.config/stack/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine user config directory")?;
        Ok(config_dir.join("stack").join("config.toml"))
    }

    /// Get path to local config: .git/stack/config.toml
    pub fn local_config_path() -> Result<PathBuf> {
        let git_root = find_git_root()?;
        Ok(git_root.join(".git").join("stack").join("config.toml"))
    }

    /// Get path to repo config: .stack/config.toml (committed)
    pub fn repo_config_path() -> Result<PathBuf> {
        let git_root = find_git_root()?;
        Ok(git_root.join(".stack").join("config.toml"))
    }

    /// Save user config to ~/.config/stack/config.toml
    pub fn save_user_config(config: &UserConfig) -> Result<()> {
        Self::save_toml_file(&Self::user_config_path()?, config)
    }

    /// Save local config to .git/stack/config.toml
    pub fn save_local_config(config: &LocalConfig) -> Result<()> {
        Self::save_toml_file(&Self::local_config_path()?, config)
    }

    /// Save repo config to .stack/config.toml (committed, shared)
    pub fn save_repo_config(config: &RepoConfig) -> Result<()> {
        Self::save_toml_file(&Self::repo_config_path()?, config)
    }

    fn save_toml_file<T: Serialize>(path: &PathBuf, config: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(config).context("Failed to serialize config")?;

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content).context("Failed to write config file")?;
        fs::rename(&temp_path, path).context("Failed to finalize config file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.staleness_threshold_secs, 60);
    }

    #[test]
    fn viz_config_default_enabled() {
        assert!(VizConfig::default().enabled);
    }

    #[test]
    fn parse_empty_toml_gives_defaults() {
        let config: UserConfig = toml::from_str("").unwrap();
        assert_eq!(config.sync.staleness_threshold_secs, 60);
        assert!(config.viz.enabled);
        assert_eq!(config.branch.username, None);
    }

    #[test]
    fn parse_partial_toml() {
        let toml_content = r#"
[sync]
staleness_threshold_secs = 120
"#;
        let config: UserConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.sync.staleness_threshold_secs, 120);
        assert!(config.viz.enabled); // default
    }

    #[test]
    fn merge_sync_config_priority() {
        let user = SyncConfig {
            staleness_threshold_secs: 120,
        };
        let local = SyncConfig {
            staleness_threshold_secs: 60, // same as default, shouldn't override
        };
        let result = Config::merge_sync_config(&user, &Some(&local));
        assert_eq!(result.staleness_threshold_secs, 120);
    }

    #[test]
    fn merge_viz_config_local_disables() {
        let user = VizConfig { enabled: true };
        let local = VizConfig { enabled: false };
        let result = Config::merge_viz_config(&user, &Some(&local));
        assert!(!result.enabled);
    }

    #[test]
    fn merge_branch_config_local_overrides_user() {
        let user = BranchConfig {
            username: Some("alice".to_string()),
        };
        let local = BranchConfig {
            username: Some("bob".to_string()),
        };
        let result = Config::merge_branch_config(&user, &Some(&local));
        assert_eq!(result.username, Some("bob".to_string()));
    }

    #[test]
    fn corrupt_toml_is_rejected_by_parser() {
        let result: Result<UserConfig, _> = toml::from_str("{ this is not valid toml");
        assert!(result.is_err());
    }

    #[test]
    fn repo_config_default_remote() {
        assert_eq!(RepoConfig::default().remote, "origin");
    }
}
