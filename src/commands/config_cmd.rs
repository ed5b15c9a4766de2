//! Configuration management commands: `config show|get|set|unset`.

use anyhow::Result;
use colored::Colorize;

use crate::config::{BranchConfig, Config, LocalConfig, SyncConfig, UserConfig, VizConfig};

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("invalid boolean value: '{}'. Use true/false, yes/no, 1/0, or on/off", value),
    }
}

pub fn show() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Repository Configuration:".bold());
    println!("  remote: {}", config.remote.cyan());

    println!();
    println!("{}", "Branch Configuration:".bold());
    match &config.branch.username {
        Some(username) => println!("  username: {}", username.cyan()),
        None => println!("  username: {}", "(resolved from git user.name)".dimmed()),
    }

    println!();
    println!("{}", "Sync Configuration:".bold());
    println!("  staleness_threshold_secs: {}", config.sync.staleness_threshold_secs.to_string().cyan());

    println!();
    println!("{}", "Visualization Configuration:".bold());
    println!("  enabled: {}", config.viz.enabled.to_string().cyan());

    println!();
    println!("{}", "Config file locations:".bold());
    for (label, path) in [
        ("repo", Config::repo_config_path()),
        ("user", Config::user_config_path()),
        ("local", Config::local_config_path()),
    ] {
        if let Ok(path) = path {
            let status = if path.exists() { "exists".green() } else { "not found".dimmed() };
            println!("  {label}: {} ({status})", path.display());
        }
    }

    Ok(())
}

pub fn get(key: &str) -> Result<()> {
    let config = Config::load()?;

    match key {
        "repo.remote" => println!("{}", config.remote),
        "branch.username" => match &config.branch.username {
            Some(username) => println!("{username}"),
            None => {}
        },
        "sync.staleness_threshold_secs" => println!("{}", config.sync.staleness_threshold_secs),
        "viz.enabled" => println!("{}", config.viz.enabled),
        _ => bail_unknown_key(key)?,
    }

    Ok(())
}

pub fn set(key: &str, value: &str, local: bool) -> Result<()> {
    if key == "repo.remote" {
        return set_repo_remote(value);
    }

    if local {
        set_local(key, value)
    } else {
        set_user(key, value)
    }
}

fn set_repo_remote(value: &str) -> Result<()> {
    let path = Config::repo_config_path()?;
    let mut config = load_or_default::<crate::config::RepoConfig>(&path);
    config.remote = value.to_string();
    Config::save_repo_config(&config)?;

    println!("Set {} = {} in repo config", "repo.remote".green(), value.cyan());
    println!("  {}", path.display());
    println!();
    println!("{}", "Note: this file should be committed to share with your team.".dimmed());
    Ok(())
}

fn set_user(key: &str, value: &str) -> Result<()> {
    let path = Config::user_config_path()?;
    let mut config = load_or_default::<UserConfig>(&path);
    apply_key(key, value, &mut config.branch, &mut config.sync, &mut config.viz)?;
    Config::save_user_config(&config)?;

    println!("Set {} = {} in user config", key.green(), value.cyan());
    println!("  {}", path.display());
    Ok(())
}

fn set_local(key: &str, value: &str) -> Result<()> {
    let path = Config::local_config_path()?;
    let mut config = load_or_default::<LocalConfig>(&path);
    apply_key(key, value, &mut config.branch, &mut config.sync, &mut config.viz)?;
    Config::save_local_config(&config)?;

    println!("Set {} = {} in local config", key.green(), value.cyan());
    println!("  {}", path.display());
    Ok(())
}

fn apply_key(key: &str, value: &str, branch: &mut BranchConfig, sync: &mut SyncConfig, viz: &mut VizConfig) -> Result<()> {
    match key {
        "branch.username" => branch.username = Some(value.to_string()),
        "sync.staleness_threshold_secs" => {
            sync.staleness_threshold_secs =
                value.parse().map_err(|_| anyhow::anyhow!("invalid value for staleness_threshold_secs: expected a number"))?;
        }
        "viz.enabled" => viz.enabled = parse_bool(value)?,
        _ => bail_unknown_key(key)?,
    }
    Ok(())
}

pub fn unset(key: &str, local: bool) -> Result<()> {
    if local {
        unset_local(key)
    } else {
        unset_user(key)
    }
}

fn unset_user(key: &str) -> Result<()> {
    let path = Config::user_config_path()?;
    if !path.exists() {
        println!("No user config file exists");
        return Ok(());
    }

    let mut config = load_or_default::<UserConfig>(&path);
    reset_key(key, &mut config.branch, &mut config.sync, &mut config.viz)?;
    Config::save_user_config(&config)?;
    println!("Unset {} in user config", key.green());
    Ok(())
}

fn unset_local(key: &str) -> Result<()> {
    let path = Config::local_config_path()?;
    if !path.exists() {
        println!("No local config file exists");
        return Ok(());
    }

    let mut config = load_or_default::<LocalConfig>(&path);
    reset_key(key, &mut config.branch, &mut config.sync, &mut config.viz)?;
    Config::save_local_config(&config)?;
    println!("Unset {} in local config", key.green());
    Ok(())
}

fn reset_key(key: &str, branch: &mut BranchConfig, sync: &mut SyncConfig, viz: &mut VizConfig) -> Result<()> {
    match key {
        "branch.username" => branch.username = BranchConfig::default().username,
        "sync.staleness_threshold_secs" => sync.staleness_threshold_secs = SyncConfig::default().staleness_threshold_secs,
        "viz.enabled" => viz.enabled = VizConfig::default().enabled,
        _ => bail_unknown_key(key)?,
    }
    Ok(())
}

fn load_or_default<T: for<'de> serde::Deserialize<'de> + Default>(path: &std::path::Path) -> T {
    if !path.exists() {
        return T::default();
    }
    std::fs::read_to_string(path).ok().and_then(|content| toml::from_str(&content).ok()).unwrap_or_default()
}

fn bail_unknown_key(key: &str) -> Result<()> {
    anyhow::bail!(
        "unknown config key: {key}\n\navailable keys:\n  repo.remote\n  branch.username\n  sync.staleness_threshold_secs\n  viz.enabled"
    )
}
