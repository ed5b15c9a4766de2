//! `new <name> [--base B]`: create a stack rooted at HEAD.

use anyhow::{Context, Result};

use crate::branch_name;
use crate::config::Config;
use crate::navigation;
use crate::operation_log::{LogEntry, Operation, OperationLog};
use crate::store;
use crate::ui;
use crate::vcs::Vcs;

fn resolve_username(vcs: &Vcs, config: &Config) -> Result<String> {
    if let Some(username) = &config.branch.username {
        return Ok(branch_name::slugify(username));
    }

    let name = vcs
        .get_config("user.name")?
        .context("no git user.name configured; set one with `git config user.name <name>` or `config set branch.username <name>`")?;

    let slug = branch_name::slugify(&name);
    if slug.is_empty() {
        anyhow::bail!("git user.name '{name}' has no usable ref-safe characters; set `config set branch.username <name>`");
    }
    Ok(slug)
}

pub fn run(name: &str, base: Option<String>) -> Result<()> {
    let vcs = Vcs::new()?;
    let config = Config::load()?;
    let username = resolve_username(&vcs, &config)?;

    let base = match base {
        Some(b) => b,
        None => vcs.get_current_branch_name()?,
    };

    let repo_info = super::host().ok().and_then(|h| h.get_repo_info().ok());
    let (owner, repo) = repo_info.map(|r| (r.owner, r.name)).unwrap_or_default();

    let root = store::store_root()?;
    navigation::create_stack(&vcs, &root, name, &username, &base, &owner, &repo)?;

    OperationLog::new(&root).log(LogEntry::new(Operation::StackCreated { name: name.to_string(), base: base.clone() }))?;

    ui::success(&format!("created stack '{name}' on {}", branch_name::format_stack_branch(&username, name)));
    Ok(())
}
