//! Command handlers, one module per CLI subcommand.
//!
//! Each module exposes a `run` function taking already-parsed arguments;
//! `main.rs` owns argument parsing and dispatch.

pub mod completion;
pub mod config_cmd;
pub mod doctor;
pub mod down;
pub mod draft;
pub mod fixup;
pub mod install;
pub mod list;
pub mod new;
pub mod push;
pub mod ready;
pub mod refresh;
pub mod restack;
pub mod show;
pub mod status;
pub mod switch;
pub mod top;
pub mod uninstall;
pub mod up;

use anyhow::Result;

use crate::host::{GitHubHost, Host, PrState};
use crate::identity::Uuid16;
use crate::navigation::Position;
use crate::stack_context::StackContext;
use crate::store::{self, pr_data::PrData};
use crate::ui;

/// Build the host adapter and verify it's usable before returning it.
fn host() -> Result<GitHubHost> {
    let host = GitHubHost::new(None);
    host.check_auth()?;
    Ok(host)
}

/// Shared implementation of `ready`/`draft`: flip the local-draft flag for
/// one change (or every active change with `--all`), and push the state to
/// the host immediately for any change that already has a PR.
fn mark_draft_state(ctx: &StackContext, all: bool, draft: bool) -> Result<()> {
    let targets: Vec<Uuid16> = if all {
        ctx.active_changes.iter().filter(|c| !c.is_merged()).map(|c| c.uuid.clone()).collect()
    } else {
        match ctx.position() {
            Position::EditingChange(uuid) => vec![uuid],
            Position::OnTop => match ctx.current_uuid.clone() {
                Some(uuid) => vec![uuid],
                None => anyhow::bail!("no single current change; use --all or check out a change with `down`/`up`"),
            },
            Position::OffStack => anyhow::bail!("not on a stack"),
        }
    };

    if targets.is_empty() {
        anyhow::bail!("no active changes to update");
    }

    let root = store::store_root()?;
    let host = host().ok();

    for uuid in &targets {
        store::local_draft::set(&root, &ctx.stack.name, uuid, draft)?;

        let Some(change) = ctx.find(uuid) else { continue };
        let Some(pr) = &change.pr else { continue };

        if let Some(host) = &host {
            let result = if draft { host.mark_draft(pr.number) } else { host.mark_ready(pr.number) };
            result?;

            let mut pr_data = PrData::load(&root, &ctx.stack.name)?;
            if let Some(mut record) = pr_data.get(uuid).cloned() {
                record.remote_draft = draft;
                record.state = match (draft, record.state) {
                    (true, PrState::Open) => PrState::Draft,
                    (false, PrState::Draft) => PrState::Open,
                    (_, state) => state,
                };
                pr_data.set(uuid.clone(), record);
                pr_data.save(&root, &ctx.stack.name)?;
            }
        }
    }

    let verb = if draft { "marked draft" } else { "marked ready" };
    ui::success(&format!("{verb}: {} change(s)", targets.len()));
    Ok(())
}
