//! `status [name] [--table]`: one line per active change.

use anyhow::Result;
use colored::Colorize;

use crate::operation_log::OperationLog;
use crate::stack_context::StackContext;
use crate::stack_viz;
use crate::store;
use crate::vcs::Vcs;

fn resolve_ctx(vcs: &Vcs, name: Option<&str>) -> Result<StackContext> {
    match name {
        Some(name) => StackContext::build_named(vcs, name),
        None => StackContext::build(vcs),
    }
}

pub fn run(name: Option<String>, table: bool) -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = resolve_ctx(&vcs, name.as_deref())?;

    if table {
        println!("{}", stack_viz::render_for(&ctx, ctx.current_uuid.as_ref()));
        return Ok(());
    }

    println!("{} {}", ctx.stack.name.bold(), format!("(base: {})", ctx.stack.base).dimmed());

    if ctx.active_changes.is_empty() {
        println!("  {}", "(no active changes)".dimmed());
        return Ok(());
    }

    for change in ctx.active_changes.iter().rev() {
        let marker = if ctx.current_uuid.as_ref() == Some(&change.uuid) { "▶".green() } else { " ".normal() };
        let position = format!("#{}", change.active_position.unwrap_or(0));
        let pr = match &change.pr {
            Some(pr) => format!("PR #{} ({})", pr.number, pr.state),
            None => "(not pushed)".to_string(),
        };
        println!("  {marker} {} {} — {}", position.dimmed(), change.title, pr.cyan());
    }

    let root = ctx.store_root()?;
    if let Some(last_sync) = store::read_last_sync(&root, &ctx.stack.name)? {
        let age = chrono::Utc::now().signed_duration_since(last_sync);
        println!("  {}", format!("last refreshed {} ago", humanize(age)).dimmed());
    } else {
        println!("  {}", "never refreshed; run `refresh` to check PR state".dimmed());
    }

    let recent = OperationLog::new(&root).read_last_for_stack(&ctx.stack.name, 3)?;
    if !recent.is_empty() {
        println!("  {}", "recent activity:".dimmed());
        for entry in recent.iter().rev() {
            println!("    {}", format!("{} — {}", entry.timestamp.format("%Y-%m-%d %H:%M"), entry.operation.summary()).dimmed());
        }
    }

    Ok(())
}

fn humanize(duration: chrono::Duration) -> String {
    let secs = duration.num_seconds().max(0);
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h", secs / 3600)
    }
}
