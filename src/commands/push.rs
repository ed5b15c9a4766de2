//! `push [--dry-run] [--force]`: create/update PRs for every active change.

use anyhow::Result;
use colored::Colorize;

use crate::operation_log::{LogEntry, Operation, OperationLog};
use crate::push::{self, Action, PushOptions};
use crate::stack_context::StackContext;
use crate::store;
use crate::vcs::Vcs;

pub fn run(dry_run: bool, force: bool) -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;
    let host = super::host()?;

    push::preflight(&vcs, &ctx)?;

    let options = PushOptions { dry_run, force };
    let spinner = crate::ui::spinner(&format!("syncing {} change(s)", ctx.active_changes.len()));
    let decisions = push::run(&vcs, &ctx, &host, options);
    match &decisions {
        Ok(_) => crate::ui::spinner_success(spinner, "sync complete"),
        Err(e) => crate::ui::spinner_error(spinner, &e.to_string()),
    }
    let decisions = decisions?;

    for decision in &decisions {
        let change = ctx.find(&decision.uuid);
        let title = change.map(|c| c.title.as_str()).unwrap_or("?");
        match &decision.action {
            Action::Create => println!("{} {title}", "create".green().bold()),
            Action::Update { reasons } => {
                println!("{} {title}", "update".yellow().bold());
                for reason in reasons {
                    println!("  {}", reason.dimmed());
                }
            }
            Action::Skip { reason } => println!("{} {title} {}", "skip".dimmed(), format!("({reason})").dimmed()),
        }
    }

    if dry_run {
        println!("{}", "dry run; no changes pushed".dimmed());
    } else {
        let created = decisions.iter().filter(|d| matches!(d.action, Action::Create)).count();
        let updated = decisions.iter().filter(|d| matches!(d.action, Action::Update { .. })).count();
        let skipped = decisions.iter().filter(|d| matches!(d.action, Action::Skip { .. })).count();
        let root = store::store_root()?;
        OperationLog::new(&root).log(LogEntry::new(Operation::PushCompleted { stack: ctx.stack.name.clone(), created, updated, skipped }))?;
    }

    Ok(())
}
