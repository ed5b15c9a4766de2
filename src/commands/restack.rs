//! `restack [--fetch] [--onto B] [--recover] [--retry]`: rebase the stack
//! onto its base, with crash recovery.

use anyhow::Result;
use colored::Colorize;

use crate::operation_log::{LogEntry, Operation, OperationLog};
use crate::restack::{self, RecoveryChoice, RecoveryOutcome};
use crate::stack_context::{self, StackContext};
use crate::store;
use crate::ui;
use crate::vcs::Vcs;

pub fn run(fetch: bool, onto: Option<String>, recover: bool, retry: bool) -> Result<()> {
    let vcs = Vcs::new()?;

    if recover || retry {
        let stack_name = stack_context::require_current_stack()?;
        let root = crate::store::store_root()?;

        if retry {
            let ctx = restack::resolve_abort(&vcs, &root, &stack_name, RecoveryChoice::Retry)?;
            report(&ctx);
            return Ok(());
        }

        match restack::recover(&vcs, &root, &stack_name)? {
            RecoveryOutcome::StillInProgress => {
                println!("{}", "rebase still in progress; resolve conflicts and run `restack --retry`".yellow());
            }
            RecoveryOutcome::Recovered(ctx) => report(&ctx),
            RecoveryOutcome::NeedsChoice => {
                let options = ["retry the rebase", "restore the pre-amend state", "keep the current state as-is"];
                let choice = ui::select("the previous restack was aborted; how should we proceed?", &options)?;
                let choice = match choice {
                    0 => RecoveryChoice::Retry,
                    1 => RecoveryChoice::RestorePreAmend,
                    _ => RecoveryChoice::KeepCurrent,
                };
                let ctx = restack::resolve_abort(&vcs, &root, &stack_name, choice)?;
                report(&ctx);
            }
        }
        return Ok(());
    }

    let ctx = StackContext::build(&vcs)?;
    let root = store::store_root()?;
    let target = onto.clone().unwrap_or_else(|| ctx.stack.base.clone());
    OperationLog::new(&root).log(LogEntry::new(Operation::RestackStarted { stack: ctx.stack.name.clone(), onto: target }))?;

    let spinner = crate::ui::spinner(&format!("rebasing onto {}", ctx.stack.base));
    let outcome = match onto {
        Some(onto) => restack::run_onto(&vcs, &ctx, &onto),
        None => restack::run(&vcs, &ctx, fetch),
    };
    match &outcome {
        Ok(_) => crate::ui::spinner_success(spinner, "rebase complete"),
        Err(e) => crate::ui::spinner_error(spinner, &e.to_string()),
    }
    let rebuilt = outcome?;

    OperationLog::new(&root).log(LogEntry::new(Operation::RestackCompleted { stack: rebuilt.stack.name.clone(), success: true }))?;
    report(&rebuilt);
    Ok(())
}

fn report(ctx: &StackContext) {
    ui::success(&format!("restacked '{}' onto {}", ctx.stack.name, ctx.stack.base));
}
