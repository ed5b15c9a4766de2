//! `refresh`: poll PR state and fold merged changes out of the stack.

use anyhow::Result;
use colored::Colorize;

use crate::operation_log::{LogEntry, Operation, OperationLog};
use crate::refresh;
use crate::stack_context::StackContext;
use crate::store;
use crate::vcs::Vcs;

pub async fn run() -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = StackContext::build(&vcs)?;
    let host = super::host()?;

    let spinner = crate::ui::spinner("checking PR status");
    let outcome = refresh::run(&vcs, &ctx, &host).await;
    match &outcome {
        Ok(_) => crate::ui::spinner_success(spinner, "refreshed"),
        Err(e) => crate::ui::spinner_error(spinner, &e.to_string()),
    }
    let (ctx, report) = outcome?;

    if report.merged_uuids.is_empty() {
        println!("{}", "up to date; nothing merged".dimmed());
    } else {
        for uuid in &report.merged_uuids {
            println!("{} {}", "merged".green().bold(), uuid.as_str());
        }
    }

    let root = store::store_root()?;
    let merged = report.merged_uuids.iter().map(|u| u.as_str().to_string()).collect();
    OperationLog::new(&root).log(LogEntry::new(Operation::RefreshCompleted { stack: ctx.stack.name.clone(), merged }))?;

    Ok(())
}
