//! `show [name]`: detailed per-change view of a stack.

use anyhow::Result;
use colored::Colorize;

use crate::stack_context::StackContext;
use crate::vcs::Vcs;

pub fn run(name: Option<String>) -> Result<()> {
    let vcs = Vcs::new()?;
    let ctx = match &name {
        Some(name) => StackContext::build_named(&vcs, name)?,
        None => StackContext::build(&vcs)?,
    };

    println!("{} {}", "Stack".bold(), ctx.stack.name.bold());
    println!("{}  {}", "Base".bold(), ctx.stack.base);
    println!("{} {}", "Branch".bold(), ctx.stack.stack_branch);

    if ctx.active_changes.is_empty() {
        println!();
        println!("{}", "(no active changes)".dimmed());
        return Ok(());
    }

    for change in ctx.active_changes.iter().rev() {
        println!();
        let current = ctx.current_uuid.as_ref() == Some(&change.uuid);
        let header = format!("#{} {}", change.active_position.unwrap_or(0), change.title);
        if current {
            println!("{} {}", header.bold().green(), "(current)".dimmed());
        } else {
            println!("{}", header.bold());
        }
        println!("  {} {}", "uuid".dimmed(), change.uuid.as_str());
        println!("  {} {}", "commit".dimmed(), &change.commit_hash[..change.commit_hash.len().min(10)]);
        println!("  {} {}", "base".dimmed(), change.desired_base);

        if !change.description.is_empty() {
            for line in change.description.lines() {
                println!("  {line}");
            }
        }

        match &change.pr {
            Some(pr) => {
                println!("  {} #{} {} — {}", "PR".dimmed(), pr.number, pr.state, pr.url.cyan());
                if pr.remote_draft {
                    println!("  {}", "(draft)".yellow());
                }
            }
            None => {
                let label = if change.local_draft { "(local draft, not pushed)" } else { "(not pushed)" };
                println!("  {}", label.dimmed());
            }
        }
    }

    Ok(())
}
