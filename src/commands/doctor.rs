//! `doctor [--fix]`: validate stack metadata against the repository.

use anyhow::Result;
use colored::Colorize;

use crate::stack_context::StackContext;
use crate::store;
use crate::vcs::Vcs;

#[derive(Debug, Clone)]
enum DiagnosticError {
    HooksNotInstalled,
    MissingBaseBranch { stack: String, base: String },
    MissingStackBranch { stack: String, branch: String },
    MissingUuidBranch { stack: String, uuid: String, branch: String },
    BrokenIdentity { stack: String, error: String },
}

pub fn run(fix: bool) -> Result<()> {
    println!("{} running diagnostics...\n", "🔍".blue());

    let vcs = Vcs::new()?;
    let root = store::store_root()?;
    let errors = validate(&vcs, &root)?;

    if errors.is_empty() {
        println!("{} all checks passed!", "✓".green().bold());
        return Ok(());
    }

    println!("{} found {} issue(s):\n", "✗".red().bold(), errors.len());

    for (i, error) in errors.iter().enumerate() {
        match error {
            DiagnosticError::HooksNotInstalled => {
                println!("{}. {} hooks are not installed", i + 1, "⚠".yellow());
            }
            DiagnosticError::MissingBaseBranch { stack, base } => {
                println!("{}. {} stack '{}' base branch '{}' does not exist", i + 1, "⚠".yellow(), stack.cyan(), base.cyan());
            }
            DiagnosticError::MissingStackBranch { stack, branch } => {
                println!("{}. {} stack '{}' branch '{}' does not exist", i + 1, "⚠".yellow(), stack.cyan(), branch.cyan());
            }
            DiagnosticError::MissingUuidBranch { stack, uuid, branch } => {
                println!(
                    "{}. {} stack '{}' change '{}' is missing its tracking branch '{}'",
                    i + 1,
                    "⚠".yellow(),
                    stack.cyan(),
                    uuid,
                    branch.cyan()
                );
            }
            DiagnosticError::BrokenIdentity { stack, error } => {
                println!("{}. {} stack '{}' has a commit with broken identity metadata", i + 1, "⚠".yellow(), stack.cyan());
                println!("   {}", error.dimmed());
            }
        }
    }

    if !fix {
        println!("\nrun with {} to attempt automatic repair", "--fix".bold());
        return Ok(());
    }

    let unfixed = attempt_fix(&vcs, &root, &errors)?;
    if unfixed > 0 {
        anyhow::bail!("{unfixed} issue(s) could not be fixed automatically");
    }
    println!("\n{} repaired all fixable issues", "✓".green().bold());
    Ok(())
}

fn validate(vcs: &Vcs, root: &std::path::Path) -> Result<Vec<DiagnosticError>> {
    let mut errors = Vec::new();

    if !store::is_installed(root) {
        errors.push(DiagnosticError::HooksNotInstalled);
    }

    for name in store::list_stack_names(root)? {
        let descriptor = match store::stack::StackDescriptor::load(root, &name)? {
            Some(d) => d,
            None => continue,
        };

        if !vcs.branch_exists(&descriptor.base)? {
            errors.push(DiagnosticError::MissingBaseBranch { stack: name.clone(), base: descriptor.base.clone() });
            continue;
        }
        if !vcs.branch_exists(&descriptor.stack_branch)? {
            errors.push(DiagnosticError::MissingStackBranch { stack: name.clone(), branch: descriptor.stack_branch.clone() });
            continue;
        }

        let ctx = match StackContext::build_named(vcs, &name) {
            Ok(ctx) => ctx,
            Err(e) => {
                errors.push(DiagnosticError::BrokenIdentity { stack: name.clone(), error: e.to_string() });
                continue;
            }
        };

        for change in &ctx.active_changes {
            let branch = ctx.uuid_branch_name(&change.uuid);
            if !vcs.branch_exists(&branch)? {
                errors.push(DiagnosticError::MissingUuidBranch { stack: name.clone(), uuid: change.uuid.as_str().to_string(), branch });
            }
        }
    }

    Ok(errors)
}

fn attempt_fix(vcs: &Vcs, root: &std::path::Path, errors: &[DiagnosticError]) -> Result<usize> {
    let mut unfixed = 0;

    for error in errors {
        match error {
            DiagnosticError::HooksNotInstalled => {
                crate::hooks::install(vcs, vcs.git_dir())?;
                store::mark_installed(root)?;
            }
            DiagnosticError::MissingUuidBranch { stack, uuid, branch } => {
                let ctx = StackContext::build_named(vcs, stack)?;
                let uuid = crate::identity::Uuid16::parse(uuid);
                match uuid.and_then(|u| ctx.find(&u).cloned()) {
                    Some(change) => vcs.create_branch_at_ref(branch, &change.commit_hash)?,
                    None => unfixed += 1,
                }
            }
            DiagnosticError::MissingBaseBranch { .. }
            | DiagnosticError::MissingStackBranch { .. }
            | DiagnosticError::BrokenIdentity { .. } => {
                unfixed += 1;
            }
        }
    }

    Ok(unfixed)
}
