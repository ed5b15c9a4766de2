//! Rebase the entire stack atop the latest base (or
//! an alternate base), with crash recovery.

use anyhow::{bail, Result};

use crate::error::StackError;
use crate::stack_context::StackContext;
use crate::store::rebase_state::RebaseState;
use crate::vcs::Vcs;

/// What the user chose when recovering from an aborted restack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryChoice {
    Retry,
    RestorePreAmend,
    KeepCurrent,
}

/// What the caller should do next after a `--recover` inspection.
#[derive(Debug, Clone)]
pub enum RecoveryOutcome {
    /// A rebase is still in progress; the user must resolve conflicts.
    StillInProgress,
    /// Recovery completed; the returned context reflects the new state.
    Recovered(Box<StackContext>),
    /// We're on the stack branch after an `--abort`; caller must prompt
    /// the user with `RecoveryChoice` and call `resolve_abort`.
    NeedsChoice,
}

/// Default mode: fetch, then rebase the stack branch onto `origin/<base>`.
pub fn run(vcs: &Vcs, ctx: &StackContext, fetch: bool) -> Result<StackContext> {
    if fetch {
        vcs.fetch_origin()?;
    }

    let onto = format!("{}/{}", vcs.remote(), ctx.stack.base);
    run_onto(vcs, ctx, &onto)
}

/// `--onto B`: rebase onto branch `B` directly; no implicit fetch.
pub fn run_onto(vcs: &Vcs, ctx: &StackContext, onto: &str) -> Result<StackContext> {
    let root = ctx.store_root()?;
    let original_head = vcs.resolve_ref(&ctx.stack.stack_branch)?.as_str().to_string();

    RebaseState {
        stack_branch: ctx.stack.stack_branch.clone(),
        old_hash: ctx.stack.base.clone(),
        new_hash: onto.to_string(),
        original_head: original_head.clone(),
    }
    .save(&root, &ctx.stack.name)?;

    let outcome = vcs.rebase_fork_point(&ctx.stack.stack_branch, onto)?;
    if outcome.has_conflicts() {
        return Err(StackError::ConflictDuringRebase { program: crate::program_name::program_name() }.into());
    }

    let rebuilt = finish_successful_rebase(vcs, ctx)?;
    RebaseState::clear(&root, &ctx.stack.name)?;
    Ok(rebuilt)
}

fn finish_successful_rebase(vcs: &Vcs, ctx: &StackContext) -> Result<StackContext> {
    let rebuilt = ctx.rebuild(vcs)?;
    for change in &rebuilt.active_changes {
        let branch = rebuilt.uuid_branch_name(&change.uuid);
        let target = vcs.resolve_ref(&change.commit_hash)?;
        if vcs.branch_exists(&branch)? {
            vcs.create_reference(&format!("refs/heads/{branch}"), &target, true, "stack: restack refresh")?;
        } else {
            vcs.create_branch_at_ref(&branch, &change.commit_hash)?;
        }
    }
    rebuilt.rebuild(vcs)
}

/// `--recover`: inspect persisted RebaseState and the VCS's own rebase
/// state, covering the three recovery sub-cases.
pub fn recover(vcs: &Vcs, store_root: &std::path::Path, stack_name: &str) -> Result<RecoveryOutcome> {
    let state = RebaseState::load(store_root, stack_name)?
        .ok_or_else(|| anyhow::anyhow!("no restack recovery state found for '{}'", stack_name))?;

    if vcs.rebase_in_progress()? {
        return Ok(RecoveryOutcome::StillInProgress);
    }

    let current_branch = vcs.get_current_branch_name().unwrap_or_default();

    if current_branch != state.stack_branch {
        // Detached HEAD after a successful external `rebase --continue`.
        let new_tip = vcs.resolve_ref("HEAD")?;
        vcs.create_reference(&format!("refs/heads/{}", state.stack_branch), &new_tip, true, "stack: restack recovery")?;
        vcs.checkout_branch(&state.stack_branch)?;

        let ctx = StackContext::build_named(vcs, stack_name)?;
        let rebuilt = finish_successful_rebase(vcs, &ctx)?;
        RebaseState::clear(store_root, stack_name)?;
        return Ok(RecoveryOutcome::Recovered(Box::new(rebuilt)));
    }

    // On the stack branch after an `--abort`: the caller must prompt.
    Ok(RecoveryOutcome::NeedsChoice)
}

/// Apply the user's recovery choice after `recover` returned `NeedsChoice`.
pub fn resolve_abort(
    vcs: &Vcs,
    store_root: &std::path::Path,
    stack_name: &str,
    choice: RecoveryChoice,
) -> Result<StackContext> {
    let state = RebaseState::load(store_root, stack_name)?
        .ok_or_else(|| anyhow::anyhow!("no restack recovery state found for '{}'", stack_name))?;

    match choice {
        RecoveryChoice::Retry => {
            let ctx = StackContext::build_named(vcs, stack_name)?;
            let rebuilt = run_onto(vcs, &ctx, &state.new_hash)?;
            Ok(rebuilt)
        }
        RecoveryChoice::RestorePreAmend => {
            vcs.hard_reset_to(&state.original_head)?;
            let ctx = StackContext::build_named(vcs, stack_name)?;
            RebaseState::clear(store_root, stack_name)?;
            ctx.rebuild(vcs)
        }
        RecoveryChoice::KeepCurrent => {
            let ctx = StackContext::build_named(vcs, stack_name)?;
            let rebuilt = finish_successful_rebase(vcs, &ctx)?;
            RebaseState::clear(store_root, stack_name)?;
            Ok(rebuilt)
        }
    }
}

#[allow(dead_code)]
fn guard_stack_branch_checked_out(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    let current = vcs.get_current_branch_name()?;
    if current != ctx.stack.stack_branch && ctx.on_uuid_branch.is_none() {
        bail!("not on stack '{}': run `switch {}` first", ctx.stack.name, ctx.stack.name);
    }
    Ok(())
}
