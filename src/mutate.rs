//! Amend/insert/fixup propagation.
//!
//! Invoked by the post-commit hook on any commit authored while on a stack
//! or UUID branch, and by the `fixup` command.

use anyhow::{bail, Context, Result};

use crate::error::StackError;
use crate::identity::Uuid16;
use crate::message;
use crate::operation_log::{LogEntry, Operation, OperationLog};
use crate::stack_context::StackContext;
use crate::store::rebase_state::RebaseState;
use crate::vcs::Vcs;

/// What kind of propagation a newly-authored HEAD commit requires, per the
/// classification rule for which mutation kind applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationKind {
    /// HEAD commit amended the change the UUID branch is tracking.
    Amend { uuid: Uuid16 },
    /// HEAD commit is a new change inserted after `after_uuid` on its branch.
    Insert { after_uuid: Uuid16 },
    /// HEAD commit amended the tip change directly on the stack branch.
    TopAmend,
    /// Ordinary append on TOP; no cascade needed beyond a UUID-branch refresh.
    Append,
}

/// Classify the situation at hook entry. Returns `None` if the VCS is
/// mid-rebase (the hook must no-op silently in that case).
pub fn classify(vcs: &Vcs, ctx: &StackContext) -> Result<Option<MutationKind>> {
    if vcs.rebase_in_progress()? {
        return Ok(None);
    }

    let head = vcs.resolve_ref("HEAD")?;
    let head_message = vcs.backend().get_commit_message(head.as_str())?;
    let head_uuid = message::parse(&head_message).uuid().and_then(Uuid16::parse);

    let kind = match &ctx.on_uuid_branch {
        Some(branch_uuid) => match &head_uuid {
            Some(uuid) if uuid == branch_uuid => MutationKind::Amend { uuid: uuid.clone() },
            _ => MutationKind::Insert { after_uuid: branch_uuid.clone() },
        },
        None => match &head_uuid {
            Some(uuid) if ctx.find(uuid).is_some() => MutationKind::TopAmend,
            _ => MutationKind::Append,
        },
    };

    Ok(Some(kind))
}

/// Apply the propagation cascade for `kind` and return the rebuilt context.
pub fn apply(vcs: &Vcs, ctx: &StackContext, kind: MutationKind) -> Result<StackContext> {
    let root = ctx.store_root()?;
    match kind {
        MutationKind::Amend { uuid } => {
            let rebuilt = amend_on_uuid_branch(vcs, ctx, &uuid)?;
            OperationLog::new(&root)
                .log(LogEntry::new(Operation::ChangeAmended { stack: ctx.stack.name.clone(), uuid: uuid.to_string() }))?;
            Ok(rebuilt)
        }
        MutationKind::Insert { after_uuid } => {
            let rebuilt = insert_on_uuid_branch(vcs, ctx, &after_uuid)?;
            OperationLog::new(&root).log(LogEntry::new(Operation::ChangeInserted {
                stack: ctx.stack.name.clone(),
                uuid: rebuilt.current_uuid.as_ref().map(|u| u.to_string()).unwrap_or_default(),
                after: after_uuid.to_string(),
            }))?;
            Ok(rebuilt)
        }
        MutationKind::TopAmend | MutationKind::Append => top_amend(vcs, ctx),
    }
}

/// Update every active change's UUID branch ref to match its current commit
/// hash so every PR keeps tracking the right commit. Does not touch the
/// working tree's checkout.
fn refresh_uuid_branches(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    for change in &ctx.active_changes {
        let branch = ctx.uuid_branch_name(&change.uuid);
        let target = vcs.resolve_ref(&change.commit_hash)?;
        if vcs.branch_exists(&branch)? {
            vcs.create_reference(&format!("refs/heads/{branch}"), &target, true, "stack: refresh UUID branch")?;
        } else {
            vcs.create_branch_at_ref(&branch, &change.commit_hash)?;
        }
    }
    Ok(())
}

fn rebase_state_root(ctx: &StackContext) -> Result<std::path::PathBuf> {
    ctx.store_root()
}

/// TOP-AMEND: amend occurred directly on the stack branch. No rebase
/// needed; just refresh UUID branches to match current hashes.
fn top_amend(vcs: &Vcs, ctx: &StackContext) -> Result<StackContext> {
    refresh_uuid_branches(vcs, ctx)?;
    ctx.rebuild(vcs)
}

/// AMEND on a UUID branch.
fn amend_on_uuid_branch(vcs: &Vcs, ctx: &StackContext, uuid: &Uuid16) -> Result<StackContext> {
    let root = rebase_state_root(ctx)?;
    let change = ctx.find(uuid).ok_or_else(|| StackError::MissingIdentity { commit: uuid.to_string() })?;
    let c_old = change.commit_hash.clone();
    let c_new = vcs.resolve_ref("HEAD")?.as_str().to_string();
    let original_head = vcs.resolve_ref(&ctx.stack.stack_branch)?.as_str().to_string();

    RebaseState {
        stack_branch: ctx.stack.stack_branch.clone(),
        old_hash: c_old.clone(),
        new_hash: "pending".to_string(),
        original_head: original_head.clone(),
    }
    .save(&root, &ctx.stack.name)?;

    vcs.checkout_branch(&ctx.stack.stack_branch)?;

    let parent = vcs
        .backend()
        .get_parent_oid(&vcs.resolve_ref(&c_old)?)?
        .ok_or_else(|| anyhow::anyhow!("change '{}' has no parent commit (cannot amend the stack root)", uuid))?;
    let tree = vcs.backend().get_tree_oid(&vcs.resolve_ref(&c_new)?)?;
    let message = vcs.backend().get_commit_message(&c_new)?;

    let c_new_prime = vcs.backend().create_commit(&parent, &tree, &message)?;

    RebaseState {
        stack_branch: ctx.stack.stack_branch.clone(),
        old_hash: c_old.clone(),
        new_hash: c_new_prime.as_str().to_string(),
        original_head: original_head.clone(),
    }
    .save(&root, &ctx.stack.name)?;

    vcs.hard_reset_to(c_new_prime.as_str())?;

    if original_head != c_old {
        let outcome = vcs.rebase_onto_range(c_new_prime.as_str(), &c_old, &original_head)?;
        if outcome.has_conflicts() {
            return Err(StackError::ConflictDuringRebase { program: crate::program_name::program_name() }.into());
        }

        let new_tip = vcs.resolve_ref("HEAD")?;
        vcs.create_reference(&format!("refs/heads/{}", ctx.stack.stack_branch), &new_tip, true, "stack: amend cascade")?;
        vcs.checkout_branch(&ctx.stack.stack_branch)?;
    }

    let rebuilt = ctx.rebuild(vcs)?;
    refresh_uuid_branches(vcs, &rebuilt)?;
    vcs.checkout_branch(&rebuilt.uuid_branch_name(uuid))?;

    RebaseState::clear(&root, &ctx.stack.name)?;

    rebuilt.rebuild(vcs)
}

/// INSERT on a UUID branch.
fn insert_on_uuid_branch(vcs: &Vcs, ctx: &StackContext, after_uuid: &Uuid16) -> Result<StackContext> {
    let root = rebase_state_root(ctx)?;

    let head = vcs.resolve_ref("HEAD")?;
    let head_message = vcs.backend().get_commit_message(head.as_str())?;
    let mut parsed = message::parse(&head_message);

    let new_uuid = if parsed.uuid().is_none() {
        let generated = Uuid16::generate();
        parsed.add_trailer(message::TRAILER_UUID, generated.as_str());
        parsed.add_trailer(message::TRAILER_STACK, &ctx.stack.name);
        let rendered = message::render(&parsed);
        vcs.amend_commit(Some(&rendered))?;
        generated
    } else {
        Uuid16::parse(parsed.uuid().unwrap()).ok_or_else(|| StackError::MissingIdentity { commit: head.as_str().to_string() })?
    };

    let c_head = vcs.resolve_ref("HEAD")?;

    let original_head = vcs.resolve_ref(&ctx.stack.stack_branch)?.as_str().to_string();
    let after = ctx.find(after_uuid).ok_or_else(|| StackError::MissingIdentity { commit: after_uuid.to_string() })?;
    let c_after = after.commit_hash.clone();

    RebaseState {
        stack_branch: ctx.stack.stack_branch.clone(),
        old_hash: c_after.clone(),
        new_hash: "pending".to_string(),
        original_head: original_head.clone(),
    }
    .save(&root, &ctx.stack.name)?;

    vcs.checkout_branch(&ctx.stack.stack_branch)?;
    vcs.hard_reset_to(&c_after)?;
    vcs.backend().cherry_pick_no_commit(&c_head)?;
    vcs.commit(&message::render(&message::parse(&vcs.backend().get_commit_message(c_head.as_str())?)))?;

    let c_inserted = vcs.resolve_ref("HEAD")?;

    RebaseState {
        stack_branch: ctx.stack.stack_branch.clone(),
        old_hash: c_after.clone(),
        new_hash: c_inserted.as_str().to_string(),
        original_head: original_head.clone(),
    }
    .save(&root, &ctx.stack.name)?;

    if original_head != c_after {
        let outcome = vcs.rebase_onto_range(c_inserted.as_str(), &c_after, &original_head)?;
        if outcome.has_conflicts() {
            return Err(StackError::ConflictDuringRebase { program: crate::program_name::program_name() }.into());
        }

        let new_tip = vcs.resolve_ref("HEAD")?;
        vcs.create_reference(&format!("refs/heads/{}", ctx.stack.stack_branch), &new_tip, true, "stack: insert cascade")?;
        vcs.checkout_branch(&ctx.stack.stack_branch)?;
    }

    let rebuilt = ctx.rebuild(vcs)?;
    refresh_uuid_branches(vcs, &rebuilt)?;
    vcs.checkout_branch(&rebuilt.uuid_branch_name(after_uuid))?;

    RebaseState::clear(&root, &ctx.stack.name)?;

    let _ = new_uuid;
    rebuilt.rebuild(vcs)
}

/// FIXUP: entry guard is enforced by the caller (`commands::fixup`):
/// on TOP, staged changes present, no rebase in progress.
pub fn fixup(vcs: &Vcs, ctx: &StackContext, target_uuid: &Uuid16) -> Result<StackContext> {
    if vcs.rebase_in_progress()? {
        bail!("a rebase is already in progress; resolve or abort it first");
    }
    if !vcs.backend().has_staged_changes()? {
        bail!("no staged changes to fixup; stage your changes first");
    }

    let target = ctx
        .find(target_uuid)
        .filter(|c| !c.is_merged())
        .ok_or_else(|| StackError::MissingIdentity { commit: target_uuid.to_string() })?;

    let output = std::process::Command::new("git")
        .args(["commit", "--fixup", &target.commit_hash])
        .current_dir(vcs.workdir())
        .output()
        .context("failed to create fixup commit")?;
    if !output.status.success() {
        bail!("failed to create fixup commit: {}", String::from_utf8_lossy(&output.stderr).trim());
    }

    let parent = vcs
        .backend()
        .get_parent_oid(&vcs.resolve_ref(&target.commit_hash)?)?
        .map(|oid| oid.as_str().to_string())
        .unwrap_or_else(|| ctx.stack.base.clone());

    vcs.interactive_rebase(&parent, true).context(
        "autosquash rebase failed. Resolve the conflict, then run:\n  git add <resolved files>\n  git rebase --continue",
    )?;

    if vcs.rebase_in_progress()? {
        return Err(StackError::ConflictDuringRebase { program: crate::program_name::program_name() }.into());
    }

    let rebuilt = ctx.rebuild(vcs)?;
    refresh_uuid_branches(vcs, &rebuilt)?;
    rebuilt.rebuild(vcs)
}
