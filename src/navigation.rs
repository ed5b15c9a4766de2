//! The working-tree state machine and the
//! up/down/top targeting logic.

use anyhow::{bail, Result};

use crate::error::StackError;
use crate::identity::Uuid16;
use crate::stack_context::StackContext;
use crate::vcs::Vcs;

/// Where the working tree currently sits relative to a stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    OffStack,
    OnTop,
    EditingChange(Uuid16),
}

impl StackContext {
    pub fn position(&self) -> Position {
        match &self.on_uuid_branch {
            Some(uuid) => Position::EditingChange(uuid.clone()),
            None => Position::OnTop,
        }
    }
}

/// Guard: refuse to navigate with a dirty working tree.
fn require_clean(vcs: &Vcs) -> Result<()> {
    if vcs.backend().has_uncommitted_changes()? {
        return Err(StackError::DirtyWorkingTree.into());
    }
    Ok(())
}

/// Check out `uuid`'s tracking branch, creating it at the change's current
/// commit if it doesn't exist locally, or updating its ref first if it's
/// stale. Never leaves the tree detached.
fn checkout_for_editing(vcs: &Vcs, ctx: &StackContext, uuid: &Uuid16) -> Result<()> {
    let change = ctx
        .find(uuid)
        .ok_or_else(|| StackError::MissingIdentity { commit: uuid.to_string() })?;
    let branch = ctx.uuid_branch_name(uuid);

    if vcs.branch_exists(&branch)? {
        vcs.create_reference(
            &format!("refs/heads/{branch}"),
            &vcs.resolve_ref(&change.commit_hash)?,
            true,
            "stack: refresh UUID branch before checkout",
        )?;
    } else {
        vcs.create_branch_at_ref(&branch, &change.commit_hash)?;
    }

    vcs.checkout_branch(&branch)?;
    Ok(())
}

/// `up`/`top`/`switch` all land here: check out the stack's TOP branch.
pub fn go_top(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    require_clean(vcs)?;
    vcs.checkout_branch(&ctx.stack.stack_branch)?;
    Ok(())
}

/// Move one change toward the base (away from the tip).
pub fn go_down(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    require_clean(vcs)?;

    match ctx.position() {
        Position::OffStack => bail!("not on a stack"),
        Position::OnTop => {
            if ctx.active_changes.len() < 2 {
                eprintln!("already at the bottom of the stack");
                return Ok(());
            }
            let target = &ctx.active_changes[ctx.active_changes.len() - 2];
            checkout_for_editing(vcs, ctx, &target.uuid)
        }
        Position::EditingChange(uuid) => {
            let index = ctx.active_index(&uuid).expect("on-branch UUID must be active");
            if index == 0 {
                eprintln!("already at the bottom of the stack");
                return Ok(());
            }
            let target = &ctx.active_changes[index - 1];
            checkout_for_editing(vcs, ctx, &target.uuid)
        }
    }
}

/// Move one change toward the tip.
pub fn go_up(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    require_clean(vcs)?;

    match ctx.position() {
        Position::OffStack => bail!("not on a stack"),
        Position::OnTop => {
            eprintln!("already at the top of the stack");
            Ok(())
        }
        Position::EditingChange(uuid) => {
            let index = ctx.active_index(&uuid).expect("on-branch UUID must be active");
            if index + 1 >= ctx.active_changes.len() {
                go_top(vcs, ctx)
            } else {
                let target = &ctx.active_changes[index + 1];
                checkout_for_editing(vcs, ctx, &target.uuid)
            }
        }
    }
}

/// `new <name> [--base B]`: create the stack branch at HEAD and persist a
/// fresh descriptor.
pub fn create_stack(
    vcs: &Vcs,
    store_root: &std::path::Path,
    name: &str,
    username: &str,
    base: &str,
    owner: &str,
    repo: &str,
) -> Result<()> {
    require_clean(vcs)?;
    crate::branch_name::validate_stack_name(name)?;

    let stack_branch = crate::branch_name::format_stack_branch(username, name);
    if vcs.branch_exists(&stack_branch)? {
        bail!("stack '{}' already exists", name);
    }

    vcs.create_branch_at_head(&stack_branch)?;
    vcs.checkout_branch(&stack_branch)?;

    let descriptor = crate::store::stack::StackDescriptor {
        name: name.to_string(),
        username: username.to_string(),
        base: base.to_string(),
        stack_branch,
        owner: owner.to_string(),
        repo: repo.to_string(),
    };
    descriptor.save(store_root)?;
    crate::store::write_current(store_root, name)?;

    Ok(())
}

/// `switch <name>`: check out an existing stack's TOP branch.
pub fn switch_stack(vcs: &Vcs, store_root: &std::path::Path, name: &str) -> Result<()> {
    require_clean(vcs)?;

    let descriptor = crate::store::stack::StackDescriptor::load(store_root, name)?
        .ok_or_else(|| StackError::NotInStack { program: crate::program_name::program_name() })?;

    vcs.checkout_branch(&descriptor.stack_branch)?;
    crate::store::write_current(store_root, name)?;
    Ok(())
}
