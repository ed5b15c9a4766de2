//! Per-change CREATE/UPDATE/SKIP decisions and the
//! visualization-comment sync.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::error::StackError;
use crate::host::{Host, PrSpec, PrState};
use crate::identity::Uuid16;
use crate::stack_context::{Change, StackContext};
use crate::stack_viz;
use crate::store::pr_data::{PrData, PrRecord};
use crate::vcs::Vcs;

/// What the engine decided to do for one change.
#[derive(Debug, Clone)]
pub enum Action {
    Create,
    Update { reasons: Vec<String> },
    Skip { reason: String },
}

/// One change's decision, computed before any mutation.
#[derive(Debug, Clone)]
pub struct Decision {
    pub uuid: Uuid16,
    pub action: Action,
}

/// Options controlling the push.
#[derive(Debug, Clone, Copy, Default)]
pub struct PushOptions {
    pub dry_run: bool,
    pub force: bool,
}

/// Pre-flight guards: not on a stack is enforced by the caller building
/// `ctx` at all; this checks the remaining two.
pub fn preflight(vcs: &Vcs, ctx: &StackContext) -> Result<()> {
    if vcs.backend().has_uncommitted_changes()? {
        return Err(StackError::DirtyWorkingTree.into());
    }

    for change in &ctx.active_changes {
        if let Some(pr) = &change.pr {
            if pr.state == PrState::Merged {
                return Err(StackError::StackOutOfSync { program: crate::program_name::program_name() }.into());
            }
        }
    }

    Ok(())
}

/// Compute the desired PR spec for a change without mutating anything.
fn desired_spec(ctx: &StackContext, change: &Change) -> PrSpec {
    PrSpec {
        number: change.pr.as_ref().map(|p| p.number).unwrap_or(0),
        title: change.title.clone(),
        body: change.description.clone(),
        base: change.desired_base.clone(),
        head: ctx.uuid_branch_name(&change.uuid),
        draft: change.local_draft,
    }
}

/// Decide the action for every active change, per the decision
/// procedure. Pure; makes no VCS or host calls.
pub fn decide(ctx: &StackContext, options: PushOptions) -> Vec<Decision> {
    ctx.active_changes
        .iter()
        .map(|change| {
            let spec = desired_spec(ctx, change);
            let action = match &change.pr {
                None => Action::Create,
                Some(pr) if pr.state == PrState::Closed => {
                    Action::Skip { reason: "PR is closed on host".to_string() }
                }
                Some(pr) => {
                    let mut reasons = Vec::new();
                    if pr.remote_title != spec.title {
                        reasons.push("title".to_string());
                    }
                    if pr.remote_body != spec.body {
                        reasons.push("body".to_string());
                    }
                    if pr.remote_base != spec.base {
                        reasons.push("base".to_string());
                    }
                    if change.commit_hash != pr.last_pushed_commit {
                        reasons.push("commit".to_string());
                    }
                    if spec.draft != pr.remote_draft {
                        reasons.push("draft".to_string());
                    }

                    if options.force {
                        Action::Update { reasons: vec!["--force".to_string()] }
                    } else if reasons.is_empty() {
                        Action::Skip { reason: "up to date".to_string() }
                    } else {
                        Action::Update { reasons }
                    }
                }
            };
            Decision { uuid: change.uuid.clone(), action }
        })
        .collect()
}

/// Execute the decisions: push branches, sync PRs, write back records, and
/// refresh the visualization comment on touched PRs.
pub fn run(vcs: &Vcs, ctx: &StackContext, host: &dyn Host, options: PushOptions) -> Result<Vec<Decision>> {
    preflight(vcs, ctx)?;

    let decisions = decide(ctx, options);

    if options.dry_run {
        return Ok(decisions);
    }

    let root = ctx.store_root()?;
    let mut pr_data = PrData::load(&root, &ctx.stack.name)?;
    let mut touched = false;

    for decision in &decisions {
        let change = ctx.find(&decision.uuid).expect("decision uuid must be in context");
        match &decision.action {
            Action::Skip { .. } => continue,
            Action::Create | Action::Update { .. } => {
                let branch = ctx.uuid_branch_name(&change.uuid);
                let target = vcs.resolve_ref(&change.commit_hash)?;
                if vcs.branch_exists(&branch)? {
                    vcs.create_reference(&format!("refs/heads/{branch}"), &target, true, "stack: push")?;
                } else {
                    vcs.create_branch_at_ref(&branch, &change.commit_hash)?;
                }
                vcs.push_branch(&branch, true)?;

                let spec = desired_spec(ctx, change);
                let record = host.sync_pr(&spec)?;

                let existing = pr_data.get(&change.uuid).cloned();
                let now = Utc::now();
                pr_data.set(
                    change.uuid.clone(),
                    PrRecord {
                        number: record.number,
                        url: record.url,
                        state: record.state,
                        remote_title: spec.title,
                        remote_body: spec.body,
                        remote_base: spec.base,
                        remote_head: spec.head,
                        remote_draft: spec.draft,
                        last_pushed_commit: change.commit_hash.clone(),
                        comment_id: existing.as_ref().and_then(|e| e.comment_id.clone()),
                        created_at: existing.map(|e| e.created_at).unwrap_or(now),
                        updated_at: now,
                    },
                );
                touched = true;
            }
        }
    }

    pr_data.save(&root, &ctx.stack.name)?;

    if touched || options.force {
        sync_visualization(vcs, ctx, host, &mut pr_data)?;
        pr_data.save(&root, &ctx.stack.name)?;
    }

    Ok(decisions)
}

/// Render a single tree view of the stack and sync it as a bot comment on
/// every active change's PR, editing in place via the cached comment ID.
fn sync_visualization(_vcs: &Vcs, ctx: &StackContext, host: &dyn Host, pr_data: &mut PrData) -> Result<()> {
    let body = stack_viz::render(ctx);

    for change in &ctx.active_changes {
        let Some(number) = pr_data.get(&change.uuid).map(|r| r.number) else { continue };
        let comment_id = pr_data.get(&change.uuid).and_then(|r| r.comment_id.clone());

        let new_comment_id = match comment_id {
            Some(id) => {
                host.update_comment(number, &id, &body).context("failed to update stack visualization comment")?;
                id
            }
            None => host.create_comment(number, &body).context("failed to create stack visualization comment")?,
        };

        if let Some(record) = pr_data.prs.get_mut(&change.uuid) {
            record.comment_id = Some(new_comment_id);
        }
    }

    Ok(())
}
