//! Reflect host-side merges into the local stack by polling
//! per-PR state against the host.

use anyhow::{Context, Result};
use chrono::Utc;

use crate::error::StackError;
use crate::host::{AsyncHost, PrState};
use crate::stack_context::StackContext;
use crate::store;
use crate::store::pr_data::PrData;
use crate::vcs::Vcs;

/// Outcome of a refresh: which changes were newly recognized as merged.
#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub merged_uuids: Vec<crate::identity::Uuid16>,
}

/// Run the full refresh algorithm and return the rebuilt context.
pub async fn run(vcs: &Vcs, ctx: &StackContext, host: &dyn AsyncHost) -> Result<(StackContext, RefreshReport)> {
    vcs.fetch_origin().context("failed to fetch from remote")?;

    let root = ctx.store_root()?;
    let mut pr_data = PrData::load(&root, &ctx.stack.name)?;

    let numbers: Vec<u64> = ctx
        .active_changes
        .iter()
        .filter_map(|c| c.pr.as_ref().map(|pr| pr.number))
        .collect();

    if numbers.is_empty() {
        store::write_last_sync(&root, &ctx.stack.name, Utc::now())?;
        return Ok((ctx.rebuild(vcs)?, RefreshReport { merged_uuids: vec![] }));
    }

    let statuses = host.batch_get_prs(&numbers).await;
    let status_by_number: std::collections::HashMap<u64, &crate::host::BatchPrStatus> =
        statuses.iter().map(|s| (s.number, s)).collect();

    for change in &ctx.active_changes {
        let Some(pr) = &change.pr else { continue };
        let Some(status) = status_by_number.get(&pr.number) else { continue };
        let mut record = pr.clone();
        record.state = status.state;
        record.updated_at = Utc::now();
        pr_data.set(change.uuid.clone(), record);
    }

    // Bottom-up validation: merged set must be a prefix {1, ..., k}.
    let mut newly_merged_positions: Vec<usize> = Vec::new();
    let mut seen_unmerged = false;
    for (index, change) in ctx.active_changes.iter().enumerate() {
        let is_merged_now = pr_data.get(&change.uuid).map(|r| r.state == PrState::Merged).unwrap_or(false);
        if is_merged_now {
            if seen_unmerged {
                let number = pr_data.get(&change.uuid).map(|r| r.number).unwrap_or(0);
                return Err(StackError::OutOfOrderMerge { number, position: change.active_position.unwrap_or(0) }.into());
            }
            newly_merged_positions.push(index);
        } else {
            seen_unmerged = true;
        }
    }

    pr_data.save(&root, &ctx.stack.name)?;

    if newly_merged_positions.is_empty() {
        store::write_last_sync(&root, &ctx.stack.name, Utc::now())?;
        return Ok((ctx.rebuild(vcs)?, RefreshReport { merged_uuids: vec![] }));
    }

    let k = newly_merged_positions.len();
    let last_merged = &ctx.active_changes[k - 1];

    // rebase_onto_from checks out the stack branch itself (not detached),
    // so a successful non-interactive rebase already moves its ref forward.
    let outcome = vcs.rebase_onto_from(&ctx.stack.stack_branch, &ctx.stack.base, &last_merged.commit_hash)?;
    if outcome.has_conflicts() {
        return Err(StackError::ConflictDuringRebase { program: crate::program_name::program_name() }.into());
    }

    let merged_uuids: Vec<crate::identity::Uuid16> =
        newly_merged_positions.iter().map(|&i| ctx.active_changes[i].uuid.clone()).collect();

    let rebuilt = ctx.rebuild(vcs)?;

    for uuid in &merged_uuids {
        let branch = ctx.uuid_branch_name(uuid);
        if vcs.branch_exists(&branch)? {
            vcs.delete_branch(&branch)?;
        }
    }

    for change in &rebuilt.active_changes {
        let branch = rebuilt.uuid_branch_name(&change.uuid);
        let target = vcs.resolve_ref(&change.commit_hash)?;
        if vcs.branch_exists(&branch)? {
            vcs.create_reference(&format!("refs/heads/{branch}"), &target, true, "stack: refresh UUID branch")?;
        } else {
            vcs.create_branch_at_ref(&branch, &change.commit_hash)?;
        }
    }

    store::write_last_sync(&root, &ctx.stack.name, Utc::now())?;

    let final_ctx = rebuilt.rebuild(vcs)?;
    Ok((final_ctx, RefreshReport { merged_uuids }))
}

