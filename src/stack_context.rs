//! Composes the VCS, the persistent store, and
//! cached PR data into a read-only snapshot of a stack at an instant.
//!
//! Mirrors a `branch_tree.rs`-style tree-building shape, generalized from a
//! parent-pointer tree to a linear stack-branch model.

use anyhow::{Context, Result};
use std::collections::HashMap;

use crate::branch_name::{self, BranchKind};
use crate::error::StackError;
use crate::identity::Uuid16;
use crate::message;
use crate::store::pr_data::{PrData, PrRecord};
use crate::store::stack::StackDescriptor;
use crate::store::{self, store_root};
use crate::vcs::Vcs;

pub use crate::store::stack::StackDescriptor as Stack;

/// A single commit in a stack.
#[derive(Debug, Clone)]
pub struct Change {
    pub uuid: Uuid16,
    /// 1-based position from base toward tip, across all changes.
    pub position: u32,
    /// 1-based position among unmerged changes only; `None` if merged.
    pub active_position: Option<u32>,
    pub commit_hash: String,
    pub title: String,
    pub description: String,
    pub desired_base: String,
    pub pr: Option<PrRecord>,
    pub local_draft: bool,
}

impl Change {
    pub fn is_merged(&self) -> bool {
        matches!(self.pr.as_ref(), Some(pr) if pr.state == crate::host::PrState::Merged)
    }
}

/// Immutable per-invocation snapshot of a stack.
#[derive(Debug, Clone)]
pub struct StackContext {
    pub stack: Stack,
    pub all_changes: Vec<Change>,
    pub active_changes: Vec<Change>,
    pub by_uuid: HashMap<Uuid16, usize>,
    pub current_uuid: Option<Uuid16>,
    pub on_uuid_branch: Option<Uuid16>,
    pub username: String,
}

impl StackContext {
    /// Build a snapshot for the stack the current branch belongs to.
    ///
    /// Returns `Err(StackError::NotAStackBranch)` if the current branch is
    /// neither a stack branch nor a UUID branch.
    pub fn build(vcs: &Vcs) -> Result<Self> {
        let current_branch = vcs.get_current_branch_name()?;

        let (username, name, on_uuid_branch) = match branch_name::classify(&current_branch) {
            Some(BranchKind::Stack { username, stack_name }) => (username, stack_name, None),
            Some(BranchKind::Uuid { username, stack_name, uuid }) => {
                let uuid = Uuid16::parse(&uuid)
                    .ok_or_else(|| StackError::InvalidName { name: uuid.clone(), reason: "not a 16-hex-char UUID" })?;
                (username, stack_name, Some(uuid))
            }
            None => {
                return Err(StackError::NotAStackBranch { branch: current_branch }.into());
            }
        };

        let root = store_root()?;
        let descriptor = StackDescriptor::load(&root, &name)?
            .ok_or_else(|| StackError::NotInStack { program: crate::program_name::program_name() })?;

        Self::build_from(vcs, &root, descriptor, username, on_uuid_branch)
    }

    /// Build a snapshot for a named stack regardless of current branch,
    /// used by commands that operate on a specific stack by name (e.g.
    /// `switch`, `status <name>`).
    pub fn build_named(vcs: &Vcs, name: &str) -> Result<Self> {
        let root = store_root()?;
        let descriptor = StackDescriptor::load(&root, name)?
            .ok_or_else(|| StackError::NotInStack { program: crate::program_name::program_name() })?;

        let current_branch = vcs.get_current_branch_name().unwrap_or_default();
        let on_uuid_branch = match branch_name::classify(&current_branch) {
            Some(BranchKind::Uuid { stack_name, uuid, .. }) if stack_name == name => Uuid16::parse(&uuid),
            _ => None,
        };

        let username = descriptor.username.clone();
        Self::build_from(vcs, &root, descriptor, username, on_uuid_branch)
    }

    fn build_from(
        vcs: &Vcs,
        root: &std::path::Path,
        stack: StackDescriptor,
        username: String,
        on_uuid_branch: Option<Uuid16>,
    ) -> Result<Self> {
        let commits = vcs
            .get_commits_oldest_first(&stack.base, &stack.stack_branch)
            .with_context(|| format!("failed to walk commits between '{}' and '{}'", stack.base, stack.stack_branch))?;

        let pr_data = PrData::load(root, &stack.name)?;
        let local_drafts = store::local_draft::read_all(root, &stack.name)?;

        let mut live_changes = Vec::with_capacity(commits.len());
        for hash in &commits {
            let message_text = vcs.backend().get_commit_message(hash)?;
            let parsed = message::parse(&message_text);

            let uuid = parsed
                .uuid()
                .and_then(Uuid16::parse)
                .ok_or_else(|| StackError::MissingIdentity { commit: hash.clone() })?;

            let pr = pr_data.get(&uuid).cloned();
            let local_draft = local_drafts.contains(&uuid);

            live_changes.push(Change {
                uuid,
                position: 0,
                active_position: None,
                commit_hash: hash.clone(),
                title: parsed.title.clone(),
                description: parsed.body.clone(),
                desired_base: String::new(),
                pr,
                local_draft,
            });
        }

        // A merge rebases the merged commit off the stack branch, so its
        // identity no longer appears in `commits`. Fold it back in from the
        // cached PR record: merged changes are retained in `all_changes` but
        // excluded from `active_changes`. Ordered by merge time, oldest
        // first, which matches the bottom-up merge invariant `refresh`
        // enforces (the merged set is always a prefix).
        let live_uuids: std::collections::HashSet<&Uuid16> = live_changes.iter().map(|c| &c.uuid).collect();
        let mut retained_merged: Vec<Change> = pr_data
            .merged_records()
            .filter(|(uuid, _)| !live_uuids.contains(uuid))
            .map(|(uuid, record)| Change {
                uuid: uuid.clone(),
                position: 0,
                active_position: None,
                commit_hash: record.last_pushed_commit.clone(),
                title: record.remote_title.clone(),
                description: record.remote_body.clone(),
                desired_base: record.remote_base.clone(),
                pr: Some(record.clone()),
                local_draft: false,
            })
            .collect();
        retained_merged.sort_by_key(|c| c.pr.as_ref().map(|pr| pr.updated_at).unwrap());

        let mut all_changes: Vec<Change> = retained_merged;
        all_changes.extend(live_changes);
        for (index, change) in all_changes.iter_mut().enumerate() {
            change.position = (index + 1) as u32;
        }

        let mut active_changes: Vec<Change> = all_changes
            .iter()
            .filter(|c| !c.is_merged())
            .cloned()
            .collect();

        for (index, change) in active_changes.iter_mut().enumerate() {
            change.active_position = Some((index + 1) as u32);
            change.desired_base = if index == 0 {
                stack.base.clone()
            } else {
                branch_name::format_uuid_branch(&username, &stack.name, active_changes_uuid_at(&all_changes, index - 1).as_str())
            };
        }

        // Reflect active_position and desired_base back onto all_changes.
        let active_by_uuid: HashMap<Uuid16, &Change> = active_changes.iter().map(|c| (c.uuid.clone(), c)).collect();
        for change in all_changes.iter_mut() {
            if let Some(active) = active_by_uuid.get(&change.uuid) {
                change.active_position = active.active_position;
                change.desired_base = active.desired_base.clone();
            }
        }

        let by_uuid: HashMap<Uuid16, usize> = all_changes.iter().enumerate().map(|(i, c)| (c.uuid.clone(), i)).collect();

        let current_uuid = match &on_uuid_branch {
            Some(uuid) => Some(uuid.clone()),
            None => active_changes.last().map(|c| c.uuid.clone()),
        };

        Ok(StackContext {
            stack,
            all_changes,
            active_changes,
            by_uuid,
            current_uuid,
            on_uuid_branch,
            username,
        })
    }

    pub fn find(&self, uuid: &Uuid16) -> Option<&Change> {
        self.by_uuid.get(uuid).map(|&i| &self.all_changes[i])
    }

    pub fn active_index(&self, uuid: &Uuid16) -> Option<usize> {
        self.active_changes.iter().position(|c| &c.uuid == uuid)
    }

    pub fn uuid_branch_name(&self, uuid: &Uuid16) -> String {
        branch_name::format_uuid_branch(&self.username, &self.stack.name, uuid.as_str())
    }

    pub fn store_root(&self) -> Result<std::path::PathBuf> {
        store_root()
    }

    /// Rebuild a fresh snapshot after VCS/store mutations, per the
    /// "rebuild-and-throw-away" design note: never mutate a live context.
    pub fn rebuild(&self, vcs: &Vcs) -> Result<Self> {
        Self::build_named(vcs, &self.stack.name)
    }
}

fn active_changes_uuid_at(all_changes: &[Change], active_index_among_active: usize) -> Uuid16 {
    let mut seen = 0usize;
    for change in all_changes {
        if !change.is_merged() {
            if seen == active_index_among_active {
                return change.uuid.clone();
            }
            seen += 1;
        }
    }
    unreachable!("active_index_among_active out of range")
}

pub fn mark_current_stack(name: &str) -> Result<()> {
    let root = store_root()?;
    store::write_current(&root, name)
}

pub fn require_current_stack() -> Result<String> {
    let root = store_root()?;
    store::read_current(&root)?.ok_or_else(|| {
        StackError::NotInStack { program: crate::program_name::program_name() }.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn change_is_merged_reflects_pr_state() {
        let mut change = Change {
            uuid: Uuid16::generate(),
            position: 1,
            active_position: None,
            commit_hash: "deadbeef".to_string(),
            title: "t".to_string(),
            description: String::new(),
            desired_base: "main".to_string(),
            pr: None,
            local_draft: false,
        };
        assert!(!change.is_merged());

        change.pr = Some(PrRecord {
            number: 1,
            url: String::new(),
            state: crate::host::PrState::Merged,
            remote_title: String::new(),
            remote_body: String::new(),
            remote_base: String::new(),
            remote_head: String::new(),
            remote_draft: false,
            last_pushed_commit: String::new(),
            comment_id: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        });
        assert!(change.is_merged());
    }

    fn git(dir: &std::path::Path, args: &[&str]) {
        let status = std::process::Command::new("git").args(args).current_dir(dir).status().unwrap();
        assert!(status.success(), "git {:?} failed", args);
    }

    fn commit_with_trailers(dir: &std::path::Path, title: &str, uuid: &Uuid16, stack: &str, file: &str) -> String {
        std::fs::write(dir.join(file), title).unwrap();
        git(dir, &["add", file]);
        let mut msg = crate::message::Message { title: title.to_string(), ..Default::default() };
        msg.add_trailer(crate::message::TRAILER_UUID, uuid.as_str());
        msg.add_trailer(crate::message::TRAILER_STACK, stack);
        git(dir, &["commit", "-m", &crate::message::render(&msg)]);
        let out = std::process::Command::new("git").args(["rev-parse", "HEAD"]).current_dir(dir).output().unwrap();
        String::from_utf8_lossy(&out.stdout).trim().to_string()
    }

    fn sample_merged_record(updated_at: chrono::DateTime<chrono::Utc>) -> PrRecord {
        PrRecord {
            number: 7,
            url: "https://example.invalid/pull/7".to_string(),
            state: crate::host::PrState::Merged,
            remote_title: "change A".to_string(),
            remote_body: String::new(),
            remote_base: "main".to_string(),
            remote_head: "alice/stack-feature/aaaaaaaaaaaaaaaa".to_string(),
            remote_draft: false,
            last_pushed_commit: "deadbeef".to_string(),
            comment_id: None,
            created_at: updated_at,
            updated_at,
        }
    }

    /// A merge folds the merged commit off the stack branch (`rebase
    /// --onto base <merged>`), so it can no longer be walked from git log.
    /// `all_changes` must still surface it, reconstructed from the cached
    /// PR record, so callers (e.g. `stack_viz`) can show it as retained
    /// but inactive.
    #[test]
    fn build_from_retains_a_merged_change_folded_off_the_stack_branch() {
        let dir = tempdir().unwrap();
        let dir = dir.path();
        git(dir, &["init", "-b", "main"]);
        git(dir, &["config", "user.name", "Test"]);
        git(dir, &["config", "user.email", "test@example.com"]);
        std::fs::write(dir.join("README.md"), "base").unwrap();
        git(dir, &["add", "README.md"]);
        git(dir, &["commit", "-m", "base"]);
        git(dir, &["checkout", "-b", "alice/stack-feature/TOP"]);

        let uuid_a = Uuid16::generate();
        let uuid_b = Uuid16::generate();
        let hash_a = commit_with_trailers(dir, "change A", &uuid_a, "feature", "a.txt");
        commit_with_trailers(dir, "change B", &uuid_b, "feature", "b.txt");

        // Simulate what `refresh` does once A is reported merged: rebase the
        // commits after A onto base, dropping A from the branch.
        git(dir, &["rebase", "--onto", "main", &hash_a]);

        let vcs = crate::vcs::Vcs::from_path(dir).unwrap();
        let store_root = dir.join("store");

        let mut pr_data = PrData::new();
        pr_data.set(uuid_a.clone(), sample_merged_record(chrono::Utc::now()));
        pr_data.save(&store_root, "feature").unwrap();

        let stack = Stack {
            name: "feature".to_string(),
            username: "alice".to_string(),
            base: "main".to_string(),
            stack_branch: "alice/stack-feature/TOP".to_string(),
            owner: "acme".to_string(),
            repo: "widgets".to_string(),
        };

        let ctx = StackContext::build_from(&vcs, &store_root, stack, "alice".to_string(), None).unwrap();

        assert_eq!(ctx.all_changes.len(), 2);
        assert_eq!(ctx.all_changes[0].uuid, uuid_a);
        assert!(ctx.all_changes[0].is_merged());
        assert_eq!(ctx.all_changes[1].uuid, uuid_b);
        assert!(!ctx.all_changes[1].is_merged());

        assert_eq!(ctx.active_changes.len(), 1);
        assert_eq!(ctx.active_changes[0].uuid, uuid_b);
        assert_eq!(ctx.active_changes[0].active_position, Some(1));

        assert!(ctx.find(&uuid_a).is_some(), "merged change must remain findable by uuid");
    }
}
