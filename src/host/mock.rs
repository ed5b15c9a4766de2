//! In-memory host implementation for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{AsyncHost, BatchPrStatus, Host, PrRecord, PrSpec, PrState, RepoInfo};

struct MockState {
    next_number: u64,
    prs: HashMap<u64, PrRecord>,
    prs_by_head: HashMap<String, u64>,
    comments: HashMap<u64, Vec<(String, String)>>,
    next_comment_id: u64,
    repo_info: RepoInfo,
}

/// Deterministic, synchronous stand-in for a real PR host, used by
/// integration tests. Keeps PRs in memory keyed by number and head branch so
/// `sync_pr`'s create-or-adopt behavior can be exercised without `gh`.
pub struct MockHost {
    state: Mutex<MockState>,
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_number: 1,
                prs: HashMap::new(),
                prs_by_head: HashMap::new(),
                comments: HashMap::new(),
                next_comment_id: 1,
                repo_info: RepoInfo {
                    owner: "test-owner".to_string(),
                    name: "test-repo".to_string(),
                    default_branch: "main".to_string(),
                },
            }),
        }
    }

    pub fn with_repo_info(owner: &str, name: &str, default_branch: &str) -> Self {
        let host = Self::new();
        host.state.lock().unwrap().repo_info = RepoInfo {
            owner: owner.to_string(),
            name: name.to_string(),
            default_branch: default_branch.to_string(),
        };
        host
    }

    /// Mark a PR as merged on the host side, for exercising AlreadyMerged paths.
    pub fn mark_merged(&self, number: u64) {
        if let Some(pr) = self.state.lock().unwrap().prs.get_mut(&number) {
            pr.state = PrState::Merged;
        }
    }

    /// Mark a PR as closed (not merged) on the host side.
    pub fn mark_closed(&self, number: u64) {
        if let Some(pr) = self.state.lock().unwrap().prs.get_mut(&number) {
            pr.state = PrState::Closed;
        }
    }

    pub fn get_pr(&self, number: u64) -> Option<PrRecord> {
        self.state.lock().unwrap().prs.get(&number).cloned()
    }
}

impl Default for MockHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MockHost {
    fn cli_name(&self) -> &str {
        "mock"
    }

    fn check_auth(&self) -> Result<()> {
        Ok(())
    }

    fn sync_pr(&self, spec: &PrSpec) -> Result<PrRecord> {
        let mut state = self.state.lock().unwrap();

        let number = if spec.number > 0 {
            spec.number
        } else if let Some(&existing) = state.prs_by_head.get(&spec.head) {
            existing
        } else {
            let n = state.next_number;
            state.next_number += 1;
            n
        };

        if let Some(existing) = state.prs.get(&number) {
            if existing.state == PrState::Merged {
                bail!("PR #{} is already merged on the host", number);
            }
        }

        let record = PrRecord {
            number,
            url: format!("https://example.invalid/{}/{}/pull/{}", state.repo_info.owner, state.repo_info.name, number),
            state: if spec.draft { PrState::Draft } else { PrState::Open },
            title: spec.title.clone(),
            body: spec.body.clone(),
            base: spec.base.clone(),
            head: spec.head.clone(),
            draft: spec.draft,
            last_pushed_commit: String::new(),
            comment_id: None,
        };

        state.prs_by_head.insert(spec.head.clone(), number);
        state.prs.insert(number, record.clone());

        Ok(record)
    }

    fn get_repo_info(&self) -> Result<RepoInfo> {
        Ok(self.state.lock().unwrap().repo_info.clone())
    }

    fn mark_ready(&self, number: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.prs.get_mut(&number) {
            Some(pr) => {
                pr.draft = false;
                if pr.state == PrState::Draft {
                    pr.state = PrState::Open;
                }
                Ok(())
            }
            None => bail!("PR #{} not found", number),
        }
    }

    fn mark_draft(&self, number: u64) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match state.prs.get_mut(&number) {
            Some(pr) => {
                pr.draft = true;
                if pr.state == PrState::Open {
                    pr.state = PrState::Draft;
                }
                Ok(())
            }
            None => bail!("PR #{} not found", number),
        }
    }

    fn list_comments(&self, number: u64) -> Result<Vec<(String, String)>> {
        Ok(self.state.lock().unwrap().comments.get(&number).cloned().unwrap_or_default())
    }

    fn create_comment(&self, number: u64, body: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if !state.prs.contains_key(&number) {
            bail!("PR #{} not found", number);
        }
        let id = state.next_comment_id.to_string();
        state.next_comment_id += 1;
        state.comments.entry(number).or_default().push((id.clone(), body.to_string()));
        Ok(id)
    }

    fn update_comment(&self, number: u64, comment_id: &str, body: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let comments = state.comments.entry(number).or_default();
        match comments.iter_mut().find(|(id, _)| id == comment_id) {
            Some(entry) => {
                entry.1 = body.to_string();
                Ok(())
            }
            None => bail!("comment '{}' not found on PR #{}", comment_id, number),
        }
    }

    fn open_in_browser(&self, number: u64) -> Result<()> {
        if !self.state.lock().unwrap().prs.contains_key(&number) {
            bail!("PR #{} not found", number);
        }
        Ok(())
    }
}

#[async_trait]
impl AsyncHost for MockHost {
    async fn batch_get_prs(&self, numbers: &[u64]) -> Vec<BatchPrStatus> {
        let state = self.state.lock().unwrap();
        numbers
            .iter()
            .filter_map(|number| {
                state.prs.get(number).map(|pr| BatchPrStatus {
                    number: *number,
                    state: pr.state,
                    is_merged: pr.state == PrState::Merged,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(head: &str, number: u64) -> PrSpec {
        PrSpec {
            number,
            title: "Add feature".to_string(),
            body: "Body text".to_string(),
            base: "main".to_string(),
            head: head.to_string(),
            draft: false,
        }
    }

    #[test]
    fn sync_pr_creates_new() {
        let host = MockHost::new();
        let record = host.sync_pr(&spec("feature-1", 0)).unwrap();
        assert_eq!(record.number, 1);
        assert_eq!(record.state, PrState::Open);
    }

    #[test]
    fn sync_pr_adopts_by_head() {
        let host = MockHost::new();
        let first = host.sync_pr(&spec("feature-1", 0)).unwrap();
        let second = host.sync_pr(&spec("feature-1", 0)).unwrap();
        assert_eq!(first.number, second.number);
    }

    #[test]
    fn sync_pr_rejects_merged() {
        let host = MockHost::new();
        let record = host.sync_pr(&spec("feature-1", 0)).unwrap();
        host.mark_merged(record.number);
        let err = host.sync_pr(&spec("feature-1", record.number)).unwrap_err();
        assert!(err.to_string().contains("already merged"));
    }

    #[test]
    fn mark_ready_and_draft_round_trip() {
        let host = MockHost::new();
        let record = host.sync_pr(&spec("feature-1", 0)).unwrap();
        host.mark_draft(record.number).unwrap();
        assert_eq!(host.get_pr(record.number).unwrap().state, PrState::Draft);
        host.mark_ready(record.number).unwrap();
        assert_eq!(host.get_pr(record.number).unwrap().state, PrState::Open);
    }

    #[test]
    fn comments_create_and_update() {
        let host = MockHost::new();
        let record = host.sync_pr(&spec("feature-1", 0)).unwrap();
        let id = host.create_comment(record.number, "hello").unwrap();
        host.update_comment(record.number, &id, "updated").unwrap();
        let comments = host.list_comments(record.number).unwrap();
        assert_eq!(comments, vec![(id, "updated".to_string())]);
    }
}
