//! Host (code-review forge) abstraction.
//!
//! Wraps whatever PR service the repository's remote points at. The shipped
//! implementation drives the `gh` CLI; a `MockHost` backs tests. A
//! synchronous per-call surface plus an async trait for batched queries
//! used by the refresh engine.

pub mod github;
pub mod mock;
pub mod types;

pub use github::GitHubHost;
pub use mock::MockHost;
pub use types::{BatchPrStatus, PrRecord, PrSpec, PrState, RepoInfo};

use anyhow::Result;
use async_trait::async_trait;

use crate::error::StackError;

/// Typed operations over the PR host.
pub trait Host: Send + Sync {
    /// The CLI binary this implementation wraps, e.g. "gh".
    fn cli_name(&self) -> &str;

    /// Verify the CLI is installed and authenticated.
    fn check_auth(&self) -> Result<()>;

    /// Idempotent create-or-update. `spec.number == 0` means create, or
    /// adopt an existing PR whose head matches `spec.head` if creation
    /// reports "already exists". `spec.number > 0` means update that PR.
    ///
    /// Returns `AlreadyMerged` if the target PR is merged on the host.
    fn sync_pr(&self, spec: &PrSpec) -> Result<PrRecord>;

    fn get_repo_info(&self) -> Result<RepoInfo>;

    /// Mark a PR ready for review (no-op if already ready).
    fn mark_ready(&self, number: u64) -> Result<()>;

    /// Mark a PR as draft (no-op if already draft).
    fn mark_draft(&self, number: u64) -> Result<()>;

    /// List comment IDs and bodies on a PR.
    fn list_comments(&self, number: u64) -> Result<Vec<(String, String)>>;

    /// Create a comment, returning its ID.
    fn create_comment(&self, number: u64, body: &str) -> Result<String>;

    /// Replace the body of an existing comment.
    fn update_comment(&self, number: u64, comment_id: &str, body: &str) -> Result<()>;

    fn open_in_browser(&self, number: u64) -> Result<()>;
}

/// Batch-query extension used by the refresh engine, one request for all
/// active PR numbers instead of one call per PR.
#[async_trait]
pub trait AsyncHost: Host {
    /// Fetch `{state, is_merged}` for a set of PR numbers. Implementations
    /// should use a single batched request where the host API allows it;
    /// the default falls back to one call per number, run concurrently.
    async fn batch_get_prs(&self, numbers: &[u64]) -> Vec<BatchPrStatus>;
}

pub(crate) fn host_err<E: std::fmt::Display>(e: E) -> StackError {
    StackError::HostError(e.to_string())
}
