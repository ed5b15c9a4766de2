//! Common types for the host (PR service) abstraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrState {
    Open,
    Draft,
    Closed,
    Merged,
}

impl fmt::Display for PrState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrState::Open => write!(f, "open"),
            PrState::Draft => write!(f, "draft"),
            PrState::Closed => write!(f, "closed"),
            PrState::Merged => write!(f, "merged"),
        }
    }
}

impl PrState {
    /// Normalize a host's raw state plus draft flag: the
    /// host returns uppercase states; `(OPEN, is_draft=true)` maps to `draft`.
    pub fn normalize(raw_state: &str, is_draft: bool) -> Self {
        match raw_state.to_uppercase().as_str() {
            "MERGED" => PrState::Merged,
            "CLOSED" => PrState::Closed,
            "OPEN" if is_draft => PrState::Draft,
            _ => PrState::Open,
        }
    }
}

/// Desired state for a PR, as computed by the push/sync engine.
#[derive(Debug, Clone)]
pub struct PrSpec {
    /// 0 means create-or-adopt; >0 means update this PR number.
    pub number: u64,
    pub title: String,
    pub body: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
}

/// A pull request record as understood by the engine after a sync.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrRecord {
    pub number: u64,
    pub url: String,
    pub state: PrState,
    pub title: String,
    pub body: String,
    pub base: String,
    pub head: String,
    pub draft: bool,
    /// Commit hash last pushed to this PR's head.
    pub last_pushed_commit: String,
    /// Cached ID of the bot-authored visualization comment, if any.
    pub comment_id: Option<String>,
}

/// Per-number status returned by a batch query, used by the refresh engine
/// to detect host-side merges without fetching full PR bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPrStatus {
    pub number: u64,
    pub state: PrState,
    pub is_merged: bool,
}

/// Basic info about the repository as seen by the host.
#[derive(Debug, Clone)]
pub struct RepoInfo {
    pub owner: String,
    pub name: String,
    pub default_branch: String,
}
