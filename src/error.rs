//! Structured error kinds for the stack state engine.
//!
//! Command boundaries work in `anyhow::Result` (see `main.rs`), but the engine
//! itself raises these typed kinds so callers can branch on *what* went wrong
//! (e.g. `refresh` catching `OutOfOrderMerge` to print a two-line hint) rather
//! than matching on message text. Wrap with `.context(...)` for any additional
//! detail; `StackError`'s own `Display` is already user-facing.

use thiserror::Error;

/// Errors raised by the stack state engine.
///
/// Hooks never propagate these upward except `commit-msg` (see `hooks.rs`);
/// all other hooks print a warning and exit 0 regardless of error kind.
#[derive(Debug, Error)]
pub enum StackError {
    /// No stack context could be built for the current position.
    #[error("not currently on a stack. Run '{program} new <name>' or '{program} switch <name>' first.")]
    NotInStack { program: &'static str },

    /// Current branch doesn't match the stack/UUID branch grammar.
    #[error("'{branch}' is not a stack branch or a stack's UUID branch")]
    NotAStackBranch { branch: String },

    /// Uncommitted changes block a navigation or mutation operation.
    #[error("you have uncommitted changes. Commit or stash them first.")]
    DirtyWorkingTree,

    /// A rebase invoked by the engine hit a conflict; `RebaseState` is on disk.
    #[error(
        "conflict during rebase. Resolve the conflict, then run:\n  \
         git add <resolved files>\n  \
         git rebase --continue\n\
         Then run '{program} restack --recover' to finish."
    )]
    ConflictDuringRebase { program: &'static str },

    /// `refresh` saw a merged PR above an unmerged one.
    #[error("PR #{number} (stack position {position}) is merged, but an earlier PR in the stack is not. Merge PRs bottom-up.")]
    OutOfOrderMerge { number: u64, position: u32 },

    /// `push` detected a merge that the local stack hasn't accounted for.
    #[error("the stack is out of sync with a merge on the host. Run '{program} refresh' first.")]
    StackOutOfSync { program: &'static str },

    /// Caller tried to edit a PR the host reports as already merged.
    #[error("PR #{number} is already merged on the host")]
    AlreadyMerged { number: u64 },

    /// A commit in range is missing its identity trailer (hooks were bypassed).
    #[error("commit {commit} is missing a PR-UUID trailer (hooks may have been bypassed); refusing to rewrite it")]
    MissingIdentity { commit: String },

    /// The host adapter reported a transport/auth failure.
    #[error("host error: {0}")]
    HostError(String),

    /// Reading or writing the persistent store failed.
    #[error("failed to read or write stack metadata: {0}")]
    PersistenceError(String),

    /// A stack or branch name failed the naming grammar.
    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },
}
