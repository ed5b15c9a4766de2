//! Git backend abstraction for reftable compatibility.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                           Vcs                              │
//! │   (high-level operations: rebase, refresh, restack, etc.) │
//! │  ┌───────────────────────────────────────────────────┐   │
//! │  │              Box<dyn GitBackend>                    │   │
//! │  │  (low-level git operations: refs, blobs, branches) │   │
//! │  └───────────────────────────────────────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//!                             │
//!             ┌───────────────┴───────────────┐
//!             ▼                               ▼
//!    ┌────────────────┐             ┌────────────────────┐
//!    │  Git2Backend   │             │ SubprocessBackend  │
//!    │  (libgit2)     │             │ (git CLI)          │
//!    │ files-format   │             │ any format         │
//!    │ repos only     │             │ including reftable │
//!    └────────────────┘             └────────────────────┘
//! ```
//!
//! libgit2 doesn't support the reftable ref format (Git 2.45+) or rebase, so
//! the engine shells out to the `git` CLI for those operations regardless of
//! backend; `GitBackend` covers everything else, with `Git2Backend` preferred
//! when available for speed.

mod branch;
mod commit;
mod git2_backend;
mod rebase;
mod refs;
mod remote;
mod repo_config;
mod status;
mod subprocess_backend;

pub use git2_backend::Git2Backend;
pub use rebase::RebaseOutcome;
pub use remote::{BranchSyncState, SyncBranchResult};
pub use status::{ConflictType, ConflictedFile};
pub use subprocess_backend::SubprocessBackend;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::context::ExecutionContext;

/// Git ref storage format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefFormat {
    /// Traditional loose refs + packed-refs
    Files,
    /// Binary reftable format (Git 2.45+)
    Reftable,
}

/// Git object ID (40-character hex string).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(String);

impl Oid {
    pub fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.len() != 40 {
            anyhow::bail!("invalid OID length: expected 40, got {}", s.len());
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            anyhow::bail!("invalid OID: contains non-hex characters");
        }
        Ok(Self(s.to_lowercase()))
    }

    pub(crate) fn from_str_unchecked(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..7.min(self.0.len())]
    }

    pub fn to_git2(&self) -> Result<git2::Oid> {
        git2::Oid::from_str(&self.0).context("failed to parse OID")
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<git2::Oid> for Oid {
    fn from(oid: git2::Oid) -> Self {
        Self(oid.to_string())
    }
}

/// Unified backend for all low-level git operations.
pub trait GitBackend: Send {
    fn git_dir(&self) -> &Path;
    fn workdir(&self) -> &Path;
    fn ref_format(&self) -> RefFormat;

    fn get_current_branch(&self) -> Result<String>;
    fn is_on_branch(&self) -> Result<bool>;
    fn create_branch(&self, name: &str) -> Result<()>;
    fn create_branch_at(&self, name: &str, at_ref: &str) -> Result<()>;
    fn branch_exists(&self, name: &str) -> Result<bool>;
    fn checkout_branch(&self, name: &str) -> Result<()>;
    fn checkout_branch_force(&self, name: &str) -> Result<()>;
    fn list_branches(&self) -> Result<Vec<String>>;
    fn delete_branch(&self, name: &str) -> Result<()>;
    fn rename_branch(&self, old_name: &str, new_name: &str) -> Result<()>;

    fn stage_all(&self) -> Result<()>;
    fn stage_updates(&self) -> Result<()>;
    fn stage_file(&self, path: &str) -> Result<()>;
    fn commit(&self, message: &str) -> Result<()>;
    fn amend_commit(&self, message: Option<&str>) -> Result<()>;

    /// Create a new commit object with `message`, the given `tree`, and a
    /// single `parent`, without touching HEAD or any branch ref. Used by the
    /// Mutation Engine to rewrite a non-HEAD commit's message (e.g. injecting
    /// a `PR-UUID` trailer) while preserving its tree exactly.
    fn create_commit(&self, parent: &Oid, tree: &Oid, message: &str) -> Result<Oid>;

    /// Cherry-pick a commit's changes onto the index/working tree without
    /// committing, used by the restack engine to replay commits after a
    /// crash-recovered partial rebase.
    fn cherry_pick_no_commit(&self, commit: &Oid) -> Result<()>;

    fn create_reference(&self, name: &str, target: &Oid, force: bool, msg: &str) -> Result<()>;
    fn delete_reference(&self, name: &str) -> Result<()>;
    fn find_reference(&self, name: &str) -> Result<Option<(String, Oid)>>;
    fn list_references(&self, pattern: &str) -> Result<Vec<(String, Oid)>>;

    fn create_blob(&self, content: &[u8]) -> Result<Oid>;
    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>>;

    fn has_uncommitted_changes(&self) -> Result<bool>;
    fn has_staged_changes(&self) -> Result<bool>;
    fn has_staged_or_modified_changes(&self) -> Result<bool>;
    fn get_merge_base(&self, a: &str, b: &str) -> Result<Oid>;
    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool>;
    fn is_branch_merged(&self, branch: &str, into: &str) -> Result<bool>;

    fn get_ref_sha(&self, reference: &str) -> Result<Oid>;
    fn get_short_sha(&self, reference: &str) -> Result<String>;
    fn get_commit_subject(&self, reference: &str) -> Result<String>;
    fn get_commit_message(&self, reference: &str) -> Result<String>;
    fn get_commit_time_relative(&self, reference: &str) -> Result<String>;
    fn get_commit_count_since(&self, base: &str) -> Result<usize>;

    /// The tree OID of a commit, for identity-preserving rewrites.
    fn get_tree_oid(&self, commit: &Oid) -> Result<Oid>;
    /// The (first) parent OID of a commit, or `None` for a root commit.
    fn get_parent_oid(&self, commit: &Oid) -> Result<Option<Oid>>;
}

/// Detect the ref format of a repository.
pub fn detect_ref_format(path: &Path) -> Result<RefFormat> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-ref-format"])
        .current_dir(path)
        .output()
        .context("failed to detect ref format")?;

    if !output.status.success() {
        return Ok(RefFormat::Files);
    }

    let format = String::from_utf8_lossy(&output.stdout);
    match format.trim() {
        "reftable" => Ok(RefFormat::Reftable),
        _ => Ok(RefFormat::Files),
    }
}

/// Create the appropriate backend for a repository.
pub fn create_backend(path: &Path) -> Result<Box<dyn GitBackend>> {
    let format = detect_ref_format(path)?;

    match format {
        RefFormat::Reftable => Ok(Box::new(SubprocessBackend::open(path)?)),
        RefFormat::Files => match Git2Backend::open(path) {
            Ok(backend) => Ok(Box::new(backend)),
            Err(_) => Ok(Box::new(SubprocessBackend::open(path)?)),
        },
    }
}

/// Find the root of the current git working tree.
pub fn find_git_root() -> Result<PathBuf> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("failed to run git rev-parse --show-toplevel")?;

    if !output.status.success() {
        anyhow::bail!("not inside a git repository");
    }

    Ok(PathBuf::from(String::from_utf8_lossy(&output.stdout).trim()))
}

pub(crate) fn verbose_cmd(cmd: &str, args: &[&str]) {
    if ExecutionContext::is_verbose() {
        eprintln!("  {} git {} {}", "[cmd]".dimmed(), cmd, args.join(" "));
    }
}

/// Unified interface to git operations used by the stack engine.
///
/// Automatically detects the repository's ref format and uses either git2
/// (for "files" repos) or `git` CLI subprocess calls (for "reftable" repos,
/// and for any operation libgit2 itself can't perform, like rebase).
pub struct Vcs {
    backend: Box<dyn GitBackend>,
    pub(crate) git_dir: PathBuf,
    pub(crate) workdir: PathBuf,
    remote: String,
    format: RefFormat,
}

impl Vcs {
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Self::from_path(&cwd)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_path_with_remote(path, "origin".to_string())
    }

    pub fn from_path_with_remote<P: AsRef<Path>>(path: P, remote: String) -> Result<Self> {
        let path = path.as_ref();
        let backend = create_backend(path)?;
        let format = detect_ref_format(path)?;
        let (git_dir, workdir) = Self::get_paths(path)?;

        Ok(Self {
            backend,
            git_dir,
            workdir,
            remote,
            format,
        })
    }

    fn get_paths(path: &Path) -> Result<(PathBuf, PathBuf)> {
        let output = Command::new("git")
            .args(["rev-parse", "--git-dir"])
            .current_dir(path)
            .output()
            .context("failed to run git rev-parse --git-dir")?;

        if !output.status.success() {
            anyhow::bail!("not a git repository");
        }

        let git_dir_str = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let git_dir = if Path::new(&git_dir_str).is_absolute() {
            PathBuf::from(git_dir_str)
        } else {
            path.join(&git_dir_str)
        };

        let output = Command::new("git")
            .args(["rev-parse", "--show-toplevel"])
            .current_dir(path)
            .output()
            .context("failed to run git rev-parse --show-toplevel")?;

        if !output.status.success() {
            anyhow::bail!("not a working tree");
        }

        let workdir = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());

        Ok((git_dir, workdir))
    }

    pub fn ref_format(&self) -> RefFormat {
        self.format
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub fn backend(&self) -> &dyn GitBackend {
        self.backend.as_ref()
    }

    pub fn remote(&self) -> &str {
        &self.remote
    }

    pub fn has_remote(&self, remote_name: &str) -> Result<bool> {
        let output = Command::new("git")
            .args(["remote", "get-url", remote_name])
            .current_dir(&self.workdir)
            .output()
            .context("failed to run git remote get-url")?;
        Ok(output.status.success())
    }

    /// Resolve a reference (branch name, commit hash, etc.) to an OID.
    pub fn resolve_ref(&self, reference: &str) -> Result<Oid> {
        self.backend.get_ref_sha(reference)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn oid_from_str_validates_length_and_hex() {
        let hash = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2";
        assert_eq!(Oid::from_str(hash).unwrap().as_str(), hash);
        assert!(Oid::from_str("abc123").is_err());
        assert!(Oid::from_str("g1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2").is_err());
    }

    #[test]
    fn oid_short_takes_first_seven_chars() {
        let hash = "a1b2c3d4e5f6a1b2c3d4e5f6a1b2c3d4e5f6a1b2";
        assert_eq!(Oid::from_str(hash).unwrap().short(), "a1b2c3d");
    }
}
