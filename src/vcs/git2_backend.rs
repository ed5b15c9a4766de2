//! Git2 (libgit2) implementation of `GitBackend`.
//!
//! Fast, native git operations. Only works on repositories using the
//! "files" ref format.

use anyhow::{Context, Result};
use git2::{BranchType, IndexAddOption, Repository, Signature};
use std::path::{Path, PathBuf};

use super::{GitBackend, Oid, RefFormat};

pub struct Git2Backend {
    repo: Repository,
    git_dir: PathBuf,
    workdir: PathBuf,
}

impl Git2Backend {
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::discover(path).context("failed to open git repository with git2")?;

        let git_dir = repo.path().to_path_buf();
        let workdir = repo.workdir().context("not a work tree")?.to_path_buf();

        Ok(Self { repo, git_dir, workdir })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    fn signature(&self) -> Result<Signature<'_>> {
        self.repo
            .signature()
            .or_else(|_| Signature::now("stack", "stack@local"))
            .context("failed to create signature")
    }
}

impl GitBackend for Git2Backend {
    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn ref_format(&self) -> RefFormat {
        RefFormat::Files
    }

    fn get_current_branch(&self) -> Result<String> {
        let head = self.repo.head().context("failed to get HEAD")?;
        if !head.is_branch() {
            anyhow::bail!("HEAD is detached");
        }
        head.shorthand().map(|s| s.to_string()).context("branch name is not valid UTF-8")
    }

    fn is_on_branch(&self) -> Result<bool> {
        match self.repo.head() {
            Ok(head) => Ok(head.is_branch()),
            Err(_) => Ok(false),
        }
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        let head = self.repo.head().context("failed to get HEAD")?;
        let commit = head.peel_to_commit().context("failed to get HEAD commit")?;

        self.repo
            .branch(name, &commit, false)
            .context(format!("failed to create branch '{}'", name))?;

        let refname = format!("refs/heads/{}", name);
        self.repo
            .set_head(&refname)
            .context(format!("failed to set HEAD to '{}'", name))?;

        Ok(())
    }

    fn create_branch_at(&self, name: &str, at_ref: &str) -> Result<()> {
        let reference = self
            .repo
            .find_reference(&format!("refs/heads/{}", at_ref))
            .or_else(|_| self.repo.find_reference(at_ref))
            .context(format!("failed to find ref '{}'", at_ref))?;

        let commit = reference.peel_to_commit().context("failed to get commit for ref")?;

        self.repo
            .branch(name, &commit, false)
            .context(format!("failed to create branch '{}' at '{}'", name, at_ref))?;

        Ok(())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self.repo.find_branch(name, BranchType::Local).is_ok())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let commit = if let Ok(reference) = self.repo.find_reference(&refname) {
            reference.peel_to_commit().context("failed to peel reference to commit")?
        } else {
            let remote_refname = format!("refs/remotes/origin/{}", name);
            let remote_ref = self
                .repo
                .find_reference(&remote_refname)
                .with_context(|| format!("branch '{}' not found", name))?;
            let commit = remote_ref
                .peel_to_commit()
                .context("failed to peel remote reference to commit")?;
            self.repo
                .branch(name, &commit, false)
                .context(format!("failed to create local branch '{}' from remote", name))?;
            commit
        };

        let tree = commit.tree().context("failed to get commit tree")?;

        let mut checkout_builder = git2::build::CheckoutBuilder::new();
        checkout_builder.safe().recreate_missing(true);

        self.repo
            .checkout_tree(tree.as_object(), Some(&mut checkout_builder))
            .context("failed to checkout tree")?;

        self.repo
            .set_head(&refname)
            .context(format!("failed to set HEAD to '{}'", name))?;

        Ok(())
    }

    fn checkout_branch_force(&self, name: &str) -> Result<()> {
        let refname = format!("refs/heads/{}", name);
        let commit = if let Ok(reference) = self.repo.find_reference(&refname) {
            let commit = reference.peel_to_commit().context("failed to peel reference to commit")?;
            self.repo
                .set_head(&refname)
                .context(format!("failed to set HEAD to '{}'", name))?;
            commit
        } else {
            let remote_refname = format!("refs/remotes/origin/{}", name);
            let remote_ref = self
                .repo
                .find_reference(&remote_refname)
                .with_context(|| format!("branch '{}' not found locally or in remote", name))?;
            let commit = remote_ref
                .peel_to_commit()
                .context("failed to peel remote ref to commit")?;
            self.repo
                .branch(name, &commit, false)
                .context(format!("failed to create local branch '{}'", name))?;
            self.repo
                .set_head(&refname)
                .context(format!("failed to set HEAD to '{}'", name))?;
            commit
        };

        let mut checkout_opts = git2::build::CheckoutBuilder::new();
        checkout_opts.force();

        self.repo
            .reset(commit.as_object(), git2::ResetType::Hard, Some(&mut checkout_opts))
            .context("failed to checkout branch")?;

        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let mut branches = Vec::new();
        for branch in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = branch?;
            if let Some(name) = branch.name()? {
                branches.push(name.to_string());
            }
        }
        Ok(branches)
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(name, BranchType::Local)
            .context(format!("branch '{}' not found", name))?;
        branch.delete().context(format!("failed to delete branch '{}'", name))?;
        Ok(())
    }

    fn rename_branch(&self, old_name: &str, new_name: &str) -> Result<()> {
        let mut branch = self
            .repo
            .find_branch(old_name, BranchType::Local)
            .context(format!("branch '{}' not found", old_name))?;
        branch
            .rename(new_name, false)
            .context(format!("failed to rename '{}' to '{}'", old_name, new_name))?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        let mut index = self.repo.index().context("failed to get index")?;
        index
            .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
            .context("failed to stage all files")?;
        index.write().context("failed to write index")?;
        Ok(())
    }

    fn stage_updates(&self) -> Result<()> {
        let mut index = self.repo.index().context("failed to get index")?;
        index.update_all(["*"].iter(), None).context("failed to stage updates")?;
        index.write().context("failed to write index")?;
        Ok(())
    }

    fn stage_file(&self, path: &str) -> Result<()> {
        let mut index = self.repo.index().context("failed to get index")?;
        index
            .add_path(Path::new(path))
            .context(format!("failed to stage '{}'", path))?;
        index.write().context("failed to write index")?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        let sig = self.signature()?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let head = self.repo.head()?;
        let parent = head.peel_to_commit()?;

        self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;

        Ok(())
    }

    fn amend_commit(&self, message: Option<&str>) -> Result<()> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;

        let sig = self.signature()?;
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        let msg = message.unwrap_or_else(|| commit.message().unwrap_or(""));

        commit.amend(Some("HEAD"), Some(&sig), Some(&sig), None, Some(msg), Some(&tree))?;

        Ok(())
    }

    fn create_commit(&self, parent: &Oid, tree: &Oid, message: &str) -> Result<Oid> {
        let sig = self.signature()?;
        let parent_commit = self.repo.find_commit(parent.to_git2()?).context("parent commit not found")?;
        let tree_obj = self.repo.find_tree(tree.to_git2()?).context("tree not found")?;

        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree_obj, &[&parent_commit])
            .context("failed to create commit object")?;

        Ok(Oid::from(oid))
    }

    fn cherry_pick_no_commit(&self, commit: &Oid) -> Result<()> {
        let git_commit = self.repo.find_commit(commit.to_git2()?).context("commit not found")?;
        let mut opts = git2::CherrypickOptions::new();
        self.repo
            .cherrypick(&git_commit, Some(&mut opts))
            .context("failed to cherry-pick commit")?;
        Ok(())
    }

    fn create_reference(&self, name: &str, target: &Oid, force: bool, msg: &str) -> Result<()> {
        let oid = git2::Oid::from_str(target.as_str()).context("invalid OID")?;
        self.repo
            .reference(name, oid, force, msg)
            .context(format!("failed to create reference '{}'", name))?;
        Ok(())
    }

    fn delete_reference(&self, name: &str) -> Result<()> {
        match self.repo.find_reference(name) {
            Ok(mut reference) => {
                reference.delete().context(format!("failed to delete reference '{}'", name))?;
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => {}
            Err(e) => return Err(e).context(format!("failed to find reference '{}'", name)),
        }
        Ok(())
    }

    fn find_reference(&self, name: &str) -> Result<Option<(String, Oid)>> {
        match self.repo.find_reference(name) {
            Ok(reference) => {
                let oid = reference.target().context("reference has no target")?;
                Ok(Some((name.to_string(), Oid::from(oid))))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_references(&self, pattern: &str) -> Result<Vec<(String, Oid)>> {
        let mut refs = Vec::new();
        for reference in self.repo.references_glob(pattern)? {
            let reference = reference?;
            if let (Some(name), Some(oid)) = (reference.name(), reference.target()) {
                refs.push((name.to_string(), Oid::from(oid)));
            }
        }
        Ok(refs)
    }

    fn create_blob(&self, content: &[u8]) -> Result<Oid> {
        let oid = self.repo.blob(content).context("failed to create blob")?;
        Ok(Oid::from(oid))
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>> {
        let git_oid = git2::Oid::from_str(oid.as_str()).context("invalid OID")?;
        let blob = self.repo.find_blob(git_oid).context("failed to find blob")?;
        Ok(blob.content().to_vec())
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_ignored(false).include_untracked(true);
        let statuses = self.repo.statuses(Some(&mut opts)).context("failed to get status")?;
        Ok(!statuses.is_empty())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        for entry in statuses.iter() {
            if entry.status().intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE,
            ) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn has_staged_or_modified_changes(&self) -> Result<bool> {
        let mut opts = git2::StatusOptions::new();
        opts.include_ignored(false);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        for entry in statuses.iter() {
            if entry.status().intersects(
                git2::Status::INDEX_NEW
                    | git2::Status::INDEX_MODIFIED
                    | git2::Status::INDEX_DELETED
                    | git2::Status::INDEX_RENAMED
                    | git2::Status::INDEX_TYPECHANGE
                    | git2::Status::WT_MODIFIED
                    | git2::Status::WT_DELETED
                    | git2::Status::WT_RENAMED
                    | git2::Status::WT_TYPECHANGE,
            ) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn get_merge_base(&self, a: &str, b: &str) -> Result<Oid> {
        let oid_a = self.get_ref_sha(a)?.to_git2()?;
        let oid_b = self.get_ref_sha(b)?.to_git2()?;
        let merge_base = self.repo.merge_base(oid_a, oid_b).context("failed to find merge base")?;
        Ok(Oid::from(merge_base))
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        let oid_ancestor = self.get_ref_sha(ancestor)?.to_git2()?;
        let oid_descendant = self.get_ref_sha(descendant)?.to_git2()?;
        match self.repo.merge_base(oid_ancestor, oid_descendant) {
            Ok(merge_base) => Ok(merge_base == oid_ancestor),
            Err(_) => Ok(false),
        }
    }

    fn is_branch_merged(&self, branch: &str, into: &str) -> Result<bool> {
        self.is_ancestor(branch, into)
    }

    fn get_ref_sha(&self, reference: &str) -> Result<Oid> {
        if let Ok(branch) = self.repo.find_branch(reference, BranchType::Local) {
            let commit = branch.get().peel_to_commit()?;
            return Ok(Oid::from(commit.id()));
        }

        if let Ok(git_ref) = self.repo.find_reference(reference) {
            let commit = git_ref.peel_to_commit()?;
            return Ok(Oid::from(commit.id()));
        }

        if let Ok(oid) = git2::Oid::from_str(reference) {
            if self.repo.find_commit(oid).is_ok() {
                return Ok(Oid::from(oid));
            }
        }

        let obj = self
            .repo
            .revparse_single(reference)
            .context(format!("failed to resolve '{}'", reference))?;
        let commit = obj.peel_to_commit()?;
        Ok(Oid::from(commit.id()))
    }

    fn get_short_sha(&self, reference: &str) -> Result<String> {
        Ok(self.get_ref_sha(reference)?.short().to_string())
    }

    fn get_commit_subject(&self, reference: &str) -> Result<String> {
        let git_oid = self.get_ref_sha(reference)?.to_git2()?;
        let commit = self.repo.find_commit(git_oid)?;
        let message = commit.message().unwrap_or("");
        Ok(message.lines().next().unwrap_or("").to_string())
    }

    fn get_commit_message(&self, reference: &str) -> Result<String> {
        let git_oid = self.get_ref_sha(reference)?.to_git2()?;
        let commit = self.repo.find_commit(git_oid)?;
        Ok(commit.message().unwrap_or("").to_string())
    }

    fn get_commit_time_relative(&self, reference: &str) -> Result<String> {
        let git_oid = self.get_ref_sha(reference)?.to_git2()?;
        let commit = self.repo.find_commit(git_oid)?;

        let time = commit.time();
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64;

        let diff = now - time.seconds();

        if diff < 60 {
            Ok("just now".to_string())
        } else if diff < 3600 {
            let mins = diff / 60;
            Ok(format!("{} minute{} ago", mins, if mins == 1 { "" } else { "s" }))
        } else if diff < 86400 {
            let hours = diff / 3600;
            Ok(format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" }))
        } else if diff < 604800 {
            let days = diff / 86400;
            Ok(format!("{} day{} ago", days, if days == 1 { "" } else { "s" }))
        } else {
            let weeks = diff / 604800;
            Ok(format!("{} week{} ago", weeks, if weeks == 1 { "" } else { "s" }))
        }
    }

    fn get_commit_count_since(&self, base: &str) -> Result<usize> {
        let git_base_oid = self.get_ref_sha(base)?.to_git2()?;

        let head = self.repo.head()?;
        let head_commit = head.peel_to_commit()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head_commit.id())?;
        revwalk.hide(git_base_oid)?;

        Ok(revwalk.count())
    }

    fn get_tree_oid(&self, commit: &Oid) -> Result<Oid> {
        let git_commit = self.repo.find_commit(commit.to_git2()?).context("commit not found")?;
        Ok(Oid::from(git_commit.tree_id()))
    }

    fn get_parent_oid(&self, commit: &Oid) -> Result<Option<Oid>> {
        let git_commit = self.repo.find_commit(commit.to_git2()?).context("commit not found")?;
        Ok(git_commit.parent_id(0).ok().map(Oid::from))
    }
}
