//! Subprocess (`git` CLI) implementation of `GitBackend`.
//!
//! Slower than `Git2Backend` but works on reftable repositories and covers
//! operations libgit2 does not expose cleanly (interactive rebase, `--onto`).

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use super::{verbose_cmd, GitBackend, Oid, RefFormat};

pub struct SubprocessBackend {
    git_dir: PathBuf,
    workdir: PathBuf,
}

impl SubprocessBackend {
    pub fn open(path: &Path) -> Result<Self> {
        let workdir = run_in(path, &["rev-parse", "--show-toplevel"])?
            .trim()
            .to_string();
        let git_dir_rel = run_in(path, &["rev-parse", "--git-dir"])?.trim().to_string();
        let workdir = PathBuf::from(workdir);
        let git_dir = {
            let p = PathBuf::from(&git_dir_rel);
            if p.is_absolute() {
                p
            } else {
                workdir.join(p)
            }
        };

        Ok(Self { git_dir, workdir })
    }

    fn run(&self, args: &[&str]) -> Result<String> {
        run_in(&self.workdir, args)
    }

    fn run_allow_fail(&self, args: &[&str]) -> Result<Output> {
        verbose_cmd("git", args);
        Command::new("git")
            .current_dir(&self.workdir)
            .args(args)
            .output()
            .context("failed to spawn git")
    }
}

fn run_in(dir: &Path, args: &[&str]) -> Result<String> {
    verbose_cmd("git", args);
    let output = Command::new("git")
        .current_dir(dir)
        .args(args)
        .output()
        .context("failed to spawn git")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git {} failed: {}", args.join(" "), stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

impl GitBackend for SubprocessBackend {
    fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn ref_format(&self) -> RefFormat {
        super::detect_ref_format(&self.workdir).unwrap_or(RefFormat::Reftable)
    }

    fn get_current_branch(&self) -> Result<String> {
        let name = self.run(&["symbolic-ref", "--short", "HEAD"])?;
        let name = name.trim();
        if name.is_empty() {
            bail!("HEAD is detached");
        }
        Ok(name.to_string())
    }

    fn is_on_branch(&self) -> Result<bool> {
        Ok(self.run_allow_fail(&["symbolic-ref", "-q", "HEAD"])?.status.success())
    }

    fn create_branch(&self, name: &str) -> Result<()> {
        self.run(&["checkout", "-b", name])?;
        Ok(())
    }

    fn create_branch_at(&self, name: &str, at_ref: &str) -> Result<()> {
        self.run(&["branch", name, at_ref])?;
        Ok(())
    }

    fn branch_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .run_allow_fail(&["show-ref", "--verify", "--quiet", &format!("refs/heads/{}", name)])?
            .status
            .success())
    }

    fn checkout_branch(&self, name: &str) -> Result<()> {
        if self.branch_exists(name)? {
            self.run(&["checkout", name])?;
        } else {
            self.run(&["checkout", "-b", name, &format!("origin/{}", name)])?;
        }
        Ok(())
    }

    fn checkout_branch_force(&self, name: &str) -> Result<()> {
        if self.branch_exists(name)? {
            self.run(&["checkout", "--force", name])?;
        } else {
            self.run(&["checkout", "-b", name, &format!("origin/{}", name)])?;
        }
        Ok(())
    }

    fn list_branches(&self) -> Result<Vec<String>> {
        let out = self.run(&["branch", "--format=%(refname:short)"])?;
        Ok(out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
    }

    fn delete_branch(&self, name: &str) -> Result<()> {
        self.run(&["branch", "-D", name])?;
        Ok(())
    }

    fn rename_branch(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.run(&["branch", "-m", old_name, new_name])?;
        Ok(())
    }

    fn stage_all(&self) -> Result<()> {
        self.run(&["add", "-A"])?;
        Ok(())
    }

    fn stage_updates(&self) -> Result<()> {
        self.run(&["add", "-u"])?;
        Ok(())
    }

    fn stage_file(&self, path: &str) -> Result<()> {
        self.run(&["add", "--", path])?;
        Ok(())
    }

    fn commit(&self, message: &str) -> Result<()> {
        self.run(&["commit", "-m", message])?;
        Ok(())
    }

    fn amend_commit(&self, message: Option<&str>) -> Result<()> {
        match message {
            Some(msg) => {
                self.run(&["commit", "--amend", "-m", msg])?;
            }
            None => {
                self.run(&["commit", "--amend", "--no-edit"])?;
            }
        }
        Ok(())
    }

    fn create_commit(&self, parent: &Oid, tree: &Oid, message: &str) -> Result<Oid> {
        let out = self.run(&["commit-tree", tree.as_str(), "-p", parent.as_str(), "-m", message])?;
        Oid::from_str(out.trim())
    }

    fn cherry_pick_no_commit(&self, commit: &Oid) -> Result<()> {
        self.run(&["cherry-pick", "-n", commit.as_str()])?;
        Ok(())
    }

    fn create_reference(&self, name: &str, target: &Oid, force: bool, msg: &str) -> Result<()> {
        let mut args = vec!["update-ref", "-m", msg];
        if !force {
            args.push("--create-reflog");
        }
        args.push(name);
        args.push(target.as_str());
        self.run(&args)?;
        Ok(())
    }

    fn delete_reference(&self, name: &str) -> Result<()> {
        let out = self.run_allow_fail(&["update-ref", "-d", name])?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            if !stderr.contains("unable to resolve") && !stderr.contains("not found") {
                bail!("failed to delete reference '{}': {}", name, stderr.trim());
            }
        }
        Ok(())
    }

    fn find_reference(&self, name: &str) -> Result<Option<(String, Oid)>> {
        let out = self.run_allow_fail(&["rev-parse", "--verify", "-q", name])?;
        if !out.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
        Ok(Some((name.to_string(), Oid::from_str(&sha)?)))
    }

    fn list_references(&self, pattern: &str) -> Result<Vec<(String, Oid)>> {
        let out = self.run_allow_fail(&["for-each-ref", "--format=%(refname) %(objectname)", pattern])?;
        if !out.status.success() {
            return Ok(Vec::new());
        }
        let text = String::from_utf8_lossy(&out.stdout);
        let mut refs = Vec::new();
        for line in text.lines() {
            if let Some((name, sha)) = line.split_once(' ') {
                refs.push((name.to_string(), Oid::from_str(sha.trim())?));
            }
        }
        Ok(refs)
    }

    fn create_blob(&self, content: &[u8]) -> Result<Oid> {
        use std::io::Write;
        let mut child = Command::new("git")
            .current_dir(&self.workdir)
            .args(["hash-object", "-w", "--stdin"])
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .spawn()
            .context("failed to spawn git hash-object")?;

        child
            .stdin
            .take()
            .context("no stdin")?
            .write_all(content)
            .context("failed to write blob content")?;

        let output = child.wait_with_output().context("git hash-object failed")?;
        if !output.status.success() {
            bail!("git hash-object failed: {}", String::from_utf8_lossy(&output.stderr));
        }

        Oid::from_str(String::from_utf8_lossy(&output.stdout).trim())
    }

    fn read_blob(&self, oid: &Oid) -> Result<Vec<u8>> {
        let output = self.run_allow_fail(&["cat-file", "blob", oid.as_str()])?;
        if !output.status.success() {
            bail!("failed to read blob '{}'", oid.as_str());
        }
        Ok(output.stdout)
    }

    fn has_uncommitted_changes(&self) -> Result<bool> {
        let out = self.run(&["status", "--porcelain"])?;
        Ok(!out.trim().is_empty())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let result = self.run_allow_fail(&["diff", "--cached", "--quiet"])?;
        Ok(!result.status.success())
    }

    fn has_staged_or_modified_changes(&self) -> Result<bool> {
        let staged = self.run_allow_fail(&["diff", "--cached", "--quiet"])?;
        let modified = self.run_allow_fail(&["diff", "--quiet"])?;
        Ok(!staged.status.success() || !modified.status.success())
    }

    fn get_merge_base(&self, a: &str, b: &str) -> Result<Oid> {
        let out = self.run(&["merge-base", a, b])?;
        Oid::from_str(out.trim())
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        Ok(self
            .run_allow_fail(&["merge-base", "--is-ancestor", ancestor, descendant])?
            .status
            .success())
    }

    fn is_branch_merged(&self, branch: &str, into: &str) -> Result<bool> {
        self.is_ancestor(branch, into)
    }

    fn get_ref_sha(&self, reference: &str) -> Result<Oid> {
        let out = self.run(&["rev-parse", reference])?;
        Oid::from_str(out.trim())
    }

    fn get_short_sha(&self, reference: &str) -> Result<String> {
        let out = self.run(&["rev-parse", "--short", reference])?;
        Ok(out.trim().to_string())
    }

    fn get_commit_subject(&self, reference: &str) -> Result<String> {
        let out = self.run(&["log", "-1", "--format=%s", reference])?;
        Ok(out.trim().to_string())
    }

    fn get_commit_message(&self, reference: &str) -> Result<String> {
        let out = self.run(&["log", "-1", "--format=%B", reference])?;
        Ok(out.trim_end_matches('\n').to_string())
    }

    fn get_commit_time_relative(&self, reference: &str) -> Result<String> {
        let out = self.run(&["log", "-1", "--format=%cr", reference])?;
        Ok(out.trim().to_string())
    }

    fn get_commit_count_since(&self, base: &str) -> Result<usize> {
        let out = self.run(&["rev-list", "--count", &format!("{}..HEAD", base)])?;
        out.trim().parse().context("failed to parse commit count")
    }

    fn get_tree_oid(&self, commit: &Oid) -> Result<Oid> {
        let out = self.run(&["rev-parse", &format!("{}^{{tree}}", commit.as_str())])?;
        Oid::from_str(out.trim())
    }

    fn get_parent_oid(&self, commit: &Oid) -> Result<Option<Oid>> {
        let out = self.run_allow_fail(&["rev-parse", &format!("{}^", commit.as_str())])?;
        if !out.status.success() {
            return Ok(None);
        }
        let sha = String::from_utf8_lossy(&out.stdout).trim().to_string();
        Ok(Some(Oid::from_str(&sha)?))
    }
}
