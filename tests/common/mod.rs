use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Path to the built `sk` binary.
pub fn sk_binary() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("target");
    path.push("debug");
    path.push("sk");
    path
}

/// Initialize a git repo with an initial commit and install the hooks.
#[allow(dead_code)]
pub fn init_test_repo(dir: &Path) -> Result<()> {
    run_git(dir, &["init", "-b", "main"])?;
    run_git(dir, &["config", "user.name", "Test User"])?;
    run_git(dir, &["config", "user.email", "test@example.com"])?;
    run_git(dir, &["config", "core.editor", "true"])?;
    run_git(dir, &["config", "sequence.editor", "true"])?;

    fs::write(dir.join("README.md"), "# Test Repo")?;
    run_git(dir, &["add", "."])?;
    run_git(dir, &["commit", "-m", "Initial commit"])?;

    run_sk(dir, &["install"])?;
    Ok(())
}

/// Run `sk` with the given args, returning its output.
///
/// Points `HOME`/`XDG_CONFIG_HOME` at `<dir>/home` so user-level config
/// writes never touch the real developer machine running the tests.
pub fn run_sk(dir: &Path, args: &[&str]) -> Result<std::process::Output> {
    use std::process::Stdio;
    let home = dir.join("home");
    fs::create_dir_all(&home).ok();
    Ok(Command::new(sk_binary())
        .args(args)
        .current_dir(dir)
        .env("HOME", &home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .stdin(Stdio::null())
        .output()?)
}

#[allow(dead_code)]
pub fn run_git(dir: &Path, args: &[&str]) -> Result<std::process::Output> {
    Ok(Command::new("git").args(args).current_dir(dir).output()?)
}

#[allow(dead_code)]
pub fn get_current_branch(dir: &Path) -> Result<String> {
    let output = run_git(dir, &["branch", "--show-current"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[allow(dead_code)]
pub fn get_last_commit_message(dir: &Path) -> Result<String> {
    let output = run_git(dir, &["log", "-1", "--pretty=format:%s"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[allow(dead_code)]
pub fn git_branch_exists(dir: &Path, name: &str) -> Result<bool> {
    let output = run_git(dir, &["branch", "--list", name])?;
    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}

#[allow(dead_code)]
pub fn get_commit_hash(dir: &Path, branch: &str) -> Result<String> {
    let output = run_git(dir, &["rev-parse", branch])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[allow(dead_code)]
pub fn create_file_and_commit(dir: &Path, filename: &str, content: &str, message: &str) -> Result<()> {
    fs::write(dir.join(filename), content)?;
    run_git(dir, &["add", filename])?;
    run_git(dir, &["commit", "-m", message])?;
    Ok(())
}

#[allow(dead_code)]
pub fn git_rebase_in_progress(dir: &Path) -> Result<bool> {
    let git_dir = dir.join(".git");
    Ok(git_dir.join("rebase-merge").exists() || git_dir.join("rebase-apply").exists())
}

/// Path to the stack store root, `<dir>/.git/stack`.
#[allow(dead_code)]
pub fn store_root(dir: &Path) -> PathBuf {
    dir.join(".git").join("stack")
}

#[allow(dead_code)]
pub fn stack_json(dir: &Path, name: &str) -> Option<serde_json::Value> {
    let path = store_root(dir).join(name).join("stack.json");
    fs::read_to_string(path).ok().and_then(|s| serde_json::from_str(&s).ok())
}
