mod common;

use common::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn install_writes_hooks_and_is_idempotent() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    for hook in ["prepare-commit-msg", "commit-msg", "post-commit"] {
        let path = dir.path().join(".git/hooks").join(hook);
        assert!(path.exists(), "expected hook {hook} to be installed");
    }

    let output = run_sk(dir.path(), &["install"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("already installed"));
}

#[test]
fn new_creates_stack_branch_and_descriptor() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["new", "feature"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    assert!(git_branch_exists(dir.path(), "test-user/stack-feature/TOP").unwrap());
    assert_eq!(get_current_branch(dir.path()).unwrap(), "test-user/stack-feature/TOP");

    let descriptor = stack_json(dir.path(), "feature").expect("stack.json should exist");
    assert_eq!(descriptor["name"], "feature");
    assert_eq!(descriptor["username"], "test-user");
    assert_eq!(descriptor["base"], "main");
}

#[test]
fn new_rejects_duplicate_stack_name() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    run_sk(dir.path(), &["new", "feature"]).unwrap();
    let output = run_sk(dir.path(), &["new", "feature"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
}

#[test]
fn list_marks_the_current_stack() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    run_sk(dir.path(), &["new", "alpha"]).unwrap();
    run_git(dir.path(), &["checkout", "main"]).unwrap();
    run_sk(dir.path(), &["new", "beta"]).unwrap();

    let output = run_sk(dir.path(), &["list"]).unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("alpha"));
    assert!(stdout.contains("beta"));
    assert!(stdout.contains('*'));
}

#[test]
fn switch_checks_out_the_named_stack() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    run_sk(dir.path(), &["new", "alpha"]).unwrap();
    run_git(dir.path(), &["checkout", "main"]).unwrap();
    run_sk(dir.path(), &["new", "beta"]).unwrap();

    let output = run_sk(dir.path(), &["switch", "alpha"]).unwrap();
    assert!(output.status.success());
    assert_eq!(get_current_branch(dir.path()).unwrap(), "test-user/stack-alpha/TOP");
}

#[test]
fn switch_to_unknown_stack_fails() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["switch", "nope"]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn commit_on_stack_branch_gets_identity_trailers() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();

    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let message = get_last_commit_message(dir.path()).unwrap();
    assert_eq!(message, "add a");

    let full = run_git(dir.path(), &["log", "-1", "--pretty=format:%B"]).unwrap();
    let full = String::from_utf8_lossy(&full.stdout);
    assert!(full.contains("PR-UUID:"));
    assert!(full.contains("PR-Stack: feature"));
}

#[test]
fn commit_off_stack_is_left_untouched() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    create_file_and_commit(dir.path(), "a.txt", "hello", "plain commit").unwrap();

    let full = run_git(dir.path(), &["log", "-1", "--pretty=format:%B"]).unwrap();
    let full = String::from_utf8_lossy(&full.stdout);
    assert!(!full.contains("PR-UUID:"));
}

#[test]
fn status_reports_active_changes() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();
    create_file_and_commit(dir.path(), "b.txt", "world", "add b").unwrap();

    let output = run_sk(dir.path(), &["status"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("add a"));
    assert!(stdout.contains("add b"));
    assert!(stdout.contains("not pushed"));
}

#[test]
fn show_lists_uuid_and_base_per_change() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let output = run_sk(dir.path(), &["show"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("add a"));
    assert!(stdout.contains("uuid"));
}

#[test]
fn uninstall_removes_our_hooks() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["uninstall"]).unwrap();
    assert!(output.status.success());
    for hook in ["prepare-commit-msg", "commit-msg", "post-commit"] {
        assert!(!dir.path().join(".git/hooks").join(hook).exists());
    }
}

#[test]
fn status_table_renders_the_stack_viz() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let output = run_sk(dir.path(), &["status", "--table"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("add a"));
}

#[test]
fn completion_emits_a_shell_script() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["completion", "bash"]).unwrap();
    assert!(output.status.success());
    assert!(!output.stdout.is_empty());
}

#[test]
fn list_with_no_stacks_hints_at_new() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["list"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("new <name>"));
}

#[test]
fn uninstall_leaves_foreign_hooks_alone() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let foreign = dir.path().join(".git/hooks/pre-push");
    fs::write(&foreign, "#!/bin/sh\necho custom\n").unwrap();

    run_sk(dir.path(), &["uninstall"]).unwrap();
    assert!(foreign.exists());
}
