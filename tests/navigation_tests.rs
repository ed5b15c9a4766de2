mod common;

use common::*;
use tempfile::tempdir;

fn two_change_stack(dir: &std::path::Path) {
    init_test_repo(dir).unwrap();
    run_sk(dir, &["new", "feature"]).unwrap();
    create_file_and_commit(dir, "a.txt", "hello", "add a").unwrap();
    create_file_and_commit(dir, "b.txt", "world", "add b").unwrap();
}

#[test]
fn down_checks_out_the_previous_change() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());

    let output = run_sk(dir.path(), &["down"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let branch = get_current_branch(dir.path()).unwrap();
    assert!(branch.starts_with("test-user/stack-feature/"));
    assert!(!branch.ends_with("/TOP"));
    assert_eq!(get_last_commit_message(dir.path()).unwrap(), "add a");
}

#[test]
fn down_at_bottom_stays_put() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let before = get_current_branch(dir.path()).unwrap();
    let output = run_sk(dir.path(), &["down"]).unwrap();
    assert!(output.status.success());
    assert_eq!(get_current_branch(dir.path()).unwrap(), before);
}

#[test]
fn up_from_editing_branch_returns_toward_top() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());

    run_sk(dir.path(), &["down"]).unwrap();
    let output = run_sk(dir.path(), &["up"]).unwrap();
    assert!(output.status.success());
    assert_eq!(get_current_branch(dir.path()).unwrap(), "test-user/stack-feature/TOP");
}

#[test]
fn top_returns_to_the_stack_branch() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());

    run_sk(dir.path(), &["down"]).unwrap();
    let output = run_sk(dir.path(), &["top"]).unwrap();
    assert!(output.status.success());
    assert_eq!(get_current_branch(dir.path()).unwrap(), "test-user/stack-feature/TOP");
}

#[test]
fn navigation_refuses_a_dirty_working_tree() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());
    std::fs::write(dir.path().join("untracked_dirty.txt"), "uncommitted").unwrap();
    run_git(dir.path(), &["add", "untracked_dirty.txt"]).unwrap();

    let output = run_sk(dir.path(), &["down"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).to_lowercase().contains("dirty"));
}

#[test]
fn amending_a_lower_change_rewrites_upper_changes() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());

    let top_before = get_commit_hash(dir.path(), "test-user/stack-feature/TOP").unwrap();

    run_sk(dir.path(), &["down"]).unwrap();
    std::fs::write(dir.path().join("a.txt"), "hello, amended").unwrap();
    run_git(dir.path(), &["add", "a.txt"]).unwrap();
    run_git(dir.path(), &["commit", "--amend", "--no-edit"]).unwrap();

    let top_after = get_commit_hash(dir.path(), "test-user/stack-feature/TOP").unwrap();
    assert_ne!(top_before, top_after, "amending the lower change should cascade onto the tip");

    let contents = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
    assert_eq!(contents, "hello, amended");
}

#[test]
fn fixup_requires_a_terminal() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());

    std::fs::write(dir.path().join("c.txt"), "staged").unwrap();
    run_git(dir.path(), &["add", "c.txt"]).unwrap();

    let output = run_sk(dir.path(), &["fixup"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Interactive"));
}

#[test]
fn fixup_off_the_top_is_rejected() {
    let dir = tempdir().unwrap();
    two_change_stack(dir.path());
    run_sk(dir.path(), &["down"]).unwrap();

    let output = run_sk(dir.path(), &["fixup"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("top of the stack"));
}
