mod common;

use common::*;
use tempfile::tempdir;

#[test]
fn push_without_a_host_cli_fails_cleanly() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let output = run_sk(dir.path(), &["push"]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn ready_on_an_unpushed_change_succeeds_without_a_host() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let output = run_sk(dir.path(), &["draft"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = run_sk(dir.path(), &["ready"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn refresh_without_a_host_cli_fails_cleanly() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let output = run_sk(dir.path(), &["refresh"]).unwrap();
    assert!(!output.status.success());
}

#[test]
fn restack_onto_base_with_no_upstream_changes_is_a_noop_rebase() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    let before = get_commit_hash(dir.path(), "test-user/stack-feature/TOP").unwrap();
    let output = run_sk(dir.path(), &["restack", "--onto", "main"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let after = get_commit_hash(dir.path(), "test-user/stack-feature/TOP").unwrap();
    assert_eq!(before, after, "rebasing onto an unchanged base should be a no-op");
}

#[test]
fn restack_replays_commits_after_base_moves() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();

    run_git(dir.path(), &["checkout", "main"]).unwrap();
    create_file_and_commit(dir.path(), "upstream.txt", "new on main", "upstream change").unwrap();
    run_sk(dir.path(), &["switch", "feature"]).unwrap();

    let output = run_sk(dir.path(), &["restack", "--onto", "main"]).unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let log = run_git(dir.path(), &["log", "--oneline", "test-user/stack-feature/TOP"]).unwrap();
    let log = String::from_utf8_lossy(&log.stdout);
    assert!(log.contains("upstream change"));
    assert!(log.contains("add a"));
}
