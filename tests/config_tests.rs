mod common;

use common::*;
use tempfile::tempdir;

#[test]
fn config_show_lists_all_sections() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["config", "show"]).unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Repository Configuration"));
    assert!(stdout.contains("Branch Configuration"));
    assert!(stdout.contains("Sync Configuration"));
    assert!(stdout.contains("Visualization Configuration"));
}

#[test]
fn config_set_and_get_user_scope() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let set = run_sk(dir.path(), &["config", "set", "branch.username", "bob"]).unwrap();
    assert!(set.status.success(), "{}", String::from_utf8_lossy(&set.stderr));

    let get = run_sk(dir.path(), &["config", "get", "branch.username"]).unwrap();
    assert!(get.status.success());
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "bob");
}

#[test]
fn config_set_local_scope_is_isolated_per_clone() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    run_sk(dir.path(), &["config", "set", "sync.staleness_threshold_secs", "30", "--local"]).unwrap();

    let local_config = dir.path().join(".git/stack/config.toml");
    assert!(local_config.exists());
    let content = std::fs::read_to_string(local_config).unwrap();
    assert!(content.contains("30"));
}

#[test]
fn config_set_repo_remote_writes_committed_file() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["config", "set", "repo.remote", "upstream"]).unwrap();
    assert!(output.status.success());

    let path = dir.path().join(".stack/config.toml");
    assert!(path.exists());
    let content = std::fs::read_to_string(path).unwrap();
    assert!(content.contains("upstream"));
}

#[test]
fn config_unset_clears_back_to_default() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    run_sk(dir.path(), &["config", "set", "viz.enabled", "false"]).unwrap();
    run_sk(dir.path(), &["config", "unset", "viz.enabled"]).unwrap();

    let get = run_sk(dir.path(), &["config", "get", "viz.enabled"]).unwrap();
    assert_eq!(String::from_utf8_lossy(&get.stdout).trim(), "true");
}

#[test]
fn config_rejects_unknown_keys() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();

    let output = run_sk(dir.path(), &["config", "get", "nonsense.key"]).unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown config key"));
}

#[test]
fn doctor_passes_on_a_freshly_installed_repo() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();

    let output = run_sk(dir.path(), &["doctor"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("all checks passed"));
}

#[test]
fn doctor_detects_missing_uuid_branch_and_fixes_it() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["new", "feature"]).unwrap();
    create_file_and_commit(dir.path(), "a.txt", "hello", "add a").unwrap();
    create_file_and_commit(dir.path(), "b.txt", "world", "add b").unwrap();

    run_sk(dir.path(), &["down"]).unwrap();
    let editing_branch = get_current_branch(dir.path()).unwrap();
    run_sk(dir.path(), &["top"]).unwrap();
    run_git(dir.path(), &["branch", "-D", &editing_branch]).unwrap();

    let output = run_sk(dir.path(), &["doctor"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("missing its tracking branch"));

    let fixed = run_sk(dir.path(), &["doctor", "--fix"]).unwrap();
    assert!(fixed.status.success(), "{}", String::from_utf8_lossy(&fixed.stdout));
    assert!(git_branch_exists(dir.path(), &editing_branch).unwrap());
}

#[test]
fn doctor_detects_uninstalled_hooks() {
    let dir = tempdir().unwrap();
    init_test_repo(dir.path()).unwrap();
    run_sk(dir.path(), &["uninstall"]).unwrap();

    let output = run_sk(dir.path(), &["doctor"]).unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("hooks are not installed"));
}
