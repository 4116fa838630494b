/// End-to-end stash lifecycle against a real git repository
use stashkeep::errors::{StashError, StashOperation};
use stashkeep::git::{FileStatus, GitCli, GitRepository, Repository, WorkingFileChange};
use stashkeep::stash::{CreateOutcome, DropOutcome, PopOutcome, StashManager, StashedFiles};
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn git(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("git should run");

    if !output.status.success() {
        panic!(
            "Git command failed: git {}\nStderr: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Create test git repository on `main` with one commit
fn create_test_repo() -> (TempDir, Repository) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path();

    for args in [
        vec!["init"],
        vec!["config", "user.name", "Test User"],
        vec!["config", "user.email", "test@example.com"],
        vec!["config", "commit.gpgsign", "false"],
        vec!["config", "core.autocrlf", "false"],
    ] {
        git(repo_path, &args);
    }

    std::fs::write(repo_path.join("README.md"), "# Test Repository\n").unwrap();
    git(repo_path, &["add", "."]);
    git(repo_path, &["commit", "-m", "Initial commit"]);
    git(repo_path, &["branch", "-M", "main"]);

    let repository = Repository::new(repo_path);
    (temp_dir, repository)
}

fn manager() -> StashManager<GitCli> {
    StashManager::new(GitCli::new())
}

fn modify_readme(repository: &Repository, content: &str) {
    std::fs::write(repository.path().join("README.md"), content).unwrap();
}

#[test]
fn test_fresh_repository_has_no_stashes() {
    let (_temp_dir, repository) = create_test_repo();

    let list = manager().list_entries(&repository).unwrap();
    assert!(list.owned_entries.is_empty());
    assert_eq!(list.total_entry_count, 0);
}

#[test]
fn test_create_and_classify() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    // a stash made by hand is counted but not owned
    modify_readme(&repository, "# manual\n");
    git(repository.path(), &["stash", "push", "-m", "by hand"]);

    modify_readme(&repository, "# ours\n");
    let outcome = manager.create(&repository, "main", &[]).unwrap();
    assert_eq!(outcome, CreateOutcome::Created);

    let list = manager.list_entries(&repository).unwrap();
    assert_eq!(list.total_entry_count, 2);
    assert_eq!(list.owned_entries.len(), 1);

    let entry = &list.owned_entries[0];
    assert_eq!(entry.name, "stash@{0}");
    assert_eq!(entry.branch_name, "main");
    assert_eq!(entry.parents.len(), 2);
    assert_eq!(entry.stash_sha, git(repository.path(), &["rev-parse", "stash@{0}"]).trim());
    assert_eq!(entry.files, StashedFiles::NotLoaded);
}

#[test]
fn test_create_without_changes() {
    let (_temp_dir, repository) = create_test_repo();

    let outcome = manager().create(&repository, "main", &[]).unwrap();
    assert_eq!(outcome, CreateOutcome::NoChanges);
    assert_eq!(manager().list_entries(&repository).unwrap().total_entry_count, 0);
}

#[test]
fn test_create_includes_untracked_files() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();
    std::fs::write(repository.path().join("notes.txt"), "draft\n").unwrap();

    let untracked = GitRepository::open(repository.path())
        .unwrap()
        .get_untracked_files()
        .unwrap();
    assert_eq!(untracked, vec![WorkingFileChange::untracked("notes.txt")]);

    let outcome = manager.create(&repository, "main", &untracked).unwrap();
    assert!(outcome.created());
    assert!(!repository.path().join("notes.txt").exists());

    let entry = manager
        .find_latest_owned_for_branch(&repository, "main")
        .unwrap()
        .unwrap();
    let entry = manager.load_files(&repository, &entry).unwrap();
    let StashedFiles::Loaded(files) = &entry.files else {
        panic!("files not loaded");
    };
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].path, "notes.txt");
    assert_eq!(files[0].status, FileStatus::Added);
    assert_eq!(files[0].additions, Some(1));
}

#[test]
fn test_latest_for_branch_is_newest() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "one\n");
    manager.create(&repository, "feature", &[]).unwrap();
    let older = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    modify_readme(&repository, "two\n");
    manager.create(&repository, "other", &[]).unwrap();
    modify_readme(&repository, "three\n");
    manager.create(&repository, "feature", &[]).unwrap();

    let latest = manager
        .find_latest_owned_for_branch(&repository, "feature")
        .unwrap()
        .unwrap();
    assert_ne!(latest.stash_sha, older.stash_sha);
    assert_eq!(latest.name, "stash@{0}");
    assert!(manager
        .find_latest_owned_for_branch(&repository, "missing")
        .unwrap()
        .is_none());
}

#[test]
fn test_move_changes_owner() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "moving\n");
    manager.create(&repository, "main", &[]).unwrap();
    let original = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    let new_sha = manager
        .move_to_branch(&repository, &original, "dev")
        .unwrap();

    let list = manager.list_entries(&repository).unwrap();
    assert_eq!(list.total_entry_count, 1);
    assert_eq!(list.owned_entries.len(), 1);

    let moved = &list.owned_entries[0];
    assert_eq!(moved.stash_sha, new_sha);
    assert_eq!(moved.branch_name, "dev");
    assert_eq!(moved.tree, original.tree);
    assert_eq!(moved.parents, original.parents);
    assert!(list.find_by_sha(&original.stash_sha).is_none());
}

#[test]
fn test_pop_restores_changes() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "restore me\n");
    manager.create(&repository, "main", &[]).unwrap();
    let entry = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    let outcome = manager.pop(&repository, &entry.stash_sha).unwrap();
    assert_eq!(outcome, PopOutcome::Popped);

    let content = std::fs::read_to_string(repository.path().join("README.md")).unwrap();
    assert_eq!(content, "restore me\n");
    assert_eq!(manager.list_entries(&repository).unwrap().total_entry_count, 0);

    // popping again finds nothing
    assert_eq!(
        manager.pop(&repository, &entry.stash_sha).unwrap(),
        PopOutcome::NotFound
    );
}

#[test]
fn test_conflicting_pop_drops_entry() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "stashed line\n");
    manager.create(&repository, "main", &[]).unwrap();
    let entry = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    // commit a different change to the same line
    modify_readme(&repository, "committed line\n");
    git(repository.path(), &["commit", "-am", "Conflicting change"]);

    let outcome = manager.pop(&repository, &entry.stash_sha).unwrap();
    assert_eq!(outcome, PopOutcome::PoppedWithConflicts);

    // git keeps a conflicted stash; it must be gone anyway
    assert_eq!(manager.list_entries(&repository).unwrap().total_entry_count, 0);
    let content = std::fs::read_to_string(repository.path().join("README.md")).unwrap();
    assert!(content.contains("<<<<<<<"));
    assert!(content.contains("stashed line"));
}

#[test]
fn test_pop_over_local_changes_keeps_entry() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "stashed line\n");
    manager.create(&repository, "main", &[]).unwrap();
    let entry = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    modify_readme(&repository, "uncommitted line\n");

    let err = manager.pop(&repository, &entry.stash_sha).unwrap_err();
    assert!(matches!(
        err,
        StashError::Mutation {
            operation: StashOperation::Pop,
            ..
        }
    ));
    assert!(err.command_failure().is_some_and(|f| !f.stderr.is_empty()));

    let list = manager.list_entries(&repository).unwrap();
    assert_eq!(list.total_entry_count, 1);
    assert!(list.find_by_sha(&entry.stash_sha).is_some());
    let content = std::fs::read_to_string(repository.path().join("README.md")).unwrap();
    assert_eq!(content, "uncommitted line\n");
}

#[test]
fn test_drop_uses_current_position() {
    let (_temp_dir, repository) = create_test_repo();
    let manager = manager();

    modify_readme(&repository, "first\n");
    manager.create(&repository, "main", &[]).unwrap();
    let first = manager.list_entries(&repository).unwrap().owned_entries[0].clone();

    // a newer stash shifts the first one to stash@{1}
    modify_readme(&repository, "second\n");
    git(repository.path(), &["stash", "push", "-m", "by hand"]);

    assert_eq!(
        manager.drop(&repository, &first.stash_sha).unwrap(),
        DropOutcome::Dropped
    );

    let list = manager.list_entries(&repository).unwrap();
    assert_eq!(list.total_entry_count, 1);
    assert!(list.owned_entries.is_empty());
    let remaining = git(repository.path(), &["stash", "list", "--format=%gs"]);
    assert_eq!(remaining.trim(), "On main: by hand");

    assert_eq!(
        manager.drop(&repository, &first.stash_sha).unwrap(),
        DropOutcome::AlreadyGone
    );
}
