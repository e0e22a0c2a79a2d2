//! Integration tests for gitwrapper
//!
//! These tests require git to be installed and skip themselves otherwise.
//! Every test works in its own temporary repository.

use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use gitwrapper::{CommitOptions, Git, GitExecutor, LogOptions};

/// Helper to check if git is available
async fn git_available() -> bool {
    GitExecutor::new().check_installed().await.is_ok()
}

/// Helper to create a test repository with one commit of README.md
async fn create_test_repo() -> (TempDir, Git) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().join("work");

    let git = Git::init_create(&repo_path, false, false).await.unwrap();

    // Configure git user for commits
    git.raw("config", &["user.email", "test@test.com"]).await.unwrap();
    git.raw("config", &["user.name", "Test User"]).await.unwrap();
    git.raw("config", &["commit.gpgsign", "false"]).await.unwrap();

    write_file(git.path(), "README.md", "# Test Repository\n").await;
    git.add(&["README.md"]).await.unwrap();
    git.commit(CommitOptions {
        message: Some("Initial commit"),
        ..Default::default()
    })
    .await
    .unwrap();

    (temp_dir, git)
}

async fn write_file(root: &Path, name: &str, content: &str) -> PathBuf {
    let path = root.join(name);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.unwrap();
    }
    tokio::fs::write(&path, content).await.unwrap();
    path
}

#[tokio::test]
async fn test_init_and_open() {
    if !git_available().await {
        return;
    }
    let temp_dir = TempDir::new().unwrap();

    let git = Git::init_create(temp_dir.path().join("plain"), false, false)
        .await
        .unwrap();
    assert!(!git.is_bare());
    assert!(gitwrapper::is_git_repository(git.path()));

    let bare = Git::init_create(temp_dir.path().join("shared.git"), true, false)
        .await
        .unwrap();
    assert!(bare.is_bare());
    assert_eq!(bare.gitdir(), bare.path());

    let reopened = Git::open(git.path()).unwrap();
    assert_eq!(reopened.gitdir(), git.gitdir());
}

#[tokio::test]
async fn test_discover_from_subdirectory() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    let subdir = git.path().join("nested/deeper");
    tokio::fs::create_dir_all(&subdir).await.unwrap();

    let found = Git::discover(&subdir).unwrap();
    assert_eq!(found.path(), git.path());
}

#[tokio::test]
async fn test_status_and_commit_cycle() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;
    assert!(git.is_clean().await.unwrap());

    let readme = write_file(git.path(), "README.md", "# Changed\n").await;
    let notes = write_file(git.path(), "notes.txt", "scratch\n").await;

    let entries = git.status(&[]).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].status, "M");
    assert_eq!(entries[0].path, "README.md");

    let full = git.status_full().await.unwrap();
    assert_eq!(full.unstaged, vec!["README.md"]);
    assert_eq!(full.untracked, vec!["notes.txt"]);

    // Absolute paths inside the repository are accepted
    git.add(&[readme.as_path()]).await.unwrap();
    let full = git.status_full().await.unwrap();
    assert_eq!(full.uncommitted, vec!["README.md"]);
    assert!(full.unstaged.is_empty());

    git.commit(CommitOptions {
        message: Some("Update readme"),
        update_all: true,
        ..Default::default()
    })
    .await
    .unwrap();
    assert!(!git.is_clean().await.unwrap());

    tokio::fs::remove_file(&notes).await.unwrap();
    assert!(git.is_clean().await.unwrap());

    let log = git.log(&[], LogOptions { oneline: true, count: 1 }).await.unwrap();
    assert!(log.contains("Update readme"));
    assert_eq!(git.commit_log("HEAD").await.unwrap(), "Update readme");
}

#[tokio::test]
async fn test_revisions_and_refs() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    let head = git.latest_commit(false).await.unwrap();
    assert_eq!(head.len(), 40);
    let short = git.latest_commit(true).await.unwrap();
    assert!(head.starts_with(&short));

    assert_eq!(git.rev_parse(&["HEAD"]).await.unwrap(), Some(head.clone()));
    assert_eq!(git.rev_parse(&["no-such-rev"]).await.unwrap(), None);

    git.branch(&["topic"]).await.unwrap();
    let mut heads = git.list_heads().await.unwrap();
    heads.sort();
    assert!(heads.contains(&"topic".to_string()));
    assert_eq!(git.show_ref("topic").await.unwrap().as_deref(), Some("refs/heads/topic"));
    assert_eq!(git.merge_base("HEAD", "topic").await.unwrap(), Some(head.clone()));

    git.branch_delete("topic").await.unwrap();
    assert_eq!(git.show_ref("topic").await.unwrap(), None);

    assert_eq!(git.rev_list(&["HEAD"]).await.unwrap(), vec![head]);
}

#[tokio::test]
async fn test_tags() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;
    assert_eq!(git.latest_tag().await.unwrap(), None);
    assert!(git.list_tags().await.unwrap().is_empty());
    assert!(git.list_refs("tags").await.unwrap().is_empty());

    git.raw("tag", &["v1.0"]).await.unwrap();
    assert_eq!(git.latest_tag().await.unwrap().as_deref(), Some("v1.0"));
    assert_eq!(git.list_tags().await.unwrap(), vec!["v1.0"]);

    git.remove_tag("v1.0").await.unwrap();
    assert!(git.list_tags().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_plumbing_commit() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    let empty = git.mktree_empty().await.unwrap();
    assert_eq!(empty, "4b825dc642cb6eb9a060e54bf8d69288fbee4904");

    let tree = git.write_tree().await.unwrap();
    let head = git.latest_commit(false).await.unwrap();
    let commit = git
        .commit_tree(&tree, "Plumbing commit\n", &[head.as_str()])
        .await
        .unwrap();
    assert_eq!(commit.len(), 40);
    assert_eq!(git.commit_log(&commit).await.unwrap(), "Plumbing commit");

    git.update_ref(&["refs/heads/plumbing", &commit]).await.unwrap();
    assert!(git.list_heads().await.unwrap().contains(&"plumbing".to_string()));

    git.remove_ref("heads/plumbing").await.unwrap();
    assert!(!git.list_heads().await.unwrap().contains(&"plumbing".to_string()));
}

#[tokio::test]
async fn test_changed_files() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;
    let first = git.latest_commit(false).await.unwrap();

    write_file(git.path(), "src/lib.rs", "pub fn f() {}\n").await;
    git.add(&["src/lib.rs"]).await.unwrap();
    assert_eq!(
        git.list_changed_files(first.as_str(), &[]).await.unwrap(),
        vec!["src/lib.rs"]
    );

    git.commit(CommitOptions {
        message: Some("Add lib"),
        ..Default::default()
    })
    .await
    .unwrap();
    assert_eq!(
        git.list_changed_files((first.as_str(), "HEAD"), &[]).await.unwrap(),
        vec!["src/lib.rs"]
    );
    assert_eq!(git.ls_files(&[]).await.unwrap(), vec!["README.md", "src/lib.rs"]);
}

#[tokio::test]
async fn test_stash_roundtrip() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    assert_eq!(git.stash().await.unwrap(), None);
    assert_eq!(git.stash_pop().await.unwrap(), None);

    write_file(git.path(), "README.md", "# Work in progress\n").await;
    assert!(git.stash().await.unwrap().is_some());
    assert!(git.is_clean().await.unwrap());

    assert!(git.stash_pop().await.unwrap().is_some());
    assert!(!git.is_clean().await.unwrap());
}

#[tokio::test]
async fn test_failed_command_reports_output() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    let err = git.checkout(&["no-such-branch"]).await.unwrap_err();
    assert!(err.is_command_failure());
    assert!(err.command_output().unwrap().contains("no-such-branch"));

    assert_eq!(git.raw("checkout", &["no-such-branch"]).await.unwrap(), Some(1));
}

#[tokio::test]
async fn test_concurrent_queries_share_handle() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;

    let results = futures::future::join_all((0..8).map(|_| {
        let git = git.clone();
        async move { git.latest_commit(true).await }
    }))
    .await;

    let first = results[0].as_ref().unwrap().clone();
    assert!(results.iter().all(|r| r.as_ref().unwrap() == &first));
}

#[tokio::test]
async fn test_remotes() {
    if !git_available().await {
        return;
    }
    let (_temp_dir, git) = create_test_repo().await;
    assert!(git.remotes().await.unwrap().is_empty());

    git.remote(&["add", "origin", "https://example.com/repo.git"])
        .await
        .unwrap();
    let remotes = git.remotes().await.unwrap();
    assert_eq!(
        remotes["origin"],
        vec![
            "https://example.com/repo.git (fetch)",
            "https://example.com/repo.git (push)"
        ]
    );
}
