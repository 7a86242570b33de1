// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Commit pipeline (spec.md §4.4), grounded on
//! `original_source/build/lib/src/core/services/git_commit_service.py`'s
//! `execute_commit`/`_validate_commit_message`.

use crate::error::GitError;
use crate::process::{run_git, working_tree_is_clean};
use nomad_core::OperationId;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const MIN_MESSAGE_LEN: usize = 5;
const MAX_SUBJECT_LEN: usize = 72;
const BLOCKED_MESSAGES: &[&str] = &["wip", "temp", "fix", "update", "change"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommitResult {
    Success,
    NoChanges,
    ValidationFailed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitOperation {
    pub operation_id: String,
    pub ticket_id: String,
    pub result: CommitResult,
    pub commit_hash: Option<String>,
    pub files_committed: Vec<String>,
    pub error: Option<String>,
}

/// Validate a commit message per spec.md §4.4: non-empty, at least 5
/// non-whitespace characters, first line at most 72 characters, and not one
/// of the low-effort blocklisted messages (case-insensitive, whole message).
pub fn validate_commit_message(message: &str) -> bool {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        return false;
    }
    if trimmed.len() < MIN_MESSAGE_LEN {
        return false;
    }
    let first_line = message.split('\n').next().unwrap_or("");
    if first_line.len() > MAX_SUBJECT_LEN {
        return false;
    }
    if BLOCKED_MESSAGES.contains(&trimmed.to_lowercase().as_str()) {
        return false;
    }
    true
}

/// Stage and commit the working tree, per spec.md §4.4's commit pipeline.
///
/// `file_paths` pins specific paths to stage; when `None` and
/// `stage_all_changes` is true, stages everything (`git add .`); when
/// `None` and `stage_all_changes` is false, commits whatever is already
/// staged without touching the index.
#[allow(clippy::too_many_arguments)]
pub fn execute_commit(
    repo_root: &Path,
    ticket_id: &str,
    commit_message: &str,
    file_paths: Option<&[String]>,
    stage_all_changes: bool,
    dry_run: bool,
) -> CommitOperation {
    let operation_id = OperationId::next("commit").to_string();
    let mut operation = CommitOperation {
        operation_id,
        ticket_id: ticket_id.to_string(),
        result: CommitResult::Failed,
        commit_hash: None,
        files_committed: Vec::new(),
        error: None,
    };

    if !crate::process::is_git_repository(repo_root, DEFAULT_TIMEOUT) {
        operation.result = CommitResult::ValidationFailed;
        operation.error = Some("not in a git repository".to_string());
        error!(ticket_id, "{}", operation.error.as_ref().unwrap());
        return operation;
    }

    let clean = match working_tree_is_clean(repo_root, DEFAULT_TIMEOUT) {
        Ok(clean) => clean,
        Err(e) => {
            operation.result = CommitResult::Failed;
            operation.error = Some(e.to_string());
            return operation;
        }
    };
    if clean {
        operation.result = CommitResult::NoChanges;
        operation.error = Some("no changes to commit".to_string());
        info!(ticket_id, "no changes to commit");
        return operation;
    }

    if !validate_commit_message(commit_message) {
        operation.result = CommitResult::ValidationFailed;
        operation.error = Some("invalid commit message format".to_string());
        error!(ticket_id, "{}", operation.error.as_ref().unwrap());
        return operation;
    }

    if dry_run {
        operation.result = CommitResult::Success;
        operation.error = Some("dry run completed successfully".to_string());
        info!(ticket_id, "dry run validation passed");
        return operation;
    }

    if let Err(e) = stage_files(repo_root, file_paths, stage_all_changes) {
        operation.result = CommitResult::Failed;
        operation.error = Some(format!("failed to stage files: {e}"));
        error!(ticket_id, "{}", operation.error.as_ref().unwrap());
        return operation;
    }

    match run_git(repo_root, &["commit", "-m", commit_message], DEFAULT_TIMEOUT) {
        Ok(output) if output.success => match current_commit_hash(repo_root) {
            Ok(hash) => {
                operation.files_committed = committed_files(repo_root, &hash).unwrap_or_default();
                operation.commit_hash = Some(hash);
                operation.result = CommitResult::Success;
                info!(ticket_id, hash = ?operation.commit_hash, "commit created");
            }
            Err(e) => {
                operation.result = CommitResult::Failed;
                operation.error = Some(format!("commit succeeded but hash lookup failed: {e}"));
            }
        },
        Ok(output) => {
            operation.result = CommitResult::Failed;
            operation.error = Some(format!("commit failed: {}", output.stderr));
            error!(ticket_id, "{}", operation.error.as_ref().unwrap());
        }
        Err(e) => {
            operation.result = CommitResult::Failed;
            operation.error = Some(e.to_string());
            error!(ticket_id, "{}", e);
        }
    }

    operation
}

fn stage_files(repo_root: &Path, file_paths: Option<&[String]>, stage_all: bool) -> Result<(), GitError> {
    if stage_all {
        let output = run_git(repo_root, &["add", "."], DEFAULT_TIMEOUT)?;
        return if output.success {
            Ok(())
        } else {
            Err(GitError::CommandFailed(output.stderr))
        };
    }
    if let Some(paths) = file_paths {
        if paths.is_empty() {
            return Ok(());
        }
        let mut args = vec!["add"];
        args.extend(paths.iter().map(String::as_str));
        let output = run_git(repo_root, &args, DEFAULT_TIMEOUT)?;
        return if output.success {
            Ok(())
        } else {
            Err(GitError::CommandFailed(output.stderr))
        };
    }
    Ok(())
}

fn current_commit_hash(repo_root: &Path) -> Result<String, GitError> {
    let output = run_git(repo_root, &["rev-parse", "HEAD"], DEFAULT_TIMEOUT)?;
    if output.success {
        Ok(output.stdout)
    } else {
        Err(GitError::CommandFailed(output.stderr))
    }
}

fn committed_files(repo_root: &Path, commit_hash: &str) -> Result<Vec<String>, GitError> {
    let output = run_git(
        repo_root,
        &["diff-tree", "--no-commit-id", "--name-only", "-r", commit_hash],
        DEFAULT_TIMEOUT,
    )?;
    if !output.success {
        return Ok(Vec::new());
    }
    Ok(output.stdout.lines().map(str::to_string).filter(|l| !l.is_empty()).collect())
}

/// Undo a commit with `git reset --soft <hash>^`, preserving working-tree
/// changes.
pub fn rollback_commit(repo_root: &Path, commit_hash: &str) -> CommitOperation {
    let operation_id = OperationId::next("rollback").to_string();
    let mut operation = CommitOperation {
        operation_id,
        ticket_id: format!("rollback-{}", &commit_hash[..commit_hash.len().min(8)]),
        result: CommitResult::Failed,
        commit_hash: Some(commit_hash.to_string()),
        files_committed: Vec::new(),
        error: None,
    };

    match run_git(repo_root, &["reset", "--soft", &format!("{commit_hash}^")], DEFAULT_TIMEOUT) {
        Ok(output) if output.success => {
            operation.result = CommitResult::Success;
            info!(commit_hash, "rollback successful");
        }
        Ok(output) => {
            operation.error = Some(format!("rollback failed: {}", output.stderr));
            error!(commit_hash, "{}", operation.error.as_ref().unwrap());
        }
        Err(e) => {
            operation.error = Some(e.to_string());
            error!(commit_hash, "{}", e);
        }
    }
    operation
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;

    fn init_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let run = |args: &[&str]| {
            let status = Command::new("git")
                .args(args)
                .current_dir(dir.path())
                .status()
                .expect("git available");
            assert!(status.success());
        };
        run(&["init", "-q"]);
        run(&["config", "user.email", "nomad@example.com"]);
        run(&["config", "user.name", "nomad"]);
        std::fs::write(dir.path().join("README.md"), b"hello").expect("write");
        run(&["add", "."]);
        run(&["commit", "-q", "-m", "initial commit"]);
        dir
    }

    #[test]
    fn validates_message_length_and_blocklist() {
        assert!(!validate_commit_message(""));
        assert!(!validate_commit_message("fix"));
        assert!(!validate_commit_message("WIP"));
        assert!(!validate_commit_message(&"x".repeat(80)));
        assert!(validate_commit_message("Add retry backoff to board client"));
    }

    #[test]
    fn no_changes_is_reported_not_errored() {
        let dir = init_repo();
        let op = execute_commit(dir.path(), "T-1", "Add retry backoff to client", None, true, false);
        assert_eq!(op.result, CommitResult::NoChanges);
    }

    #[test]
    fn commits_staged_changes_and_reports_hash() {
        let dir = init_repo();
        std::fs::write(dir.path().join("README.md"), b"hello world").expect("write");
        let op = execute_commit(dir.path(), "T-1", "Expand the readme content", None, true, false);
        assert_eq!(op.result, CommitResult::Success);
        assert!(op.commit_hash.is_some());
        assert_eq!(op.files_committed, vec!["README.md".to_string()]);
    }

    #[test]
    fn dry_run_does_not_commit() {
        let dir = init_repo();
        std::fs::write(dir.path().join("README.md"), b"hello world").expect("write");
        let op = execute_commit(dir.path(), "T-1", "Expand the readme content", None, true, true);
        assert_eq!(op.result, CommitResult::Success);
        assert!(op.commit_hash.is_none());
        assert!(!working_tree_is_clean(dir.path(), DEFAULT_TIMEOUT).unwrap());
    }

    #[test]
    fn invalid_message_fails_validation_before_staging() {
        let dir = init_repo();
        std::fs::write(dir.path().join("README.md"), b"hello world").expect("write");
        let op = execute_commit(dir.path(), "T-1", "wip", None, true, false);
        assert_eq!(op.result, CommitResult::ValidationFailed);
    }

    #[test]
    fn rollback_soft_resets_head() {
        let dir = init_repo();
        std::fs::write(dir.path().join("README.md"), b"hello world").expect("write");
        let commit = execute_commit(dir.path(), "T-1", "Expand the readme content", None, true, false);
        let hash = commit.commit_hash.expect("committed");

        let rollback = rollback_commit(dir.path(), &hash);
        assert_eq!(rollback.result, CommitResult::Success);
        assert!(!working_tree_is_clean(dir.path(), DEFAULT_TIMEOUT).unwrap());
    }
}
