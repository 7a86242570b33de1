// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Subprocess invocation helper, grounded on
//! `EffortlessMetrics-shipper/crates/shipper/src/git.rs`'s
//! `Command::new(...).arg(...).current_dir(...).output()` pattern, extended
//! with a hard wall-clock timeout since git commit/checkout can hang.

use crate::error::GitError;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

pub struct GitOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

fn git_program() -> &'static str {
    "git"
}

/// Run `git <args>` in `repo_root`, killing it if it runs past `timeout`.
pub fn run_git(repo_root: &Path, args: &[&str], timeout: Duration) -> Result<GitOutput, GitError> {
    let mut child = Command::new(git_program())
        .args(args)
        .current_dir(repo_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()?;

    let started = Instant::now();
    loop {
        match child.try_wait()? {
            Some(_) => break,
            None => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GitError::Timeout(timeout));
                }
                std::thread::sleep(Duration::from_millis(25));
            }
        }
    }

    let output = child.wait_with_output()?;
    Ok(GitOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).trim().to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// True if `repo_root` (or an ancestor) is inside a git working tree.
pub fn is_git_repository(repo_root: &Path, timeout: Duration) -> bool {
    run_git(repo_root, &["rev-parse", "--is-inside-work-tree"], timeout)
        .map(|o| o.success && o.stdout == "true")
        .unwrap_or(false)
}

/// True if the working tree has no staged or unstaged changes.
pub fn working_tree_is_clean(repo_root: &Path, timeout: Duration) -> Result<bool, GitError> {
    let status = run_git(repo_root, &["status", "--porcelain"], timeout)?;
    Ok(status.stdout.trim().is_empty())
}

pub fn local_branch_exists(repo_root: &Path, branch: &str, timeout: Duration) -> Result<bool, GitError> {
    let out = run_git(
        repo_root,
        &["show-ref", "--verify", "--quiet", &format!("refs/heads/{branch}")],
        timeout,
    )?;
    Ok(out.success)
}

pub fn remote_branch_exists(repo_root: &Path, branch: &str, timeout: Duration) -> Result<bool, GitError> {
    let out = run_git(
        repo_root,
        &["show-ref", "--verify", "--quiet", &format!("refs/remotes/origin/{branch}")],
        timeout,
    )?;
    Ok(out.success)
}

/// Repo-root-relative change descriptions from `git status --porcelain`
/// (e.g. `"Modified: src/config.py"`), grounded on
/// `original_source/core/processors/simple_queued_processor.py`'s
/// `_get_recent_file_changes`. Returns an empty list on any git failure;
/// callers treat that the same as "nothing detected".
pub fn recent_file_changes(repo_root: &Path, timeout: Duration) -> Vec<String> {
    let Ok(status) = run_git(repo_root, &["status", "--porcelain"], timeout) else {
        return Vec::new();
    };
    if !status.success {
        return Vec::new();
    }
    status.stdout.lines().filter(|line| !line.trim().is_empty()).filter_map(describe_status_line).collect()
}

fn describe_status_line(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let code = parts.next()?;
    let path = parts.next()?.trim();
    let label = match code {
        "M" => "Modified",
        "A" => "Added",
        "D" => "Deleted",
        "R" => "Renamed",
        "C" => "Copied",
        "??" => "Untracked",
        other => other,
    };
    Some(format!("{label}: {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        let run = |args: &[&str]| {
            let status = std::process::Command::new("git").args(args).current_dir(dir.path()).status().expect("git available");
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
    fn recent_file_changes_labels_modified_and_untracked() {
        let dir = init_repo();
        std::fs::write(dir.path().join("README.md"), b"hello world").expect("write");
        std::fs::create_dir_all(dir.path().join("src")).expect("mkdir");
        std::fs::write(dir.path().join("src/new_module.py"), b"# new").expect("write");

        let changes = recent_file_changes(dir.path(), Duration::from_secs(5));
        assert!(changes.contains(&"Modified: README.md".to_string()));
        assert!(changes.contains(&"Untracked: src/new_module.py".to_string()));
    }

    #[test]
    fn recent_file_changes_empty_on_clean_tree() {
        let dir = init_repo();
        assert!(recent_file_changes(dir.path(), Duration::from_secs(5)).is_empty());
    }
}
