// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Branch creation service (spec.md §4.4), grounded on
//! `original_source/core/services/branch_service.py`.

use crate::branch_name::sanitize_task_name;
use crate::error::GitError;
use crate::process::{is_git_repository, local_branch_exists, remote_branch_exists, run_git};
use nomad_core::OperationId;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use tracing::info;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct BranchOperation {
    pub operation_id: String,
    pub branch_name: String,
    pub base_branch: String,
    pub created: bool,
    pub forced: bool,
}

/// Create (or reuse, with `force`) a branch named from `task_id`/`task_title`
/// off `base` (default `main`), per spec.md §4.4.
pub fn create_branch_for_task(
    repo_root: &Path,
    task_id: &str,
    task_title: &str,
    base: Option<&str>,
    force: bool,
    unix_seconds_fallback: u64,
) -> Result<BranchOperation, GitError> {
    if !is_git_repository(repo_root, DEFAULT_TIMEOUT) {
        return Err(GitError::NotARepository(repo_root.display().to_string()));
    }

    let branch_name = sanitize_task_name(task_title, task_id, unix_seconds_fallback);
    let base_branch = base.unwrap_or("main").to_string();

    let exists = local_branch_exists(repo_root, &branch_name, DEFAULT_TIMEOUT)?;
    if exists && !force {
        return Err(GitError::BranchAlreadyExists(branch_name));
    }

    let base_locally = local_branch_exists(repo_root, &base_branch, DEFAULT_TIMEOUT)?;
    let base_ref = if base_locally {
        base_branch.clone()
    } else if remote_branch_exists(repo_root, &base_branch, DEFAULT_TIMEOUT)? {
        format!("origin/{base_branch}")
    } else {
        return Err(GitError::BaseBranchMissing(base_branch));
    };

    let args: Vec<&str> = if exists && force {
        vec!["branch", "-f", &branch_name, &base_ref]
    } else {
        vec!["checkout", "-b", &branch_name, &base_ref]
    };
    let output = run_git(repo_root, &args, DEFAULT_TIMEOUT)?;
    if !output.success {
        return Err(GitError::CommandFailed(output.stderr));
    }

    if exists && force {
        // `branch -f` only moves the ref; switch the working tree onto it too.
        let checkout = run_git(repo_root, &["checkout", &branch_name], DEFAULT_TIMEOUT)?;
        if !checkout.success {
            return Err(GitError::CommandFailed(checkout.stderr));
        }
    }

    info!(branch_name, base_ref, "created task branch");
    Ok(BranchOperation {
        operation_id: OperationId::next("branch").to_string(),
        branch_name,
        base_branch,
        created: true,
        forced: exists && force,
    })
}
