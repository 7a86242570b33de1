// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not a git repository: {0}")]
    NotARepository(String),

    #[error("git command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("invalid commit message: {0}")]
    InvalidMessage(String),

    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("branch already exists: {0}")]
    BranchAlreadyExists(String),

    #[error("base branch not found: {0}")]
    BaseBranchMissing(String),

    #[error("git command failed: {0}")]
    CommandFailed(String),

    #[error("failed to launch git: {0}")]
    Spawn(#[from] std::io::Error),
}
