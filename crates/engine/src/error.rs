// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("engine command not found: {0}")]
    CommandNotFound(String),

    #[error("engine invocation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("engine exited with code {0}")]
    NonZeroExit(i32),

    #[error("engine invocation was cancelled")]
    Cancelled,

    #[error("invocation id not found or already finished: {0}")]
    UnknownInvocation(String),

    #[error("failed to spawn engine process: {0}")]
    Spawn(#[from] std::io::Error),
}

impl EngineError {
    /// Per spec.md §4.5: retry on timeout or nonzero exit, never on
    /// "command not found" or an already-issued cancellation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Timeout(_) | EngineError::NonZeroExit(_))
    }
}
