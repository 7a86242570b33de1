// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileOpsError {
    #[error("path {0:?} escapes project root {1:?}")]
    PathTraversal(std::path::PathBuf, std::path::PathBuf),
    #[error("source artifact {0:?} does not exist")]
    SourceMissing(std::path::PathBuf),
    #[error("insufficient free space: need {needed} bytes, have {available} at {path:?}")]
    InsufficientSpace { path: std::path::PathBuf, needed: u64, available: u64 },
    #[error("I/O error on {path:?}: {source}")]
    Io { path: std::path::PathBuf, #[source] source: std::io::Error },
    #[error("failed to parse JSON at {path:?}: {source}")]
    Json { path: std::path::PathBuf, #[source] source: serde_json::Error },
}
