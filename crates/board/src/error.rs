// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("board returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode board response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Status property not found in schema; available properties: {0:?}")]
    StatusPropertyMissing(Vec<String>),
    #[error("unsupported Status property shape: {0}")]
    UnsupportedStatusShape(String),
    #[error("page {0} has no Status property value")]
    StatusValueMissing(String),
}

impl BoardError {
    /// Mirrors `nomad_retry::is_retryable_message`: 429/rate-limit/timeout/connection.
    pub fn is_retryable(&self) -> bool {
        match self {
            BoardError::Status { status, .. } => *status == 429 || *status >= 500,
            BoardError::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
