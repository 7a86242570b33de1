// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("board call failed: {0}")]
    Board(#[from] nomad_board::BoardError),
}
