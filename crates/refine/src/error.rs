// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RefineError {
    #[error("board call failed: {0}")]
    Board(#[from] nomad_board::BoardError),
    #[error("transition failed: {0}")]
    Transition(#[from] nomad_statemachine::TransitionError),
    #[error("llm call failed: {0}")]
    Llm(String),
    #[error("failed to persist refined content: {0}")]
    Io(#[from] std::io::Error),
}
