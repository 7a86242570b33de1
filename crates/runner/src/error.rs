// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("board call failed: {0}")]
    Board(#[from] nomad_board::BoardError),
    #[error("transition failed: {0}")]
    Transition(#[from] nomad_statemachine::TransitionError),
}
