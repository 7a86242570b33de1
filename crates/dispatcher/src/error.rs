// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("board call failed: {0}")]
    Board(#[from] nomad_board::BoardError),
    #[error("transition failed: {0}")]
    Transition(#[from] nomad_statemachine::TransitionError),
    #[error("failed to persist decomposition artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to launch decomposer: {0}")]
    DecomposerSpawn(std::io::Error),
    #[error("decomposer timed out after {0:?}")]
    DecomposerTimeout(Duration),
}
