// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use nomad_core::Status;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("board call failed: {0}")]
    Board(#[from] nomad_board::BoardError),
    #[error("page {page_id} is in status {current}, which cannot reach {requested} from {from}")]
    Refused { page_id: String, current: Status, from: Status, requested: Status },
}
