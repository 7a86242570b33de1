// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Batch transitions with isolated per-task failure and rollback of the
//! successful subset (spec.md §4.9), grounded on
//! `original_source/core/managers/status_manager.py`'s
//! `StatusManager.batch_transition`/`rollback_transitions`.

use crate::transition::{transition, TransitionOutcome};
use nomad_board::{BoardClient, BoardTransport};
use nomad_core::Status;
use tracing::error;

#[derive(Debug, Clone)]
pub struct BatchResult {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl BatchResult {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Apply `transition(id, from, to, validate=true)` to every id in `ids`,
/// isolating failures: one task's refusal never aborts the rest of the
/// batch.
pub async fn batch_transition<T: BoardTransport>(
    board: &BoardClient<T>,
    ids: &[String],
    from: Status,
    to: Status,
) -> BatchResult {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for id in ids {
        match transition(board, id, from, to, true).await {
            Ok(TransitionOutcome::Applied | TransitionOutcome::NoOp) => succeeded.push(id.clone()),
            Err(e) => {
                error!(page_id = %id, error = %e, "batch transition failed for task");
                failed.push((id.clone(), e.to_string()));
            }
        }
    }

    BatchResult { succeeded, failed }
}

/// Restore `successful_subset` to `prior_status`, bypassing downstream
/// acceptance (the page is currently at the batch's `to` status, which the
/// legal graph does not allow moving "backward" from).
pub async fn rollback<T: BoardTransport>(board: &BoardClient<T>, successful_subset: &[String], current_status: Status, prior_status: Status) -> BatchResult {
    let mut succeeded = Vec::new();
    let mut failed = Vec::new();

    for id in successful_subset {
        match transition(board, id, current_status, prior_status, false).await {
            Ok(_) => succeeded.push(id.clone()),
            Err(e) => {
                error!(page_id = %id, error = %e, "rollback failed for task");
                failed.push((id.clone(), e.to_string()));
            }
        }
    }

    BatchResult { succeeded, failed }
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
