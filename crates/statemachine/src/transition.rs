// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Single-task transitions with downstream acceptance (spec.md §4.9),
//! grounded on `original_source/core/managers/status_manager.py`'s
//! `StatusManager.transition_status`.

use crate::error::TransitionError;
use nomad_board::{BoardClient, BoardTransport};
use nomad_core::Status;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The page was already at `to` (or at some status that can still reach
    /// `to` along the legal graph); no write was made.
    NoOp,
    /// The page's status property was updated from `from` to `to`.
    Applied,
}

/// Move `page_id` from `from` to `to`.
///
/// - If the page's current status already equals `to`: no-op success.
/// - If it still equals `from`: apply the update via the board client.
/// - Otherwise: accept as a no-op only if `from` can still reach the
///   current status along the legal transition graph (spec.md §4.1's
///   downstream-acceptance rule) -- the page has already moved on, likely
///   by a previous/concurrent run of this same dispatcher, so we trust the
///   more advanced state rather than refuse. Any other current status is a
///   refusal: the task diverged onto a status the legal graph from `from`
///   cannot explain.
///
/// `validate = false` skips the downstream-acceptance check and applies the
/// update unconditionally, used by `rollback` to restore a prior status
/// that the forward graph wouldn't otherwise allow moving "back" to.
pub async fn transition<T: BoardTransport>(
    board: &BoardClient<T>,
    page_id: &str,
    from: Status,
    to: Status,
    validate: bool,
) -> Result<TransitionOutcome, TransitionError> {
    let page = board.get_page(page_id).await?;
    let current = board.read_status(&page).map(|label| Status::from_label(&label)).unwrap_or(Status::Unknown);

    if current == to {
        return Ok(TransitionOutcome::NoOp);
    }

    if !validate {
        board.update_status(page_id, from.label(), to.label()).await?;
        info!(page_id, %from, %to, "transition applied (unvalidated)");
        return Ok(TransitionOutcome::Applied);
    }

    if current == from {
        board.update_status(page_id, from.label(), to.label()).await?;
        info!(page_id, %from, %to, "transition applied");
        return Ok(TransitionOutcome::Applied);
    }

    if from.can_reach(current) {
        warn!(page_id, %from, %to, %current, "transition accepted as no-op: page already advanced downstream");
        return Ok(TransitionOutcome::NoOp);
    }

    Err(TransitionError::Refused { page_id: page_id.to_string(), current, from, requested: to })
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
