// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The task as the orchestrator sees it (spec.md §3).

use crate::ids::{PageId, TicketId};
use crate::status::Status;
use serde::{Deserialize, Serialize};

/// A page on the board, reduced to the fields the orchestrator acts on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub page_id: PageId,
    pub title: String,
    pub status: Status,
    pub ticket_id: TicketId,
    pub commit: bool,
    pub new_branch: bool,
    pub base_branch: Option<String>,
    pub branch_name: Option<String>,
    /// Raw feedback rich-text value, as currently stored on the board.
    pub feedback: String,
    /// File reference(s) in the `Tasks` property, if any.
    pub tasks_files: Vec<String>,
}

impl Task {
    pub fn new(page_id: PageId, title: impl Into<String>, status: Status, ticket_id: TicketId) -> Self {
        Task {
            page_id,
            title: title.into(),
            status,
            ticket_id,
            commit: false,
            new_branch: false,
            base_branch: None,
            branch_name: None,
            feedback: String::new(),
            tasks_files: Vec::new(),
        }
    }
}
