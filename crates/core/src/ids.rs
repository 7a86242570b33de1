// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Board-facing identifiers.
//!
//! A task has two identifiers: the board provider's opaque [`PageId`], and
//! the human-facing [`TicketId`] derived from it per spec.md §3.

use regex::Regex;
use std::sync::OnceLock;

crate::define_id! {
    /// The board provider's opaque internal identifier for a task row.
    pub struct PageId;
}

crate::define_id! {
    /// Human-readable task identifier of the form `PREFIX-N` (e.g. `NOMAD-12`).
    pub struct TicketId;
}

#[allow(clippy::expect_used)]
fn ticket_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z]+-\d+").expect("static ticket pattern is valid"))
}

/// Derive a [`TicketId`] for a task, in the precedence order of spec.md §3:
///
/// 1. a `unique_id`-typed property (`prefix` + `number`), if present;
/// 2. a regex match on the title (`[A-Z]+-\d+`);
/// 3. the last 8 hex characters of the page id.
pub fn derive_ticket_id(
    unique_id: Option<(&str, u64)>,
    title: &str,
    page_id: &PageId,
) -> TicketId {
    if let Some((prefix, number)) = unique_id {
        return TicketId::new(format!("{prefix}-{number}"));
    }
    if let Some(m) = ticket_pattern().find(title) {
        return TicketId::new(m.as_str().to_string());
    }
    let raw = page_id.as_str().replace('-', "");
    let tail: String = raw.chars().rev().take(8).collect::<Vec<_>>().into_iter().rev().collect();
    TicketId::new(if tail.is_empty() {
        "UNKNOWN-0".to_string()
    } else {
        tail
    })
}

#[cfg(test)]
#[path = "ids_tests.rs"]
mod tests;
