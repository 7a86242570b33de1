// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Entry formatting (spec.md §4.6), grounded on
//! `original_source/core/managers/feedback_manager.py`'s
//! `_format_feedback_entry`/`_append_feedback`.

use crate::stage::ProcessingStage;
use chrono::{DateTime, Utc};
use nomad_config::mask_secrets_in_text;

/// Format one feedback entry:
/// `[<YYYY-MM-DD HH:MM:SS>] <STAGE>: <message>` plus optional
/// `  Details: <details>` / `  Error: <error>` lines. Secrets are masked
/// before formatting so they never reach the board.
pub fn format_entry(timestamp: DateTime<Utc>, stage: ProcessingStage, message: &str, details: Option<&str>, error: Option<&str>) -> String {
    let mut entry = format!("[{}] {}: {}", timestamp.format("%Y-%m-%d %H:%M:%S"), stage, mask_secrets_in_text(message));
    if let Some(details) = details {
        entry.push_str(&format!("\n  Details: {}", mask_secrets_in_text(details)));
    }
    if let Some(error) = error {
        entry.push_str(&format!("\n  Error: {}", mask_secrets_in_text(error)));
    }
    entry
}

/// Append `new_entry` to `current`, separated by a blank line; `current`
/// may be empty (first entry on the page).
pub fn append_entry(current: &str, new_entry: &str) -> String {
    if current.trim().is_empty() {
        new_entry.to_string()
    } else {
        format!("{current}\n\n{new_entry}")
    }
}
