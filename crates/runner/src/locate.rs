// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Per-ticket artifact lookup (spec.md §4.7 step 3), grounded on
//! `original_source/core/processors/simple_queued_processor.py`'s
//! `_find_task_file`.

use std::path::{Path, PathBuf};

/// Find the decomposed-task JSON for `ticket_id` under `<tasks_dir>/tasks`:
/// try the exact `<ticket_id>.json` filename first, then fall back to any
/// `*.json` whose stem contains `ticket_id`.
pub fn find_task_file(tasks_dir: &Path, ticket_id: &str) -> Option<PathBuf> {
    let task_dir = tasks_dir.join("tasks");
    let exact = task_dir.join(format!("{ticket_id}.json"));
    if exact.is_file() {
        return Some(exact);
    }

    let entries = std::fs::read_dir(&task_dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("json"))
        .filter(|path| path.file_stem().and_then(|s| s.to_str()).map(|s| s.contains(ticket_id)).unwrap_or(false))
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}
