// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Non-destructive summary read over an existing feedback transcript
//! (spec.md §4.6), grounded on
//! `original_source/core/managers/feedback_manager.py`'s
//! `get_feedback_summary`.

use regex::Regex;
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn entry_header() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\[(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\] (\S+):").expect("static entry header pattern is valid"))
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedbackSummary {
    pub entry_count: usize,
    pub stages: Vec<String>,
    pub last_timestamp: Option<String>,
    pub has_errors: bool,
}

/// Parse an existing feedback transcript without mutating it: count
/// `[timestamp] STAGE:` entries, collect the distinct stages seen, report
/// the most recent timestamp, and flag whether any line mentions an error.
pub fn summarize(text: &str) -> FeedbackSummary {
    let mut stages = Vec::new();
    let mut last_timestamp = None;
    let mut entry_count = 0;

    for capture in entry_header().captures_iter(text) {
        entry_count += 1;
        let timestamp = capture[1].to_string();
        let stage = capture[2].to_string();
        if !stages.contains(&stage) {
            stages.push(stage);
        }
        last_timestamp = Some(timestamp);
    }

    let has_errors = text.to_lowercase().contains("error");

    FeedbackSummary { entry_count, stages, last_timestamp, has_errors }
}
