// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Generated commit messages and task summary markdown (spec.md §4.7),
//! grounded on
//! `original_source/core/processors/simple_queued_processor.py`'s
//! `_create_summary_content`/`_get_recent_file_changes` and spec.md's
//! generated-commit-message template.

use chrono::{DateTime, Utc};

const ORCHESTRATOR_NAME: &str = "nomad";

/// Render the `Modified files: ...` line per spec.md §4.7: at most 3 listed
/// verbatim, otherwise the first 3 followed by `"and N more"`.
pub fn format_file_list(files: &[String]) -> String {
    if files.len() <= 3 {
        files.join(", ")
    } else {
        format!("{} and {} more", files[..3].join(", "), files.len() - 3)
    }
}

/// Build the generated commit message template from spec.md §4.7.
pub fn build_commit_message(title: &str, ticket_id: &str, changed_files: &[String]) -> String {
    format!(
        "feat: {title} ({ticket_id})\n\nImplemented task: {title}\nModified files: {}\nTask ID: {ticket_id}\n🤖 Auto-committed by {ORCHESTRATOR_NAME}",
        format_file_list(changed_files)
    )
}

/// Build the task summary markdown combining ticket metadata, the
/// completed-subtask list parsed from the decomposition JSON, and the
/// change list detected by `nomad_files::detect_changes`.
pub fn build_summary_markdown(ticket_id: &str, title: &str, completed_at: DateTime<Utc>, subtasks: &[String], changed_files: &[String]) -> String {
    let mut content = format!(
        "# Task Implementation Summary - {ticket_id}\n\n## Task Information\n- **Ticket ID**: {ticket_id}\n- **Title**: {title}\n- **Completion Date**: {}\n- **Processing Method**: Queued Runner\n\n",
        completed_at.format("%Y-%m-%d %H:%M:%S")
    );

    content.push_str(&format!("## Completed Subtasks ({} total)\n\n", subtasks.len()));
    if subtasks.is_empty() {
        content.push_str("No subtasks were recorded in the decomposition file.\n\n");
    } else {
        for (i, subtask) in subtasks.iter().enumerate() {
            content.push_str(&format!("{}. {subtask}\n", i + 1));
        }
        content.push('\n');
    }

    content.push_str("## File Changes\n\n");
    if changed_files.is_empty() {
        content.push_str("No file changes were detected.\n");
    } else {
        for change in changed_files {
            content.push_str(&format!("- {change}\n"));
        }
    }

    content
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn format_file_list_shows_all_when_three_or_fewer() {
        let files = vec!["a.py".to_string(), "b.py".to_string()];
        assert_eq!(format_file_list(&files), "a.py, b.py");
    }

    #[test]
    fn format_file_list_truncates_beyond_three() {
        let files: Vec<String> = (0..5).map(|i| format!("file{i}.py")).collect();
        assert_eq!(format_file_list(&files), "file0.py, file1.py, file2.py and 2 more");
    }

    #[test]
    fn commit_message_matches_generated_template() {
        let msg = build_commit_message("Add widget", "NOMAD-7", &["a.py".to_string()]);
        assert!(msg.starts_with("feat: Add widget (NOMAD-7)"));
        assert!(msg.contains("Modified files: a.py"));
        assert!(msg.contains("Task ID: NOMAD-7"));
        assert!(msg.contains("Auto-committed by nomad"));
    }

    #[test]
    fn summary_markdown_includes_subtasks_and_changes() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let md = build_summary_markdown("NOMAD-7", "Add widget", ts, &["Implement the widget".to_string()], &["Modified: a.py".to_string()]);
        assert!(md.contains("NOMAD-7"));
        assert!(md.contains("Implement the widget"));
        assert!(md.contains("Modified: a.py"));
    }

    #[test]
    fn summary_markdown_handles_empty_subtasks_and_changes() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 5, 12, 0, 0).unwrap();
        let md = build_summary_markdown("NOMAD-8", "Empty task", ts, &[], &[]);
        assert!(md.contains("No subtasks were recorded"));
        assert!(md.contains("No file changes were detected"));
    }
}
