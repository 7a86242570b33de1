// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Decode a raw page into the orchestrator's reduced [`Task`] view
//! (spec.md §3), grounded on
//! `original_source/src/core/operations/database_operations.py`'s
//! `_process_task_list` (title/status) and
//! `original_source/core/services/branch_service.py`'s property-name
//! probing for the branch-related checkboxes/rich-text fields.

use crate::status_codec::extract_status_value;
use nomad_core::{derive_ticket_id, PageId, Status, Task};
use serde_json::Value;

fn plain_text(rich_text: &Value) -> String {
    rich_text
        .as_array()
        .map(|runs| runs.iter().filter_map(|r| r.get("plain_text").and_then(|t| t.as_str())).collect::<String>())
        .unwrap_or_default()
}

fn title_of(properties: &Value) -> String {
    properties
        .get("Name")
        .and_then(|p| p.get("title"))
        .map(plain_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "Untitled".to_string())
}

fn checkbox(properties: &Value, name: &str) -> bool {
    properties.get(name).and_then(|p| p.get("checkbox")).and_then(|v| v.as_bool()).unwrap_or(false)
}

fn rich_text_property(properties: &Value, name: &str) -> Option<String> {
    let text = properties.get(name).and_then(|p| p.get("rich_text")).map(plain_text).unwrap_or_default();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn files_property(properties: &Value, name: &str) -> Vec<String> {
    properties
        .get(name)
        .and_then(|p| p.get("files"))
        .and_then(|v| v.as_array())
        .map(|files| {
            files
                .iter()
                .filter_map(|f| {
                    f.get("external")
                        .or_else(|| f.get("file"))
                        .and_then(|inner| inner.get("url"))
                        .and_then(|u| u.as_str())
                        .map(str::to_string)
                        .or_else(|| f.get("name").and_then(|n| n.as_str()).map(str::to_string))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Decode a raw `GET /pages/{id}` body into a [`Task`]. Any property that is
/// missing or the wrong shape degrades to its default rather than erroring:
/// `Task::new`'s defaults (spec.md §3, invariant b: unknown/absent inputs
/// are tolerated, not rejected).
pub fn task_from_page(page: &Value) -> Task {
    let page_id = PageId::new(page.get("id").and_then(|v| v.as_str()).unwrap_or_default());
    let properties = page.get("properties").cloned().unwrap_or_default();
    let title = title_of(&properties);
    let status = properties
        .get("Status")
        .and_then(extract_status_value)
        .map(|label| Status::from_label(&label))
        .unwrap_or(Status::Unknown);
    let ticket_id = derive_ticket_id(None, &title, &page_id);

    let mut task = Task::new(page_id, title, status, ticket_id);
    task.commit = checkbox(&properties, "Commit");
    task.new_branch = checkbox(&properties, "New Branch");
    task.base_branch = rich_text_property(&properties, "Base Branch");
    task.branch_name = rich_text_property(&properties, "Branch Name");
    task.feedback = rich_text_property(&properties, "Feedback").unwrap_or_default();
    task.tasks_files = files_property(&properties, "Tasks");
    task
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_title_status_and_checkboxes() {
        let page = json!({
            "id": "page-1",
            "properties": {
                "Name": {"title": [{"plain_text": "Implement widget"}]},
                "Status": {"select": {"name": "Queued to run"}},
                "Commit": {"checkbox": true},
                "New Branch": {"checkbox": true},
                "Base Branch": {"rich_text": [{"plain_text": "develop"}]},
                "Branch Name": {"rich_text": [{"plain_text": "feature/widget"}]},
                "Feedback": {"rich_text": [{"plain_text": "[2026-01-01 00:00:00] REFINING: started"}]},
                "Tasks": {"files": [{"name": "NOMAD-1.json"}]}
            }
        });

        let task = task_from_page(&page);
        assert_eq!(task.page_id.as_str(), "page-1");
        assert_eq!(task.title, "Implement widget");
        assert_eq!(task.status, Status::QueuedToRun);
        assert!(task.commit);
        assert!(task.new_branch);
        assert_eq!(task.base_branch.as_deref(), Some("develop"));
        assert_eq!(task.branch_name.as_deref(), Some("feature/widget"));
        assert!(task.feedback.contains("REFINING"));
        assert_eq!(task.tasks_files, vec!["NOMAD-1.json".to_string()]);
    }

    #[test]
    fn missing_properties_degrade_to_defaults() {
        let page = json!({ "id": "page-2", "properties": {} });
        let task = task_from_page(&page);
        assert_eq!(task.title, "Untitled");
        assert_eq!(task.status, Status::Unknown);
        assert!(!task.commit);
        assert!(task.base_branch.is_none());
        assert!(task.tasks_files.is_empty());
    }

    #[test]
    fn ticket_id_falls_back_to_title_regex_when_present() {
        let page = json!({
            "id": "abcdef1234567890",
            "properties": { "Name": {"title": [{"plain_text": "NOMAD-42: fix thing"}]} }
        });
        let task = task_from_page(&page);
        assert_eq!(task.ticket_id.as_str(), "NOMAD-42");
    }
}
