// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Parse the decomposition JSON's subtask list for the summary (spec.md
//! §4.7 step 8), grounded on
//! `original_source/core/processors/simple_queued_processor.py`'s
//! `_get_completed_tasks_info`.

use serde_json::Value;
use std::path::Path;

/// Read `path` as JSON and collect each subtask's title (falling back to
/// its description, then `"Untitled"`), from either a top-level `tasks`
/// array or a `master.tasks` array (TaskMaster's on-disk shape).
pub fn read_subtask_titles(path: &Path) -> Vec<String> {
    let Ok(text) = std::fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(value) = serde_json::from_str::<Value>(&text) else {
        return Vec::new();
    };

    let tasks = value
        .get("tasks")
        .and_then(|v| v.as_array())
        .or_else(|| value.get("master").and_then(|m| m.get("tasks")).and_then(|v| v.as_array()));

    tasks
        .map(|tasks| {
            tasks
                .iter()
                .map(|task| {
                    task.get("title")
                        .and_then(|v| v.as_str())
                        .or_else(|| task.get("description").and_then(|v| v.as_str()))
                        .unwrap_or("Untitled")
                        .to_string()
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_top_level_tasks_array() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"tasks":[{"title":"Implement widget"},{"title":"Write tests"}]}"#).expect("write");
        assert_eq!(read_subtask_titles(&path), vec!["Implement widget".to_string(), "Write tests".to_string()]);
    }

    #[test]
    fn reads_taskmaster_nested_shape() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("t.json");
        std::fs::write(&path, r#"{"master":{"tasks":[{"description":"Do the thing"}]}}"#).expect("write");
        assert_eq!(read_subtask_titles(&path), vec!["Do the thing".to_string()]);
    }

    #[test]
    fn missing_or_invalid_file_yields_empty_list() {
        assert!(read_subtask_titles(Path::new("/nonexistent.json")).is_empty());
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "not json").expect("write");
        assert!(read_subtask_titles(&path).is_empty());
    }
}
