// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The decomposer CLI invocation itself (spec.md §4.10 step 3, "Prepare
//! Tasks"), grounded on `nomad_git::process::run_git`'s blocking
//! spawn-poll-timeout pattern. Unlike `nomad_engine::EngineInvoker`, this is
//! a single fixed invocation (`parse-prd <path> --force`) with no argument-
//! variant fallback, so it gets its own small helper rather than reusing the
//! engine invoker.

use crate::error::DispatchError;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// `.taskmaster/tasks/tasks.json`, the decomposer's fixed output location
/// (spec.md §3, "Canonical file").
pub fn canonical_output_path(project_root: &Path) -> PathBuf {
    project_root.join(".taskmaster").join("tasks").join("tasks.json")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecomposeOutcome {
    Success,
    Failed(String),
}

/// Run `<program> parse-prd <markdown_path> --force` in `project_root`,
/// killing it past `timeout`, then validate the canonical output per
/// spec.md §6: exit 0 and `.taskmaster/tasks/tasks.json` exists, parses as a
/// JSON object, is at least 50 bytes, and has at least one tag-keyed value
/// holding a `tasks` or `metadata` field.
pub fn run_decomposer(program: &str, markdown_path: &Path, project_root: &Path, timeout: Duration) -> Result<DecomposeOutcome, DispatchError> {
    let mut child = Command::new(program)
        .arg("parse-prd")
        .arg(markdown_path)
        .arg("--force")
        .current_dir(project_root)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(DispatchError::DecomposerSpawn)?;

    let started = Instant::now();
    loop {
        match child.try_wait().map_err(DispatchError::DecomposerSpawn)? {
            Some(_) => break,
            None => {
                if started.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DispatchError::DecomposerTimeout(timeout));
                }
                std::thread::sleep(Duration::from_millis(25));
            }
        }
    }

    let output = child.wait_with_output().map_err(DispatchError::DecomposerSpawn)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Ok(DecomposeOutcome::Failed(format!("decomposer exited nonzero: {stderr}")));
    }

    Ok(validate_canonical_output(&canonical_output_path(project_root)))
}

fn validate_canonical_output(path: &Path) -> DecomposeOutcome {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => return DecomposeOutcome::Failed(format!("canonical output missing: {e}")),
    };
    if text.len() < 50 {
        return DecomposeOutcome::Failed(format!("canonical output is only {} bytes", text.len()));
    }
    let value: Value = match serde_json::from_str(&text) {
        Ok(v) => v,
        Err(e) => return DecomposeOutcome::Failed(format!("canonical output is not valid JSON: {e}")),
    };
    let Some(obj) = value.as_object() else {
        return DecomposeOutcome::Failed("canonical output is not a JSON object".to_string());
    };
    let has_valid_tag = obj.values().any(|tag| tag.is_object() && (tag.get("tasks").is_some() || tag.get("metadata").is_some()));
    if has_valid_tag {
        DecomposeOutcome::Success
    } else {
        DecomposeOutcome::Failed("no tag in canonical output carries a tasks or metadata field".to_string())
    }
}

/// Completion check for the `Preparing Tasks` handler (spec.md §4.10 step 3):
/// a well-formed per-ticket file with a non-empty `tasks` array, or the
/// canonical file modified within the last `recency` window.
pub fn per_ticket_output_is_ready(per_ticket_path: &Path, canonical_path: &Path, recency: Duration, canonical_age: impl Fn(&Path) -> Option<Duration>) -> bool {
    if let Ok(text) = std::fs::read_to_string(per_ticket_path) {
        if has_non_empty_tasks(&text) {
            return true;
        }
    }
    canonical_age(canonical_path).map(|age| age <= recency).unwrap_or(false)
}

fn has_non_empty_tasks(text: &str) -> bool {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return false;
    };
    let Some(obj) = value.as_object() else {
        return false;
    };
    obj.values().any(|tag| tag.get("tasks").and_then(|t| t.as_array()).is_some_and(|tasks| !tasks.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-decomposer.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
        }
        path
    }

    #[test]
    fn successful_run_validates_canonical_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".taskmaster/tasks")).expect("mkdir");
        let script = write_script(
            dir.path(),
            &format!(
                "mkdir -p .taskmaster/tasks && echo '{{\"master\":{{\"tasks\":[{{\"id\":1}}],\"metadata\":{{}}}}}}' > .taskmaster/tasks/tasks.json"
            ),
        );
        let markdown = dir.path().join("spec.md");
        std::fs::write(&markdown, "# spec").expect("write");

        let outcome = run_decomposer(script.to_str().expect("utf8"), &markdown, dir.path(), Duration::from_secs(5)).expect("ran");
        assert_eq!(outcome, DecomposeOutcome::Success);
    }

    #[test]
    fn nonzero_exit_is_a_failed_outcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "echo boom 1>&2; exit 1");
        let markdown = dir.path().join("spec.md");
        std::fs::write(&markdown, "# spec").expect("write");

        let outcome = run_decomposer(script.to_str().expect("utf8"), &markdown, dir.path(), Duration::from_secs(5)).expect("ran");
        assert!(matches!(outcome, DecomposeOutcome::Failed(ref reason) if reason.contains("boom")));
    }

    #[test]
    fn missing_canonical_output_is_a_failed_outcome() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "exit 0");
        let markdown = dir.path().join("spec.md");
        std::fs::write(&markdown, "# spec").expect("write");

        let outcome = run_decomposer(script.to_str().expect("utf8"), &markdown, dir.path(), Duration::from_secs(5)).expect("ran");
        assert!(matches!(outcome, DecomposeOutcome::Failed(_)));
    }

    #[test]
    fn undersized_output_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join(".taskmaster/tasks")).expect("mkdir");
        let script = write_script(dir.path(), "mkdir -p .taskmaster/tasks && echo '{}' > .taskmaster/tasks/tasks.json");
        let markdown = dir.path().join("spec.md");
        std::fs::write(&markdown, "# spec").expect("write");

        let outcome = run_decomposer(script.to_str().expect("utf8"), &markdown, dir.path(), Duration::from_secs(5)).expect("ran");
        assert!(matches!(outcome, DecomposeOutcome::Failed(ref reason) if reason.contains("bytes")));
    }

    #[test]
    fn slow_process_is_killed_on_timeout() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = write_script(dir.path(), "sleep 5");
        let markdown = dir.path().join("spec.md");
        std::fs::write(&markdown, "# spec").expect("write");

        let err = run_decomposer(script.to_str().expect("utf8"), &markdown, dir.path(), Duration::from_millis(100)).unwrap_err();
        assert!(matches!(err, DispatchError::DecomposerTimeout(_)));
    }

    #[test]
    fn per_ticket_output_ready_when_file_has_tasks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let per_ticket = dir.path().join("NOMAD-1.json");
        std::fs::write(&per_ticket, r#"{"master":{"tasks":[{"id":1}]}}"#).expect("write");
        let canonical = dir.path().join("tasks.json");

        assert!(per_ticket_output_is_ready(&per_ticket, &canonical, Duration::from_secs(600), |_| None));
    }

    #[test]
    fn per_ticket_output_ready_when_canonical_recent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let per_ticket = dir.path().join("missing.json");
        let canonical = dir.path().join("tasks.json");

        assert!(per_ticket_output_is_ready(&per_ticket, &canonical, Duration::from_secs(600), |_| Some(
            Duration::from_secs(60)
        )));
        assert!(!per_ticket_output_is_ready(&per_ticket, &canonical, Duration::from_secs(600), |_| Some(
            Duration::from_secs(3600)
        )));
    }
}
