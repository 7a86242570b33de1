// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! `copy_artifact(ticket_id, source?)` (spec.md §4.3 steps 1-5).

use crate::checksum::checksum_file;
use crate::error::FileOpsError;
use nomad_core::{Clock, OperationId, OperationOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::warn;

/// A completed (or failed) `copy_artifact` attempt, process-lifetime only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyOperation {
    pub id: OperationId,
    pub ticket_id: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub source_size: u64,
    pub source_md5: String,
    pub backup_path: Option<PathBuf>,
    pub outcome: OperationOutcome,
    pub error: Option<String>,
}

/// Reject any raw path containing a `..` component, and require the
/// resolved path to stay within `project_root` (spec.md §4.3 step 1).
fn guard_within_root(raw: &Path, project_root: &Path) -> Result<PathBuf, FileOpsError> {
    if raw.components().any(|c| c == Component::ParentDir) {
        return Err(FileOpsError::PathTraversal(raw.to_path_buf(), project_root.to_path_buf()));
    }
    let joined = if raw.is_absolute() { raw.to_path_buf() } else { project_root.join(raw) };
    if !joined.starts_with(project_root) {
        return Err(FileOpsError::PathTraversal(joined, project_root.to_path_buf()));
    }
    Ok(joined)
}

fn io_err(path: &Path, source: std::io::Error) -> FileOpsError {
    FileOpsError::Io { path: path.to_path_buf(), source }
}

/// `⌈source_size × 1.1⌉`, the minimum free space required at the
/// destination volume before copying (spec.md §4.3 step 3).
pub fn required_free_space(source_size: u64) -> u64 {
    ((source_size as f64) * 1.1).ceil() as u64
}

/// Free space on the volume backing `path`, via a real `statvfs`-family
/// syscall rather than scraping a shelled-out `df`. `path` itself need not
/// exist yet (the destination is typically not yet created); walk up to
/// the nearest existing ancestor to probe.
fn available_space(path: &Path) -> std::io::Result<u64> {
    let mut probe = path;
    loop {
        if probe.exists() {
            return fs2::available_space(probe);
        }
        match probe.parent() {
            Some(parent) => probe = parent,
            None => return fs2::available_space(Path::new(".")),
        }
    }
}

/// Copy `<tasks_dir>/tasks/<ticket_id>.json` (or `source` if given) into
/// `<project_root>/.taskmaster/tasks/tasks.json`, backing up any existing
/// destination first and merging by source-replaces-destination semantics.
pub fn copy_artifact(
    tasks_dir: &Path,
    project_root: &Path,
    ticket_id: &str,
    source: Option<&Path>,
    clock: &Arc<dyn Clock>,
) -> CopyOperation {
    let id = OperationId::next("copy");
    let result = copy_artifact_inner(tasks_dir, project_root, ticket_id, source, clock);
    match result {
        Ok(mut op) => {
            op.id = id;
            op
        }
        Err((source, destination, error)) => CopyOperation {
            id,
            ticket_id: ticket_id.to_string(),
            source,
            destination,
            source_size: 0,
            source_md5: String::new(),
            backup_path: None,
            outcome: OperationOutcome::Failed,
            error: Some(error.to_string()),
        },
    }
}

fn copy_artifact_inner(
    tasks_dir: &Path,
    project_root: &Path,
    ticket_id: &str,
    source: Option<&Path>,
    clock: &Arc<dyn Clock>,
) -> Result<CopyOperation, (PathBuf, PathBuf, FileOpsError)> {
    let default_source = tasks_dir.join("tasks").join(format!("{ticket_id}.json"));
    let raw_source = source.unwrap_or(&default_source);
    let destination = project_root.join(".taskmaster").join("tasks").join("tasks.json");

    let source_path = guard_within_root(raw_source, project_root).map_err(|e| (raw_source.to_path_buf(), destination.clone(), e))?;
    let destination = guard_within_root(&destination, project_root).map_err(|e| (source_path.clone(), destination, e))?;

    if !source_path.exists() {
        return Err((source_path.clone(), destination, FileOpsError::SourceMissing(source_path)));
    }

    let source_meta = std::fs::metadata(&source_path).map_err(|e| (source_path.clone(), destination.clone(), io_err(&source_path, e)))?;
    let source_size = source_meta.len();
    let source_md5 = checksum_file(&source_path).map_err(|e| (source_path.clone(), destination.clone(), io_err(&source_path, e)))?;

    let needed = required_free_space(source_size);
    let available = available_space(&destination).map_err(|e| (source_path.clone(), destination.clone(), io_err(&destination, e)))?;
    if available < needed {
        return Err((source_path.clone(), destination.clone(), FileOpsError::InsufficientSpace { path: destination, needed, available }));
    }

    let mut backup_path = None;
    if destination.exists() {
        let backup_dir = destination.parent().map(|p| p.join("backups")).unwrap_or_else(|| PathBuf::from("backups"));
        std::fs::create_dir_all(&backup_dir).map_err(|e| (source_path.clone(), destination.clone(), io_err(&backup_dir, e)))?;
        let stamp = clock.now_utc().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("tasks_{stamp}_{ticket_id}.json.bak"));
        std::fs::copy(&destination, &backup_file).map_err(|e| (source_path.clone(), destination.clone(), io_err(&backup_file, e)))?;
        backup_path = Some(backup_file);
    }

    let merged = merge_with_existing(&source_path, &destination).map_err(|e| (source_path.clone(), destination.clone(), e))?;

    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent).map_err(|e| (source_path.clone(), destination.clone(), io_err(parent, e)))?;
    }
    let tmp_path = destination.with_extension("json.tmp");
    let write_result = std::fs::write(&tmp_path, merged.to_string())
        .and_then(|_| std::fs::rename(&tmp_path, &destination));
    if let Err(e) = write_result {
        if let Some(backup) = &backup_path {
            if let Err(restore_err) = std::fs::copy(backup, &destination) {
                warn!(?restore_err, "failed to restore backup after copy_artifact write failure");
            }
        }
        return Err((source_path, destination.clone(), io_err(&destination, e)));
    }

    Ok(CopyOperation {
        id: OperationId::next("copy"),
        ticket_id: ticket_id.to_string(),
        source: source_path,
        destination,
        source_size,
        source_md5,
        backup_path,
        outcome: OperationOutcome::Success,
        error: None,
    })
}

/// Source replaces destination (spec.md §4.3 step 5: "documented; multi-tag
/// merge is a known extension point").
fn merge_with_existing(source_path: &Path, destination: &Path) -> Result<Value, FileOpsError> {
    let source_text = std::fs::read_to_string(source_path).map_err(|e| io_err(source_path, e))?;
    let source_json: Value = serde_json::from_str(&source_text).map_err(|e| FileOpsError::Json { path: source_path.to_path_buf(), source: e })?;
    if destination.exists() {
        let dest_text = std::fs::read_to_string(destination).map_err(|e| io_err(destination, e))?;
        let _existing: Value = serde_json::from_str(&dest_text).map_err(|e| FileOpsError::Json { path: destination.to_path_buf(), source: e })?;
    }
    Ok(source_json)
}
