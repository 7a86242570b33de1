// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The Queued Runner itself (C9, spec.md §4.7): strictly serial
//! `Queued to run -> In progress -> {Done|Failed}` processing, grounded on
//! `original_source/core/processors/simple_queued_processor.py`'s
//! `SimpleQueuedProcessor.process_queued_tasks`/`_process_single_task`.

use crate::decompose::read_subtask_titles;
use crate::locate::find_task_file;
use crate::summary::{build_commit_message, build_summary_markdown};
use nomad_board::BoardClient;
use nomad_board::BoardTransport;
use nomad_core::{Clock, Status, Task};
use nomad_engine::{EngineInvoker, InvocationResult};
use nomad_feedback::{FeedbackChannel, ProcessingStage};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

const GENERIC_TASK_PROMPT: &str = "You are working on a software project that uses a task decomposition file for task management.\n\nCRITICAL INSTRUCTIONS - FOLLOW EXACTLY:\n1. Read the decomposed task list for this ticket.\n2. For EACH pending task: implement the required functionality by creating or modifying source files.\n3. Write real, working code; do not just plan or comment.\n4. Save all changes to disk.\n5. Continue until all tasks are complete, then exit.";

const DEFAULT_GIT_STATUS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Done,
    Failed(String),
    Skipped(String),
}

/// Run every queued task in `tasks` strictly serially, guarding against
/// concurrent `In progress` work before each one (spec.md §4.7 step 1).
pub async fn run_queue<T: BoardTransport>(
    board: &BoardClient<T>,
    feedback: &FeedbackChannel<T>,
    invoker: &EngineInvoker,
    repo_root: &Path,
    tasks_dir: &Path,
    project_root: &Path,
    watch_extension: &str,
    clock: &Arc<dyn Clock>,
    tasks: Vec<Task>,
) -> Vec<(String, RunOutcome)> {
    let mut outcomes = Vec::with_capacity(tasks.len());
    for task in tasks {
        let page_id = task.page_id.as_str().to_string();
        if in_progress_count(board).await > 0 {
            warn!(page_id, "skipping task: another task is already In progress");
            outcomes.push((page_id, RunOutcome::Skipped("another task is already In progress".to_string())));
            continue;
        }

        let outcome = run_task(board, feedback, invoker, repo_root, tasks_dir, project_root, watch_extension, clock, &task).await;
        outcomes.push((page_id, outcome));
    }
    outcomes
}

async fn in_progress_count<T: BoardTransport>(board: &BoardClient<T>) -> usize {
    board.query_by_status_cached(Status::InProgress.label()).await.map(|pages| pages.len()).unwrap_or(0)
}

#[allow(clippy::too_many_arguments)]
async fn run_task<T: BoardTransport>(
    board: &BoardClient<T>,
    feedback: &FeedbackChannel<T>,
    invoker: &EngineInvoker,
    repo_root: &Path,
    tasks_dir: &Path,
    project_root: &Path,
    watch_extension: &str,
    clock: &Arc<dyn Clock>,
    task: &Task,
) -> RunOutcome {
    let page_id = task.page_id.as_str();
    let ticket_id = task.ticket_id.as_str();

    if let Err(e) = nomad_statemachine::transition(board, page_id, Status::QueuedToRun, Status::InProgress, true).await {
        error!(page_id, ticket_id, error = %e, "failed to transition to In progress");
        return RunOutcome::Failed(e.to_string());
    }
    let _ = feedback.stage_started(page_id, ProcessingStage::Processing).await;

    let Some(task_file) = find_task_file(tasks_dir, ticket_id) else {
        return fail_task(board, feedback, page_id, ticket_id, &format!("task file not found for {ticket_id}")).await;
    };

    let copy = nomad_files::copy_artifact(tasks_dir, project_root, ticket_id, Some(&task_file), clock);
    if copy.outcome != nomad_core::OperationOutcome::Success {
        let reason = copy.error.unwrap_or_else(|| "failed to copy task artifact".to_string());
        return fail_task(board, feedback, page_id, ticket_id, &reason).await;
    }

    let before = nomad_files::checksum_tree(&project_root.join("src"), watch_extension).unwrap_or_default();

    let (_invocation_id, invocation) = invoker.invoke(ticket_id, page_id, GENERIC_TASK_PROMPT).await;
    if invocation.result != InvocationResult::Success {
        let reason = invocation.error.unwrap_or_else(|| format!("engine invocation ended in {:?}", invocation.result));
        return fail_task(board, feedback, page_id, ticket_id, &reason).await;
    }

    let after = nomad_files::checksum_tree(&project_root.join("src"), watch_extension).unwrap_or_default();
    let changes = nomad_files::detect_changes(&before, &after);
    if changes.is_empty() {
        warn!(page_id, ticket_id, "engine invocation made no detectable file changes");
    }

    let changed_files = nomad_git::recent_file_changes(repo_root, DEFAULT_GIT_STATUS_TIMEOUT);

    let subtasks = read_subtask_titles(&task_file);
    let summary = build_summary_markdown(ticket_id, &task.title, clock.now_utc(), &subtasks, &changed_files);
    if let Err(e) = write_summary(tasks_dir, ticket_id, &summary) {
        warn!(page_id, ticket_id, error = %e, "failed to write task summary file");
    }

    if task.commit {
        let message = build_commit_message(&task.title, ticket_id, &changed_files);
        let commit = nomad_git::execute_commit(repo_root, ticket_id, &message, None, true, false);
        match commit.result {
            nomad_git::CommitResult::Success | nomad_git::CommitResult::NoChanges => {
                info!(page_id, ticket_id, ?commit.result, "commit step complete");
            }
            _ => {
                warn!(page_id, ticket_id, error = ?commit.error, "commit failed; continuing, commit failure does not fail the task");
            }
        }
    }

    match nomad_statemachine::transition(board, page_id, Status::InProgress, Status::Done, true).await {
        Ok(_) => {
            let _ = feedback.stage_completed(page_id, ProcessingStage::Processing).await;
            RunOutcome::Done
        }
        Err(e) => {
            error!(page_id, ticket_id, error = %e, "failed to transition to Done after successful run");
            RunOutcome::Failed(e.to_string())
        }
    }
}

fn write_summary(tasks_dir: &Path, ticket_id: &str, content: &str) -> std::io::Result<()> {
    let summary_dir = tasks_dir.join("summary");
    std::fs::create_dir_all(&summary_dir)?;
    std::fs::write(summary_dir.join(format!("{ticket_id}.md")), content)
}

async fn fail_task<T: BoardTransport>(board: &BoardClient<T>, feedback: &FeedbackChannel<T>, page_id: &str, ticket_id: &str, reason: &str) -> RunOutcome {
    error!(page_id, ticket_id, reason, "task failed");
    let _ = feedback.error(page_id, ProcessingStage::ErrorHandling, reason, None).await;
    if let Err(e) = nomad_statemachine::transition(board, page_id, Status::InProgress, Status::Failed, false).await {
        error!(page_id, ticket_id, error = %e, "failed to transition to Failed after task failure");
    }
    RunOutcome::Failed(reason.to_string())
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
