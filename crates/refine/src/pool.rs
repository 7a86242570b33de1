// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The Refinement Worker Pool itself (C8, spec.md §4.8), grounded on
//! `original_source/build/lib/src/core/processors/enhanced_content_processor.py`'s
//! `process_task` (per-task result states, shutdown-flag polling between
//! steps) and `nomad_board::client::BoardClient::delete_blocks_concurrently`'s
//! semaphore-bounded fan-out for the pool's own concurrency.

use crate::error::RefineError;
use crate::llm::{refine_body, LlmClient};
use nomad_board::{BoardClient, BoardTransport};
use nomad_core::{Status, Task};
use nomad_feedback::{FeedbackChannel, ProcessingStage};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineOutcome {
    Completed,
    Failed(String),
    Aborted,
    Skipped(String),
}

enum StepResult {
    Completed,
    Aborted,
}

pub struct RefinementPool<T: BoardTransport> {
    board: Arc<BoardClient<T>>,
    llm: Arc<dyn LlmClient>,
    feedback: Arc<FeedbackChannel<T>>,
    tasks_dir: PathBuf,
    max_workers: usize,
}

impl<T: BoardTransport> RefinementPool<T> {
    pub fn new(board: Arc<BoardClient<T>>, llm: Arc<dyn LlmClient>, feedback: Arc<FeedbackChannel<T>>, tasks_dir: PathBuf, max_workers: usize) -> Self {
        RefinementPool { board, llm, feedback, tasks_dir, max_workers: max_workers.max(1) }
    }

    /// Refine every task in `tasks` with bounded parallelism, polling
    /// `cancelled` between steps and after every network call.
    #[allow(clippy::expect_used)]
    pub async fn refine_all(&self, tasks: Vec<Task>, cancelled: &(dyn Fn() -> bool + Sync)) -> Vec<(String, RefineOutcome)> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let futures = tasks.into_iter().map(|task| {
            let permit = semaphore.clone();
            async move {
                let _permit = permit.acquire().await.expect("semaphore is never closed");
                let page_id = task.page_id.as_str().to_string();
                let ticket_id = task.ticket_id.as_str().to_string();
                let outcome = match self.refine_one(&task, cancelled).await {
                    Ok(StepResult::Completed) => {
                        info!(page_id, ticket_id, "refinement completed");
                        let _ = self.feedback.stage_completed(&page_id, ProcessingStage::Refining).await;
                        RefineOutcome::Completed
                    }
                    Ok(StepResult::Aborted) => RefineOutcome::Aborted,
                    Err(e) => {
                        error!(page_id, ticket_id, error = %e, "refinement failed");
                        let _ = self.feedback.error(&page_id, ProcessingStage::Refining, &e.to_string(), None).await;
                        RefineOutcome::Failed(e.to_string())
                    }
                };
                (page_id, outcome)
            }
        });
        futures::future::join_all(futures).await
    }

    async fn refine_one(&self, task: &Task, cancelled: &(dyn Fn() -> bool + Sync)) -> Result<StepResult, RefineError> {
        if cancelled() {
            return Ok(StepResult::Aborted);
        }

        let page_id = task.page_id.as_str();
        let ticket_id = task.ticket_id.as_str();
        let _ = self.feedback.stage_started(page_id, ProcessingStage::Refining).await;

        let body = self.board.read_body_text(page_id).await?;
        if cancelled() {
            return Ok(StepResult::Aborted);
        }

        let refined = refine_body(self.llm.as_ref(), &body).await.map_err(RefineError::Llm)?;
        if cancelled() {
            return Ok(StepResult::Aborted);
        }

        self.persist(ticket_id, &refined)?;
        self.board.replace_child_blocks(page_id, &refined).await?;
        if cancelled() {
            return Ok(StepResult::Aborted);
        }

        nomad_statemachine::transition(&self.board, page_id, Status::ToRefine, Status::Refined, true).await?;
        Ok(StepResult::Completed)
    }

    fn persist(&self, ticket_id: &str, content: &str) -> Result<(), RefineError> {
        let dir = self.tasks_dir.join("refined");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join(format!("{ticket_id}.md")), content)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
