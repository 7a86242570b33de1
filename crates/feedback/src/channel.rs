// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The Feedback Channel (C6) itself: append, retry, and serialize writes
//! to the board's `Feedback` rich-text property (spec.md §4.6), grounded
//! on `original_source/core/managers/feedback_manager.py`'s
//! `FeedbackManager.add_feedback`.

use crate::chunk::chunk_text;
use crate::entry::{append_entry, format_entry};
use crate::error::FeedbackError;
use crate::stage::ProcessingStage;
use nomad_board::BoardClient;
use nomad_board::BoardTransport;
use nomad_core::Clock;
use nomad_retry::BackoffConfig;
use parking_lot::ReentrantMutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info};

const FEEDBACK_PROPERTY: &str = "Feedback";

/// Serializes all feedback writes within the process behind a reentrant
/// lock (spec.md §4.6: "a single reentrant lock serializing all feedback
/// writes"), so a stage handler calling `append` from within another
/// `append`'s error path doesn't deadlock.
pub struct FeedbackChannel<T: BoardTransport> {
    board: Arc<BoardClient<T>>,
    backoff: BackoffConfig,
    clock: Arc<dyn Clock>,
    lock: ReentrantMutex<()>,
}

impl<T: BoardTransport> FeedbackChannel<T> {
    pub fn new(board: Arc<BoardClient<T>>, clock: Arc<dyn Clock>) -> Self {
        FeedbackChannel {
            board,
            backoff: BackoffConfig { max_retries: 3 },
            clock,
            lock: ReentrantMutex::new(()),
        }
    }

    /// Append one feedback entry for `page_id`, chunking the combined
    /// content and patching it back in a single request.
    pub async fn append(
        &self,
        page_id: &str,
        stage: ProcessingStage,
        message: &str,
        details: Option<&str>,
        error_text: Option<&str>,
    ) -> Result<(), FeedbackError> {
        let _guard = self.lock.lock();

        let new_entry = format_entry(self.clock.now_utc(), stage, message, details, error_text);
        let attempt_write = || async {
            let page = self.board.get_page(page_id).await?;
            let current = read_feedback_text(&page);
            let combined = append_entry(&current, &new_entry);
            let properties = json!({ FEEDBACK_PROPERTY: { "rich_text": rich_text_runs(&combined) } });
            self.board.patch_properties(page_id, properties).await
        };

        let result = nomad_retry::retry_async(self.backoff, nomad_board::BoardError::is_retryable, attempt_write).await;
        match result {
            Ok(_) => {
                info!(page_id, %stage, "feedback appended");
                Ok(())
            }
            Err(e) => {
                error!(page_id, %stage, error = %e, "feedback write exhausted retries");
                Err(e.into())
            }
        }
    }

    pub async fn stage_started(&self, page_id: &str, stage: ProcessingStage) -> Result<(), FeedbackError> {
        self.append(page_id, stage, &format!("Stage {stage} started"), None, None).await
    }

    pub async fn stage_completed(&self, page_id: &str, stage: ProcessingStage) -> Result<(), FeedbackError> {
        self.append(page_id, stage, &format!("Stage {stage} completed"), None, None).await
    }

    pub async fn error(&self, page_id: &str, stage: ProcessingStage, error_message: &str, details: Option<&str>) -> Result<(), FeedbackError> {
        self.append(page_id, stage, &format!("Error in {stage}"), details, Some(error_message)).await
    }

    pub async fn status_transition(&self, page_id: &str, from_status: &str, to_status: &str, success: bool, error_message: Option<&str>) -> Result<(), FeedbackError> {
        let (message, details) = if success {
            (format!("Status transition: {from_status} -> {to_status}"), "Transition completed successfully".to_string())
        } else {
            (
                format!("Status transition failed: {from_status} -> {to_status}"),
                error_message.map(|e| format!("Transition failed with error: {e}")).unwrap_or_else(|| "Unknown error".to_string()),
            )
        };
        self.append(page_id, ProcessingStage::StatusTransition, &message, Some(&details), if success { None } else { error_message }).await
    }
}

fn read_feedback_text(page: &Value) -> String {
    page.get("properties")
        .and_then(|p| p.get(FEEDBACK_PROPERTY))
        .and_then(|prop| prop.get("rich_text"))
        .and_then(|v| v.as_array())
        .map(|runs| {
            runs.iter()
                .filter_map(|run| run.get("text").and_then(|t| t.get("content")).and_then(|c| c.as_str()))
                .collect::<String>()
        })
        .unwrap_or_default()
}

fn rich_text_runs(content: &str) -> Vec<Value> {
    chunk_text(content)
        .into_iter()
        .map(|chunk| json!({ "type": "text", "text": { "content": chunk } }))
        .collect()
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
