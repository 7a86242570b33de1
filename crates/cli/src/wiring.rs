// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Component wiring: turn a loaded [`NomadConfig`] into a fully constructed
//! [`Dispatcher`] over the live board transport.

use nomad_board::{BoardClient, HttpTransport};
use nomad_config::{LlmProvider, NomadConfig};
use nomad_core::{Clock, SystemClock};
use nomad_dispatcher::Dispatcher;
use nomad_engine::EngineInvoker;
use nomad_feedback::FeedbackChannel;
use nomad_refine::{HttpLlmClient, RefinementPool};
use nomad_retry::BackoffConfig;
use std::sync::Arc;
use std::time::Duration;

const NOTION_BASE_URL: &str = "https://api.notion.com/v1";
const DECOMPOSER_PROGRAM: &str = "task-master";
const ENGINE_PROGRAM: &str = "claude";

/// Decomposer invocation timeout. Not spec'd as a named env var, so it is
/// fixed rather than plumbed through `NomadConfig` for a single-use value.
const DECOMPOSER_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// File extension watched for change detection before/after an engine run
/// (spec.md §4.3/§4.7), grounded on the original Python orchestrator's own
/// source tree. Overridable since a generated project need not be Python.
fn watch_extension() -> String {
    std::env::var("NOMAD_WATCH_EXTENSION").unwrap_or_else(|_| "py".to_string())
}

fn llm_base_url(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "https://api.openai.com/v1",
        LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
        LlmProvider::Anthropic => "https://api.anthropic.com/v1",
    }
}

fn default_llm_model(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::OpenAi => "gpt-4o-mini",
        LlmProvider::OpenRouter => "anthropic/claude-3.5-sonnet",
        LlmProvider::Anthropic => "claude-3-5-sonnet-20241022",
    }
}

fn llm_model(provider: LlmProvider) -> String {
    std::env::var("NOMAD_LLM_MODEL").unwrap_or_else(|_| default_llm_model(provider).to_string())
}

fn decomposer_program(config: &NomadConfig) -> String {
    match &config.taskmaster_dir {
        Some(dir) => dir.join(DECOMPOSER_PROGRAM).display().to_string(),
        None => DECOMPOSER_PROGRAM.to_string(),
    }
}

/// Build the fully wired dispatcher for one process lifetime, over the real
/// HTTP board transport.
pub fn build_dispatcher(config: &NomadConfig, shutting_down: Arc<dyn Fn() -> bool + Send + Sync>) -> anyhow::Result<Dispatcher<HttpTransport>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let backoff = BackoffConfig { max_retries: config.max_retries };

    let transport = HttpTransport::new(NOTION_BASE_URL, &config.notion_token, config.board_http_timeout)?;
    let board = Arc::new(BoardClient::new(transport, &config.notion_board_db, backoff, clock.clone()));

    let feedback = Arc::new(FeedbackChannel::new(board.clone(), clock.clone()));

    let llm = Arc::new(HttpLlmClient::new(llm_base_url(config.llm_provider), &config.llm_api_key, llm_model(config.llm_provider), config.board_http_timeout).map_err(anyhow::Error::msg)?);
    let refine_pool = RefinementPool::new(board.clone(), llm, feedback.clone(), config.tasks_dir.clone(), config.max_concurrent_tasks);

    let engine_backoff = BackoffConfig { max_retries: config.engine_max_retries };
    let invoker = EngineInvoker::new(ENGINE_PROGRAM, config.working_dir.clone(), config.engine_timeout, engine_backoff, config.max_history);

    Ok(Dispatcher::new(
        board,
        feedback,
        refine_pool,
        invoker,
        decomposer_program(config),
        DECOMPOSER_TIMEOUT,
        config.working_dir.clone(),
        config.tasks_dir.clone(),
        config.working_dir.clone(),
        watch_extension(),
        clock,
        shutting_down,
    ))
}
