// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Configuration loading for the nomad orchestrator (spec.md §6, SPEC_FULL.md §10.3).
//!
//! Precedence: explicit override (e.g. `--working-dir`) > environment
//! variable > `nomad.toml` > built-in default. Secrets (board token, LLM
//! keys) only ever come from the environment; `nomad.toml` carries
//! non-secret tuning knobs only.

mod error;
mod file;
mod mask;

pub use error::ConfigError;
pub use file::FileDefaults;
pub use mask::{mask_secret, mask_secrets_in_text};

use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Which LLM provider's key was found, in the priority order spec.md §6 lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    OpenRouter,
    Anthropic,
}

impl LlmProvider {
    pub fn env_var(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "OPENAI_API_KEY",
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

/// Fully resolved configuration for one run of the orchestrator.
#[derive(Debug, Clone)]
pub struct NomadConfig {
    pub notion_token: String,
    pub notion_board_db: String,
    pub tasks_dir: PathBuf,
    pub taskmaster_dir: Option<PathBuf>,
    pub max_concurrent_tasks: usize,
    pub llm_provider: LlmProvider,
    pub llm_api_key: String,
    pub poll_interval: Duration,
    pub cooldown: Duration,
    pub cooldown_prune_after: Duration,
    pub engine_timeout: Duration,
    pub board_http_timeout: Duration,
    pub git_timeout: Duration,
    pub max_retries: u32,
    pub engine_max_retries: u32,
    pub max_history: usize,
    pub working_dir: PathBuf,
}

/// Read an environment variable via a caller-supplied lookup function, so
/// tests don't need process-wide env mutation (see `serial_test` usage at
/// call sites that do need real `std::env`).
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;
}

pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[allow(clippy::expect_used)]
fn board_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9a-fA-F]{8}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{4}-?[0-9a-fA-F]{12}$|^[0-9a-fA-F]{32}$").expect("static regex"))
}

fn validate_board_id(raw: &str) -> Result<String, ConfigError> {
    if board_id_pattern().is_match(raw) {
        Ok(raw.to_string())
    } else {
        Err(ConfigError::InvalidBoardId("NOTION_BOARD_DB", raw.to_string()))
    }
}

impl NomadConfig {
    /// Load from `env`, optionally overlaying `nomad.toml` defaults found at
    /// `file_path` (if it exists), then validate everything eagerly.
    pub fn load(env: &dyn EnvSource, file_path: Option<&std::path::Path>) -> Result<NomadConfig, ConfigError> {
        let defaults = match file_path {
            Some(p) if p.exists() => FileDefaults::load(p)?,
            _ => FileDefaults::default(),
        };

        let notion_token = env.get("NOTION_TOKEN").ok_or(ConfigError::MissingEnv("NOTION_TOKEN"))?;
        let notion_board_db_raw = env
            .get("NOTION_BOARD_DB")
            .ok_or(ConfigError::MissingEnv("NOTION_BOARD_DB"))?;
        let notion_board_db = validate_board_id(&notion_board_db_raw)?;

        let tasks_dir_raw = env.get("TASKS_DIR").ok_or(ConfigError::MissingEnv("TASKS_DIR"))?;
        let tasks_dir = PathBuf::from(tasks_dir_raw);
        std::fs::create_dir_all(&tasks_dir).map_err(|source| ConfigError::CreateTasksDir {
            path: tasks_dir.display().to_string(),
            source,
        })?;

        let taskmaster_dir = env.get("TASKMASTER_DIR").map(PathBuf::from);

        let max_concurrent_tasks = env
            .get("NOMAD_MAX_CONCURRENT_TASKS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let (llm_provider, llm_api_key) = [
            (LlmProvider::OpenAi, "OPENAI_API_KEY"),
            (LlmProvider::OpenRouter, "OPENROUTER_API_KEY"),
            (LlmProvider::Anthropic, "ANTHROPIC_API_KEY"),
        ]
        .into_iter()
        .find_map(|(provider, var)| env.get(var).map(|key| (provider, key)))
        .ok_or(ConfigError::MissingLlmKey)?;

        Ok(NomadConfig {
            notion_token,
            notion_board_db,
            tasks_dir,
            taskmaster_dir,
            max_concurrent_tasks,
            llm_provider,
            llm_api_key,
            poll_interval: Duration::from_secs(defaults.poll_interval_secs),
            cooldown: Duration::from_secs(defaults.cooldown_secs),
            cooldown_prune_after: Duration::from_secs(defaults.cooldown_prune_after_secs),
            engine_timeout: Duration::from_secs(defaults.engine_timeout_minutes * 60),
            board_http_timeout: Duration::from_secs(defaults.board_http_timeout_secs),
            git_timeout: Duration::from_secs(defaults.git_timeout_secs),
            max_retries: defaults.max_retries,
            engine_max_retries: defaults.engine_max_retries,
            max_history: defaults.max_history,
            working_dir: std::env::current_dir().unwrap_or_default(),
        })
    }

    /// Rendered for `--config-status`: every value, secrets masked.
    pub fn status_report(&self) -> String {
        format!(
            "NOTION_TOKEN = {}\nNOTION_BOARD_DB = {}\nTASKS_DIR = {}\nTASKMASTER_DIR = {}\nNOMAD_MAX_CONCURRENT_TASKS = {}\nLLM provider = {:?} ({})\npoll_interval = {:?}\ncooldown = {:?}\nengine_timeout = {:?}\nmax_retries = {}\nengine_max_retries = {}",
            mask_secret(&self.notion_token),
            self.notion_board_db,
            self.tasks_dir.display(),
            self.taskmaster_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_else(|| "(default)".to_string()),
            self.max_concurrent_tasks,
            self.llm_provider,
            mask_secret(&self.llm_api_key),
            self.poll_interval,
            self.cooldown,
            self.engine_timeout,
            self.max_retries,
            self.engine_max_retries,
        )
    }
}

/// Text for `--config-help`: the documented variable table from spec.md §6.
pub fn config_help_text() -> &'static str {
    r#"Environment variables:
  NOTION_TOKEN                   board auth token (required)
  NOTION_BOARD_DB                board database id, 32 hex chars, dashes optional (required)
  TASKS_DIR                      root of on-disk artifacts (required, created if missing)
  TASKMASTER_DIR                 alternative path to the decomposer CLI
  NOMAD_MAX_CONCURRENT_TASKS     refinement pool size (default 3)
  OPENAI_API_KEY                  LLM key (checked first)
  OPENROUTER_API_KEY              LLM key (checked second)
  ANTHROPIC_API_KEY               LLM key (checked third)
  at least one LLM key is required for the refinement pass

Optional nomad.toml overrides non-secret defaults: poll_interval_secs,
cooldown_secs, cooldown_prune_after_secs, engine_timeout_minutes,
board_http_timeout_secs, git_timeout_secs, max_retries,
engine_max_retries, max_history."#
}
