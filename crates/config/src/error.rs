// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),
    #[error("{0} must be 32 hex characters (dashes optional), got {1:?}")]
    InvalidBoardId(&'static str, String),
    #[error("no LLM API key found: set one of OPENAI_API_KEY, OPENROUTER_API_KEY, ANTHROPIC_API_KEY")]
    MissingLlmKey,
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    ParseFile {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to create TASKS_DIR {path}: {source}")]
    CreateTasksDir {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
