// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! The LLM seam for refinement (spec.md §4.8 step 2), mirroring
//! `nomad_board::transport::BoardTransport`'s trait-plus-fake split so the
//! pool's pipeline logic is exercised without a live provider.

use async_trait::async_trait;
use std::time::Duration;

pub const SYSTEM_PROMPT: &str = "You are a technical project planner. Given a raw task description, \
rewrite it into a clear, actionable specification: goals, constraints, and acceptance criteria. \
Respond with markdown only, no commentary.";

fn user_prompt(body: &str) -> String {
    format!("Raw task description:\n\n{body}\n\nProduce the refined specification.")
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String>;
}

/// Assemble the fixed system+user prompt from the page body and call `llm`.
pub async fn refine_body(llm: &dyn LlmClient, body: &str) -> Result<String, String> {
    llm.complete(SYSTEM_PROMPT, &user_prompt(body)).await
}

/// OpenAI-chat-completions-shaped client, generic enough to front any
/// compatible endpoint (configured via `base_url`).
pub struct HttpLlmClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl HttpLlmClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self, String> {
        let client = reqwest::Client::builder().timeout(timeout).build().map_err(|e| e.to_string())?;
        Ok(HttpLlmClient { client, base_url: base_url.into(), api_key: api_key.into(), model: model.into() })
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String> {
        let url = format!("{}/chat/completions", self.base_url);
        let payload = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        let response = self.client.post(&url).bearer_auth(&self.api_key).json(&payload).send().await.map_err(|e| e.to_string())?;
        let status = response.status();
        let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("llm provider returned status {status}: {body}"));
        }

        body.get("choices")
            .and_then(|c| c.as_array())
            .and_then(|c| c.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(|| "llm response had no message content".to_string())
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::LlmClient;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Records every prompt it receives and returns a fixed (or per-call
    /// queued) response; can be made to fail on demand.
    pub struct FakeLlmClient {
        responses: Mutex<Vec<Result<String, String>>>,
        default_response: String,
        pub received_prompts: Mutex<Vec<(String, String)>>,
    }

    impl FakeLlmClient {
        pub fn new(default_response: impl Into<String>) -> Self {
            FakeLlmClient { responses: Mutex::new(Vec::new()), default_response: default_response.into(), received_prompts: Mutex::new(Vec::new()) }
        }

        pub fn queue_response(&self, response: Result<String, String>) {
            self.responses.lock().push(response);
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlmClient {
        async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, String> {
            self.received_prompts.lock().push((system_prompt.to_string(), user_prompt.to_string()));
            if !self.responses.lock().is_empty() {
                return self.responses.lock().remove(0);
            }
            Ok(self.default_response.clone())
        }
    }
}
