// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Low-level HTTP transport seam, so `BoardClient`'s retry/backoff/pagination
//! logic can be exercised against an in-memory fake (see `fake.rs`) without a
//! live board. Mirrors the reqwest-blocking-then-async split shown by
//! `shipper-webhook`'s `send_webhook`/`send_webhook_async`.

use crate::error::BoardError;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait BoardTransport: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse, BoardError>;
}

pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Thin reqwest-backed transport. The provider base URL and auth header are
/// fixed at construction time.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Duration) -> Result<HttpTransport, BoardError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpTransport { client, base_url: base_url.into(), token: token.into() })
    }
}

#[async_trait]
impl BoardTransport for HttpTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse, BoardError> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = match method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Patch => self.client.patch(&url),
            Method::Delete => self.client.delete(&url),
        };
        req = req
            .bearer_auth(&self.token)
            .header("Notion-Version", DEFAULT_NOTION_VERSION)
            .header("Content-Type", "application/json");
        if let Some(body) = body {
            req = req.json(&body);
        }

        let response = req.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let parsed = if text.is_empty() { Value::Null } else { serde_json::from_str(&text)? };

        if !(200..300).contains(&status) {
            return Err(BoardError::Status { status, body: text });
        }
        Ok(RawResponse { status, body: parsed })
    }
}
