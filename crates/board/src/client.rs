// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! High-level board operations: the C1 Board Client (spec.md §4.2), layered
//! over `BoardTransport` and `QueryCache`, with exponential backoff from
//! `nomad_retry` on every retryable call.

use crate::blocks::{chunk_blocks, classify_children, extract_body_text, parse_markdown_blocks};
use crate::cache::QueryCache;
use crate::error::BoardError;
use crate::status_codec::{extract_status_value, status_filter, status_update_payload, StatusPropertyShape};
use crate::transport::{BoardTransport, Method};
use nomad_core::Clock;
use nomad_retry::BackoffConfig;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

const DELETE_CONCURRENCY: usize = 5;
const CREATE_CHUNK_CONCURRENCY: usize = 3;
const BLOCK_CHUNK_LIMIT: usize = 100;
const QUERY_PAGE_SIZE: u32 = 100;

pub struct BoardClient<T: BoardTransport> {
    transport: T,
    database_id: String,
    backoff: BackoffConfig,
    cache: QueryCache,
}

/// One page of query results as returned to callers: raw JSON pages plus an
/// opaque cursor for the next page, if any.
pub struct QueryPage {
    pub pages: Vec<Value>,
    pub next_cursor: Option<String>,
}

impl<T: BoardTransport> BoardClient<T> {
    pub fn new(transport: T, database_id: impl Into<String>, backoff: BackoffConfig, clock: Arc<dyn Clock>) -> BoardClient<T> {
        BoardClient { transport, database_id: database_id.into(), backoff, cache: QueryCache::with_default_ttl(clock) }
    }

    async fn retrying<F, Fut>(&self, label: &'static str, f: F) -> Result<Value, BoardError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<Value, BoardError>>,
    {
        nomad_retry::retry_async(self.backoff, BoardError::is_retryable, f).await.map_err(|e| {
            if e.is_retryable() {
                warn!(label, error = %e, "board call exhausted retries");
            }
            e
        })
    }

    /// `GET /databases/{db}` → the raw properties schema map.
    pub async fn retrieve_schema(&self) -> Result<Value, BoardError> {
        let path = format!("/databases/{}", self.database_id);
        let resp = self.retrying("retrieve_schema", || async { Ok(self.transport.request(Method::Get, &path, None).await?.body) }).await?;
        Ok(resp)
    }

    async fn status_property_shape(&self) -> Result<StatusPropertyShape, BoardError> {
        let schema = self.retrieve_schema().await?;
        let properties = schema.get("properties").and_then(|v| v.as_object()).cloned().unwrap_or_default();
        let status_prop = properties.get("Status").ok_or_else(|| BoardError::StatusPropertyMissing(properties.keys().cloned().collect()))?;
        let type_tag = status_prop.get("type").and_then(|v| v.as_str()).unwrap_or("unknown");
        Ok(StatusPropertyShape::from_schema_type(type_tag))
    }

    /// `create_status_filter(value)` (spec.md §4.2).
    pub async fn create_status_filter(&self, value: &str) -> Result<Value, BoardError> {
        let shape = self.status_property_shape().await?;
        Ok(status_filter(shape, value))
    }

    /// One page of `query_by_status`; does not consult or populate the cache
    /// (callers needing the cached, fully-paginated view use
    /// `query_by_status_cached`).
    pub async fn query_by_status(&self, status: &str, cursor: Option<&str>, page_size: u32) -> Result<QueryPage, BoardError> {
        let filter = self.create_status_filter(status).await?;
        let mut body = json!({ "filter": filter, "page_size": page_size.min(QUERY_PAGE_SIZE) });
        if let Some(c) = cursor {
            body["start_cursor"] = json!(c);
        }
        let path = format!("/databases/{}/query", self.database_id);
        let resp = self.retrying("query_by_status", || async { Ok(self.transport.request(Method::Post, &path, Some(body.clone())).await?.body) }).await?;
        let results = resp.get("results").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        let next_cursor = if resp.get("has_more").and_then(|v| v.as_bool()).unwrap_or(false) {
            resp.get("next_cursor").and_then(|v| v.as_str()).map(str::to_string)
        } else {
            None
        };
        Ok(QueryPage { pages: results, next_cursor })
    }

    /// Fully paginated, cached view of all pages currently in `status`.
    pub async fn query_by_status_cached(&self, status: &str) -> Result<Vec<Value>, BoardError> {
        if let Some(cached) = self.cache.get(status) {
            return Ok(cached);
        }
        let mut all = Vec::new();
        let mut cursor = None;
        loop {
            let page = self.query_by_status(status, cursor.as_deref(), QUERY_PAGE_SIZE).await?;
            all.extend(page.pages);
            match page.next_cursor {
                Some(c) => cursor = Some(c),
                None => break,
            }
        }
        self.cache.put(status, all.clone());
        Ok(all)
    }

    /// `GET /pages/{id}`.
    pub async fn get_page(&self, page_id: &str) -> Result<Value, BoardError> {
        let path = format!("/pages/{page_id}");
        self.retrying("get_page", || async { Ok(self.transport.request(Method::Get, &path, None).await?.body) }).await
    }

    /// `PATCH /pages/{id}` with an arbitrary `properties` payload.
    pub async fn patch_properties(&self, page_id: &str, properties: Value) -> Result<Value, BoardError> {
        let path = format!("/pages/{page_id}");
        let body = json!({ "properties": properties });
        self.retrying("patch_properties", || async { Ok(self.transport.request(Method::Patch, &path, Some(body.clone())).await?.body) }).await
    }

    /// `update_status(id, value)`: resolves the schema shape, patches, and
    /// invalidates both the old and new status's cached query.
    pub async fn update_status(&self, page_id: &str, old_status: &str, new_status: &str) -> Result<Value, BoardError> {
        let shape = self.status_property_shape().await?;
        let payload = status_update_payload(shape, new_status);
        let properties = payload.get("properties").cloned().unwrap_or(json!({}));
        let result = self.patch_properties(page_id, properties).await?;
        self.cache.invalidate(old_status);
        self.cache.invalidate(new_status);
        Ok(result)
    }

    pub fn read_status(&self, page: &Value) -> Option<String> {
        page.get("properties").and_then(|p| p.get("Status")).and_then(extract_status_value)
    }

    /// Read the page's current body as plain text, one block per line
    /// (spec.md §4.8 step 1).
    pub async fn read_body_text(&self, page_id: &str) -> Result<String, BoardError> {
        let children = self.list_children(page_id).await?;
        Ok(extract_body_text(&children))
    }

    /// Rich-text child-block replacement (spec.md §4.2 steps 1-6).
    pub async fn replace_child_blocks(&self, page_id: &str, markdown: &str) -> Result<(), BoardError> {
        let existing = self.list_children(page_id).await?;
        let (leaves, parents) = classify_children(&existing);

        self.delete_blocks_concurrently(&leaves).await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        self.delete_blocks_concurrently(&parents).await;

        let new_blocks = parse_markdown_blocks(markdown);
        let chunks = chunk_blocks(new_blocks, BLOCK_CHUNK_LIMIT);
        self.append_block_chunks(page_id, chunks).await
    }

    async fn list_children(&self, page_id: &str) -> Result<Vec<Value>, BoardError> {
        let path = format!("/blocks/{page_id}/children");
        let resp = self.retrying("list_children", || async { Ok(self.transport.request(Method::Get, &path, None).await?.body) }).await?;
        Ok(resp.get("results").and_then(|v| v.as_array()).cloned().unwrap_or_default())
    }

    async fn delete_blocks_concurrently(&self, block_ids: &[String]) {
        let semaphore = Arc::new(Semaphore::new(DELETE_CONCURRENCY));
        let futures = block_ids.iter().map(|id| {
            let permit = semaphore.clone();
            let path = format!("/blocks/{id}");
            async move {
                let _permit = permit.acquire().await;
                self.delete_one_block(&path).await;
            }
        });
        futures::future::join_all(futures).await;
    }

    async fn delete_one_block(&self, path: &str) {
        match self.transport.request(Method::Delete, path, None).await {
            Ok(_) => {}
            Err(BoardError::Status { status: 404, .. }) => {}
            Err(BoardError::Status { status: 429, .. }) => {
                tokio::time::sleep(Duration::from_secs(1)).await;
                if let Err(e) = self.transport.request(Method::Delete, path, None).await {
                    warn!(path, error = %e, "block delete retry after 429 failed, skipping");
                }
            }
            Err(BoardError::Status { status: 409, .. }) => {
                tokio::time::sleep(Duration::from_secs(2)).await;
                if let Err(e) = self.transport.request(Method::Delete, path, None).await {
                    warn!(path, error = %e, "block delete retry after 409 failed, skipping");
                }
            }
            Err(e) => warn!(path, error = %e, "block delete failed, skipping (non-fatal)"),
        }
    }

    async fn append_block_chunks(&self, page_id: &str, chunks: Vec<Vec<Value>>) -> Result<(), BoardError> {
        let semaphore = Arc::new(Semaphore::new(CREATE_CHUNK_CONCURRENCY));
        let path = format!("/blocks/{page_id}/children");
        let futures = chunks.into_iter().map(|chunk| {
            let permit = semaphore.clone();
            let path = path.clone();
            let body = json!({ "children": chunk });
            async move {
                let _permit = permit.acquire().await;
                self.retrying("append_block_chunk", || async { Ok(self.transport.request(Method::Patch, &path, Some(body.clone())).await?.body) }).await
            }
        });
        for result in futures::future::join_all(futures).await {
            result?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
