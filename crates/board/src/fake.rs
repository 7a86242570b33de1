// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! In-memory `BoardTransport` used by tests (and available to downstream
//! crates under the `test-support` feature) so `BoardClient` logic is
//! exercised without a live board, the way `EffortlessMetrics-shipper`'s
//! crates isolate I/O behind small trait seams for fakes.

use crate::error::BoardError;
use crate::transport::{BoardTransport, Method, RawResponse};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;

struct FakePage {
    properties: Value,
    children: Vec<Value>,
}

pub struct FakeTransport {
    schema: Value,
    pages: Mutex<HashMap<String, FakePage>>,
    /// Queue of forced (status, body) responses for the next N requests
    /// matching `path_contains`, consumed in order. Lets tests simulate a
    /// 429-then-success sequence.
    pub injected_failures: Mutex<HashMap<String, Vec<u16>>>,
}

impl FakeTransport {
    pub fn new(status_property_type: &str) -> FakeTransport {
        FakeTransport {
            schema: json!({ "properties": { "Status": { "type": status_property_type } } }),
            pages: Mutex::new(HashMap::new()),
            injected_failures: Mutex::new(HashMap::new()),
        }
    }

    pub fn insert_page(&self, page_id: &str, status_value: &str, status_type: &str) {
        let status_inner = match status_type {
            "select" => json!({ "name": status_value }),
            "multi_select" => json!([{ "name": status_value }]),
            _ => json!({ "name": status_value }),
        };
        let key = match status_type {
            "select" => "select",
            "multi_select" => "multi_select",
            _ => "status",
        };
        self.pages.lock().insert(
            page_id.to_string(),
            FakePage { properties: json!({ "Status": { key: status_inner } }), children: Vec::new() },
        );
    }

    pub fn set_children(&self, page_id: &str, children: Vec<Value>) {
        if let Some(page) = self.pages.lock().get_mut(page_id) {
            page.children = children;
        }
    }

    pub fn children_of(&self, page_id: &str) -> Vec<Value> {
        self.pages.lock().get(page_id).map(|p| p.children.clone()).unwrap_or_default()
    }

    /// Queue a sequence of forced statuses for calls whose path contains `marker`.
    pub fn inject_failure_sequence(&self, marker: &str, statuses: Vec<u16>) {
        self.injected_failures.lock().insert(marker.to_string(), statuses);
    }

    fn take_injected(&self, path: &str) -> Option<u16> {
        let mut injected = self.injected_failures.lock();
        for (marker, queue) in injected.iter_mut() {
            if path.contains(marker.as_str()) && !queue.is_empty() {
                return Some(queue.remove(0));
            }
        }
        None
    }
}

#[async_trait]
impl BoardTransport for FakeTransport {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<RawResponse, BoardError> {
        if let Some(status) = self.take_injected(path) {
            if status >= 300 {
                return Err(BoardError::Status { status, body: String::new() });
            }
        }

        if path.starts_with("/databases/") && path.ends_with("/query") {
            let pages = self.pages.lock();
            let results: Vec<Value> = pages
                .iter()
                .map(|(id, p)| json!({ "id": id, "properties": p.properties }))
                .collect();
            return Ok(RawResponse { status: 200, body: json!({ "results": results, "has_more": false, "next_cursor": null }) });
        }
        if path.starts_with("/databases/") {
            return Ok(RawResponse { status: 200, body: self.schema.clone() });
        }
        if let Some(page_id) = path.strip_prefix("/pages/") {
            match method {
                Method::Get => {
                    let pages = self.pages.lock();
                    let page = pages.get(page_id).ok_or_else(|| BoardError::Status { status: 404, body: String::new() })?;
                    return Ok(RawResponse { status: 200, body: json!({ "id": page_id, "properties": page.properties }) });
                }
                Method::Patch => {
                    let mut pages = self.pages.lock();
                    let page = pages.get_mut(page_id).ok_or_else(|| BoardError::Status { status: 404, body: String::new() })?;
                    if let Some(props) = body.and_then(|b| b.get("properties").cloned()) {
                        merge_json(&mut page.properties, &props);
                    }
                    return Ok(RawResponse { status: 200, body: json!({ "id": page_id, "properties": page.properties }) });
                }
                _ => {}
            }
        }
        if let Some(rest) = path.strip_prefix("/blocks/") {
            if let Some(page_id) = rest.strip_suffix("/children") {
                match method {
                    Method::Get => {
                        let children = self.children_of(page_id);
                        return Ok(RawResponse { status: 200, body: json!({ "results": children }) });
                    }
                    Method::Patch => {
                        let new_children = body.and_then(|b| b.get("children").cloned()).and_then(|v| v.as_array().cloned()).unwrap_or_default();
                        if let Some(page) = self.pages.lock().get_mut(page_id) {
                            page.children.extend(new_children.clone());
                        }
                        return Ok(RawResponse { status: 200, body: json!({ "results": new_children }) });
                    }
                    _ => {}
                }
            } else if method == Method::Delete {
                let block_id = rest;
                for page in self.pages.lock().values_mut() {
                    page.children.retain(|c| c.get("id").and_then(|v| v.as_str()) != Some(block_id));
                }
                return Ok(RawResponse { status: 200, body: json!({}) });
            }
        }

        Ok(RawResponse { status: 404, body: json!({ "error": "no fake route" }) })
    }
}

fn merge_json(dest: &mut Value, src: &Value) {
    if let (Some(dest_obj), Some(src_obj)) = (dest.as_object_mut(), src.as_object()) {
        for (k, v) in src_obj {
            dest_obj.insert(k.clone(), v.clone());
        }
    }
}
