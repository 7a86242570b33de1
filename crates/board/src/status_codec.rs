// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Encodes/decodes the board's polymorphic Status property (spec.md §4.2,
//! grounded on `original_source/build/lib/clients/notion_wrapper.py`'s
//! `get_status_property_type`/`create_status_filter`/`update_page_status`).

use serde_json::{json, Value};

/// The physical shape the board's schema reports for the `Status` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPropertyShape {
    Select,
    Status,
    MultiSelect,
    /// Schema reported something else; update falls back to `Status`, reads
    /// probe every known shape.
    Unknown,
}

impl StatusPropertyShape {
    pub fn from_schema_type(type_tag: &str) -> StatusPropertyShape {
        match type_tag {
            "select" => StatusPropertyShape::Select,
            "status" => StatusPropertyShape::Status,
            "multi_select" => StatusPropertyShape::MultiSelect,
            _ => StatusPropertyShape::Unknown,
        }
    }
}

/// Build the query filter for `{"property":"Status", ...}` given the observed shape.
pub fn status_filter(shape: StatusPropertyShape, value: &str) -> Value {
    match shape {
        StatusPropertyShape::Select | StatusPropertyShape::Unknown => json!({
            "property": "Status",
            "select": { "equals": value }
        }),
        StatusPropertyShape::Status => json!({
            "property": "Status",
            "status": { "equals": value }
        }),
        StatusPropertyShape::MultiSelect => json!({
            "property": "Status",
            "multi_select": { "contains": value }
        }),
    }
}

/// Build the `properties` payload for a `PATCH /pages/{id}` status update.
/// Unknown shapes fall back to the `status` wire shape, per spec.md §4.2.
pub fn status_update_payload(shape: StatusPropertyShape, value: &str) -> Value {
    let inner = match shape {
        StatusPropertyShape::Select => json!({ "select": { "name": value } }),
        StatusPropertyShape::Status | StatusPropertyShape::Unknown => {
            json!({ "status": { "name": value } })
        }
        StatusPropertyShape::MultiSelect => json!({ "multi_select": [{ "name": value }] }),
    };
    json!({ "properties": { "Status": inner } })
}

/// Extract the textual status value from a page's `properties.Status` object,
/// trying whichever inner shape is actually present (read side is shape-agnostic).
pub fn extract_status_value(status_property: &Value) -> Option<String> {
    if let Some(name) = status_property.get("status").and_then(|s| s.get("name")) {
        return name.as_str().map(str::to_string);
    }
    if let Some(name) = status_property.get("select").and_then(|s| s.get("name")) {
        return name.as_str().map(str::to_string);
    }
    if let Some(arr) = status_property.get("multi_select").and_then(|v| v.as_array()) {
        return arr.first().and_then(|v| v.get("name")).and_then(|n| n.as_str()).map(str::to_string);
    }
    None
}
