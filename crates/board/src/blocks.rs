// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Markdown -> block payload parsing, and leaf/parent classification of
//! existing children, for `replace_child_blocks` (spec.md §4.2 step 2 and 5).

use serde_json::{json, Value};

/// Block types with no children and common inline content; everything else
/// (or `has_children == true`) is treated as a parent and deleted last.
const LEAF_TYPES: &[&str] = &["paragraph", "heading_1", "heading_2", "heading_3", "bulleted_list_item", "numbered_list_item", "to_do", "quote"];

pub fn is_leaf(block_type: &str, has_children: bool) -> bool {
    !has_children && LEAF_TYPES.contains(&block_type)
}

/// Split `existing` (each with `id`, `type`, `has_children`) into (leaves, parents)
/// block ids, preserving original order within each group.
pub fn classify_children(existing: &[Value]) -> (Vec<String>, Vec<String>) {
    let mut leaves = Vec::new();
    let mut parents = Vec::new();
    for block in existing {
        let id = match block.get("id").and_then(|v| v.as_str()) {
            Some(id) => id.to_string(),
            None => continue,
        };
        let block_type = block.get("type").and_then(|v| v.as_str()).unwrap_or("unknown");
        let has_children = block.get("has_children").and_then(|v| v.as_bool()).unwrap_or(false);
        if is_leaf(block_type, has_children) {
            leaves.push(id);
        } else {
            parents.push(id);
        }
    }
    (leaves, parents)
}

/// Parse markdown into new block payloads per spec.md §4.2 step 5 precedence:
/// `# ` heading_1, `## ` heading_2, `### ` heading_3, `- ` bulleted_list_item,
/// else paragraph. Blocks are separated on blank-line boundaries.
pub fn parse_markdown_blocks(markdown: &str) -> Vec<Value> {
    markdown
        .split("\n\n")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(markdown_chunk_to_block)
        .collect()
}

fn markdown_chunk_to_block(chunk: &str) -> Value {
    let first_line = chunk.lines().next().unwrap_or("");
    if let Some(text) = first_line.strip_prefix("### ") {
        heading_block("heading_3", text, chunk)
    } else if let Some(text) = first_line.strip_prefix("## ") {
        heading_block("heading_2", text, chunk)
    } else if let Some(text) = first_line.strip_prefix("# ") {
        heading_block("heading_1", text, chunk)
    } else if let Some(text) = first_line.strip_prefix("- ") {
        rich_text_block("bulleted_list_item", text)
    } else {
        rich_text_block("paragraph", chunk)
    }
}

fn heading_block(heading_type: &str, text: &str, _full_chunk: &str) -> Value {
    rich_text_block(heading_type, text)
}

fn rich_text_block(block_type: &str, text: &str) -> Value {
    json!({
        "object": "block",
        "type": block_type,
        block_type: {
            "rich_text": [{ "type": "text", "text": { "content": text } }]
        }
    })
}

/// Split `blocks` into chunks no larger than `limit` (provider limit 100), in order.
pub fn chunk_blocks(blocks: Vec<Value>, limit: usize) -> Vec<Vec<Value>> {
    blocks.chunks(limit.max(1)).map(<[Value]>::to_vec).collect()
}

/// Concatenate the plain text of each block's `rich_text` run, one block
/// per line, for refinement's "read page rich-text body" step (spec.md
/// §4.8 step 1).
pub fn extract_body_text(blocks: &[Value]) -> String {
    blocks
        .iter()
        .filter_map(|block| {
            let block_type = block.get("type").and_then(|v| v.as_str())?;
            let rich_text = block.get(block_type)?.get("rich_text")?.as_array()?;
            let text: String = rich_text.iter().filter_map(|run| run.get("plain_text").and_then(|v| v.as_str())).collect();
            (!text.is_empty()).then_some(text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_leaf_and_parent_blocks() {
        let existing = vec![
            json!({"id": "a", "type": "paragraph", "has_children": false}),
            json!({"id": "b", "type": "toggle", "has_children": true}),
            json!({"id": "c", "type": "bulleted_list_item", "has_children": false}),
        ];
        let (leaves, parents) = classify_children(&existing);
        assert_eq!(leaves, vec!["a", "c"]);
        assert_eq!(parents, vec!["b"]);
    }

    #[test]
    fn heading_precedence_prefers_longest_prefix() {
        let blocks = parse_markdown_blocks("### Sub\n\n## Mid\n\n# Top\n\n- item\n\nplain text");
        assert_eq!(blocks[0]["type"], "heading_3");
        assert_eq!(blocks[1]["type"], "heading_2");
        assert_eq!(blocks[2]["type"], "heading_1");
        assert_eq!(blocks[3]["type"], "bulleted_list_item");
        assert_eq!(blocks[4]["type"], "paragraph");
    }

    #[test]
    fn blank_lines_separate_paragraphs() {
        let blocks = parse_markdown_blocks("first paragraph\n\nsecond paragraph");
        assert_eq!(blocks.len(), 2);
    }

    #[test]
    fn chunking_respects_limit() {
        let blocks: Vec<Value> = (0..250).map(|i| json!({"i": i})).collect();
        let chunks = chunk_blocks(blocks, 100);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].len(), 100);
        assert_eq!(chunks[2].len(), 50);
    }

    #[test]
    fn empty_markdown_yields_no_blocks() {
        assert!(parse_markdown_blocks("   \n\n  ").is_empty());
    }

    #[test]
    fn extracts_body_text_from_typed_blocks_in_order() {
        let blocks = vec![
            json!({"type": "heading_1", "heading_1": {"rich_text": [{"plain_text": "Title"}]}}),
            json!({"type": "paragraph", "paragraph": {"rich_text": [{"plain_text": "First"}, {"plain_text": " line"}]}}),
            json!({"type": "divider", "divider": {}}),
        ];
        assert_eq!(extract_body_text(&blocks), "Title\nFirst line");
    }

    #[test]
    fn extract_body_text_skips_blocks_with_no_rich_text() {
        assert_eq!(extract_body_text(&[json!({"type": "divider", "divider": {}})]), "");
    }
}
