// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Text chunking (spec.md §4.6), grounded on
//! `original_source/core/managers/feedback_manager.py`'s `_chunk_text`.

const MAX_CHUNK_SIZE: usize = 2000;
const BREAK_POINTS: &[&str] = &["\n\n", "\n", ". ", ", ", " "];

/// Split `text` into pieces of at most `MAX_CHUNK_SIZE` characters,
/// preferring to break at `BREAK_POINTS` (in preference order) found after
/// the 70% mark of the current window; falls back to a hard split.
pub fn chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= MAX_CHUNK_SIZE {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let end = (pos + MAX_CHUNK_SIZE).min(chars.len());
        if end >= chars.len() {
            chunks.push(chars[pos..].iter().collect());
            break;
        }

        let window: String = chars[pos..end].iter().collect();
        let min_break = (MAX_CHUNK_SIZE as f64 * 0.7) as usize;
        let mut best_break = None;
        for marker in BREAK_POINTS {
            if let Some(byte_idx) = window.rfind(marker) {
                let start_char_idx = window[..byte_idx].chars().count();
                if start_char_idx > min_break {
                    best_break = Some(start_char_idx + marker.chars().count());
                    break;
                }
            }
        }

        match best_break {
            Some(split_at) => {
                chunks.push(chars[pos..pos + split_at].iter().collect());
                pos += split_at;
            }
            None => {
                chunks.push(chars[pos..end].iter().collect());
                pos = end;
            }
        }
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_under_limit_is_one_chunk() {
        assert_eq!(chunk_text("short text"), vec!["short text".to_string()]);
    }

    #[test]
    fn splits_long_text_at_paragraph_breaks() {
        let para = "x".repeat(1600);
        let text = format!("{para}\n\n{}", "y".repeat(1000));
        let chunks = chunk_text(&text);
        assert!(chunks.len() >= 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
    }

    #[test]
    fn hard_splits_when_no_break_point_available() {
        let text = "a".repeat(5000);
        let chunks = chunk_text(&text);
        assert!(chunks.iter().all(|c| c.chars().count() <= 2000));
        assert_eq!(chunks.iter().map(|c| c.chars().count()).sum::<usize>(), 5000);
    }

    #[test]
    fn reassembled_chunks_equal_original() {
        let para = "word ".repeat(900);
        let chunks = chunk_text(&para);
        assert_eq!(chunks.concat(), para);
    }
}
