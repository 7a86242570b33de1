// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Deterministic branch-name sanitization (spec.md §4.4.1), grounded on
//! `original_source/core/services/branch_service.py`'s
//! `TaskNameValidator.sanitize_task_name`/`is_valid_branch_name`.

use regex::Regex;
use std::sync::OnceLock;

const MAX_BRANCH_NAME_LENGTH: usize = 250;

#[allow(clippy::expect_used)]
fn whitespace_or_underscore_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s_]+").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn dot_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.\.+").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn slash_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"//+").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn hyphen_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"-+").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn dropped_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[~^:?*\[\]\\@{}]").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn control_bytes() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\x00-\x1f\x7f]").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn clean_task_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9-]").expect("static regex"))
}

#[allow(clippy::expect_used)]
fn clean_task_id_alnum_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").expect("static regex"))
}

/// Sanitize `task_title` into a branch-safe slug and prepend a sanitized
/// `task_id`, applying every rule from spec.md §4.4.1 in order, then
/// falling back to `task-<cleaned_id>-<unix_seconds>` if validation fails.
pub fn sanitize_task_name(task_title: &str, task_id: &str, unix_seconds_fallback: u64) -> String {
    let trimmed = task_title.trim();
    let mut name = if trimmed.is_empty() {
        fallback_unnamed(task_id)
    } else {
        let mut s = trimmed.to_string();
        s = whitespace_or_underscore_run().replace_all(&s, "-").into_owned();
        s = dropped_chars().replace_all(&s, "").into_owned();
        s = s.replace(['<', '>', '|', '"'], "-");
        s = dot_run().replace_all(&s, ".").into_owned();
        s = slash_run().replace_all(&s, "/").into_owned();
        s = s.trim_matches(|c| c == '.' || c == '/').to_string();
        s = control_bytes().replace_all(&s, "").into_owned();
        s = hyphen_run().replace_all(&s, "-").into_owned();
        s = s.trim_matches('-').to_string();
        if s.is_empty() {
            fallback_unnamed(task_id)
        } else {
            s
        }
    };

    if !task_id.is_empty() {
        let cleaned_id = clean_task_id().replace_all(task_id, "").into_owned();
        if !cleaned_id.is_empty() {
            name = format!("{cleaned_id}-{name}");
        }
    }

    if name.chars().count() > MAX_BRANCH_NAME_LENGTH {
        name = truncate_chars(&name, MAX_BRANCH_NAME_LENGTH).trim_end_matches('-').to_string();
    }

    if !is_valid_branch_name(&name) {
        let safe_id = clean_task_id_alnum_only().replace_all(task_id, "").into_owned();
        let safe_id = if safe_id.is_empty() { "unnamed".to_string() } else { safe_id };
        name = format!("task-{safe_id}-{unix_seconds_fallback}");
    }

    name
}

/// Truncate to at most `max_chars` characters, matching the original
/// Python's `branch_name[:250]` (character slicing, not byte slicing) so a
/// multibyte title never gets cut mid-codepoint.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

fn fallback_unnamed(task_id: &str) -> String {
    if task_id.is_empty() {
        "task-unnamed".to_string()
    } else {
        format!("task-{task_id}")
    }
}

/// Matches any of the invalid patterns spec.md §4.4.1 lists for the
/// final-validation step.
pub fn is_valid_branch_name(name: &str) -> bool {
    if name.is_empty() || name.chars().count() > MAX_BRANCH_NAME_LENGTH {
        return false;
    }
    if name.contains("..") {
        return false;
    }
    if name.starts_with('.') || name.ends_with('.') {
        return false;
    }
    if name.ends_with(".lock") {
        return false;
    }
    if control_bytes().is_match(name) {
        return false;
    }
    if name.ends_with(' ') || name.ends_with('\t') {
        return false;
    }
    if dropped_chars().is_match(name) {
        return false;
    }
    if name.contains("@{") {
        return false;
    }
    if name.contains("//") {
        return false;
    }
    if name.starts_with('/') || name.ends_with('/') {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_whitespace_and_underscores_with_hyphens() {
        let name = sanitize_task_name("fix login bug_report", "NOMAD-1", 1700000000);
        assert_eq!(name, "NOMAD-1-fix-login-bug-report");
    }

    #[test]
    fn strips_invalid_characters() {
        let name = sanitize_task_name("weird: name?*[x]", "NOMAD-2", 1700000000);
        assert!(!name.contains(':'));
        assert!(!name.contains('?'));
        assert!(!name.contains('*'));
    }

    #[test]
    fn collapses_dots_and_slashes() {
        let name = sanitize_task_name("path//to...thing", "", 1700000000);
        assert!(!name.contains(".."));
        assert!(!name.contains("//"));
    }

    #[test]
    fn empty_title_falls_back_to_task_id() {
        let name = sanitize_task_name("   ", "NOMAD-9", 1700000000);
        assert_eq!(name, "task-NOMAD-9");
    }

    #[test]
    fn empty_title_and_id_falls_back_to_unnamed() {
        let name = sanitize_task_name("", "", 1700000000);
        assert_eq!(name, "task-unnamed");
    }

    #[test]
    fn truncates_overlong_names() {
        let long_title = "x".repeat(400);
        let name = sanitize_task_name(&long_title, "NOMAD-1", 1700000000);
        assert!(name.len() <= MAX_BRANCH_NAME_LENGTH);
    }

    #[test]
    fn truncates_overlong_multibyte_names_without_panicking() {
        let long_title = "\u{4e2d}".repeat(400);
        let name = sanitize_task_name(&long_title, "NOMAD-1", 1700000000);
        assert!(name.chars().count() <= MAX_BRANCH_NAME_LENGTH);
        assert!(name.is_char_boundary(name.len()));
    }

    #[test]
    fn validator_rejects_known_bad_shapes() {
        assert!(!is_valid_branch_name("a..b"));
        assert!(!is_valid_branch_name(".hidden"));
        assert!(!is_valid_branch_name("trailing."));
        assert!(!is_valid_branch_name("has space "));
        assert!(!is_valid_branch_name("weird~name"));
        assert!(!is_valid_branch_name("a@{b"));
        assert!(!is_valid_branch_name("a//b"));
        assert!(!is_valid_branch_name("/leading"));
        assert!(!is_valid_branch_name("trailing/"));
        assert!(!is_valid_branch_name("index.lock"));
        assert!(is_valid_branch_name("NOMAD-1-fix-login"));
    }
}
