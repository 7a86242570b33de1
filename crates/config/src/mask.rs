// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Secret masking shared by `--config-status` and the feedback/logging layers
//! (spec.md §7: "sensitive values masked").

/// Mask everything but the last 4 characters of `secret`. Strings shorter
/// than 5 characters are fully masked (nothing useful to leave visible).
pub fn mask_secret(secret: &str) -> String {
    let len = secret.chars().count();
    if len <= 4 {
        return "*".repeat(len.max(4));
    }
    let keep = 4;
    let masked_len = len - keep;
    let tail: String = secret.chars().skip(masked_len).collect();
    format!("{}{}", "*".repeat(masked_len), tail)
}

/// Replace any substring of `text` that looks like a bearer token, API key,
/// or other secret-shaped value with a masked placeholder, so feedback
/// entries and log lines never carry credentials verbatim.
pub fn mask_secrets_in_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for word in text.split_inclusive(char::is_whitespace) {
        let trimmed = word.trim_end();
        let trailing = &word[trimmed.len()..];
        if looks_like_secret(trimmed) {
            out.push_str(&mask_secret(trimmed));
        } else {
            out.push_str(trimmed);
        }
        out.push_str(trailing);
    }
    out
}

fn looks_like_secret(token: &str) -> bool {
    let prefixes = ["sk-", "Bearer ", "ghp_", "gho_", "ntn_"];
    if prefixes.iter().any(|p| token.starts_with(p)) {
        return true;
    }
    token.len() >= 20 && token.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
