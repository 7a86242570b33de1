// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Exponential backoff and retryable-error classification (spec.md §4.2,
//! §9 "Backoff + jitter").
//!
//! `delay = 2^attempt + jitter(0..1)` seconds, capped by `max_retries`
//! (default 3). The jitter source is pluggable so tests can make it
//! deterministic without losing the `0..1` second shape spec.md calls for.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Backoff policy: number of retries and the source of jitter.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BackoffConfig {
    pub max_retries: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        BackoffConfig { max_retries: 3 }
    }
}

/// Compute the delay before retry attempt `attempt` (0-indexed: the delay
/// before the *first* retry uses `attempt = 0`). Jitter is in `[0, 1)`
/// seconds, supplied by the caller so it can be seeded in tests.
pub fn backoff_delay(attempt: u32, jitter_seconds: f64) -> Duration {
    let base = 2u64.saturating_pow(attempt.min(32));
    Duration::from_secs_f64(base as f64 + jitter_seconds.clamp(0.0, 1.0))
}

/// Draw a fresh `[0, 1)` jitter value from the thread RNG.
pub fn random_jitter() -> f64 {
    rand::rng().random_range(0.0..1.0)
}

/// Message-based retryability check (spec.md §4.2): the error message
/// contains one of a small set of transient-failure markers.
pub fn is_retryable_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    ["rate", "429", "timeout", "connection"]
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Run `f` up to `config.max_retries + 1` total attempts, retrying only
/// when `is_retryable` returns true for the error, sleeping
/// `backoff_delay(attempt, random_jitter())` between attempts.
pub async fn retry_async<T, E, F, Fut>(
    config: BackoffConfig,
    is_retryable: impl Fn(&E) -> bool,
    mut f: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let mut attempt = 0;
    loop {
        match f().await {
            Ok(v) => return Ok(v),
            Err(e) => {
                if attempt >= config.max_retries || !is_retryable(&e) {
                    return Err(e);
                }
                tokio::time::sleep(backoff_delay(attempt, random_jitter())).await;
                attempt += 1;
            }
        }
    }
}
