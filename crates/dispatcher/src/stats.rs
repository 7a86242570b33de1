// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Process-lifetime counters backing the rolling-success-rate log line
//! (spec.md §4.10 step 5) and `--health-check` output.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountersSnapshot {
    pub cycles: u64,
    pub processed: u64,
    pub succeeded: u64,
    pub failed: u64,
}

impl CountersSnapshot {
    /// `1.0` with nothing processed yet, matching "no evidence of trouble"
    /// rather than a misleading `0.0`.
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            1.0
        } else {
            self.succeeded as f64 / self.processed as f64
        }
    }
}

#[derive(Default)]
pub struct Counters {
    cycles: AtomicU64,
    processed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    pub fn new() -> Self {
        Counters::default()
    }

    pub fn record_cycle(&self) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.succeeded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cycles(&self) -> u64 {
        self.cycles.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}
