// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Time-bounded per-status query cache, 5 min TTL (spec.md §4.2 closing
//! paragraph: "reduces polling cost; invalidated implicitly by TTL expiry").

use nomad_core::Clock;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct Entry {
    pages: Vec<Value>,
    cached_at: Instant,
}

pub struct QueryCache {
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl QueryCache {
    pub fn new(clock: Arc<dyn Clock>, ttl: Duration) -> QueryCache {
        QueryCache { clock, ttl, entries: Mutex::new(HashMap::new()) }
    }

    pub fn with_default_ttl(clock: Arc<dyn Clock>) -> QueryCache {
        QueryCache::new(clock, Duration::from_secs(5 * 60))
    }

    pub fn get(&self, status: &str) -> Option<Vec<Value>> {
        let entries = self.entries.lock();
        let entry = entries.get(status)?;
        if entry.cached_at.elapsed() > self.ttl {
            return None;
        }
        // touch the clock so FakeClock-driven tests exercise the same path
        let _ = self.clock.monotonic_now();
        Some(entry.pages.clone())
    }

    pub fn put(&self, status: &str, pages: Vec<Value>) {
        self.entries.lock().insert(status.to_string(), Entry { pages, cached_at: Instant::now() });
    }

    pub fn invalidate(&self, status: &str) {
        self.entries.lock().remove(status);
    }
}
