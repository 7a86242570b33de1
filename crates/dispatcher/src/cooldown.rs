// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Per-task cool-down tracking (spec.md §4.10 step 4), grounded on
//! `original_source/src/core/processors/multi_status_processor.py`'s
//! `_recently_processed_tasks`/`_last_process_time`/`cooldown_period = 120`.

use nomad_core::Clock;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(120);
pub const DEFAULT_PRUNE_AFTER: Duration = Duration::from_secs(3600);

/// Prevents a page just transitioned by one sub-processor from being picked
/// up again by another in the same or a following cycle before `cooldown`
/// has elapsed. Entries older than `prune_after` are dropped so the map
/// never grows unbounded across a long-running continuous session.
pub struct CooldownTracker {
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    prune_after: Duration,
    marked_at: Mutex<HashMap<String, Instant>>,
}

impl CooldownTracker {
    pub fn new(clock: Arc<dyn Clock>, cooldown: Duration, prune_after: Duration) -> Self {
        CooldownTracker { clock, cooldown, prune_after, marked_at: Mutex::new(HashMap::new()) }
    }

    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        CooldownTracker::new(clock, DEFAULT_COOLDOWN, DEFAULT_PRUNE_AFTER)
    }

    pub fn is_cooling_down(&self, page_id: &str) -> bool {
        let marked_at = self.marked_at.lock();
        match marked_at.get(page_id) {
            Some(at) => self.clock.monotonic_now().duration_since(*at) < self.cooldown,
            None => false,
        }
    }

    pub fn mark(&self, page_id: &str) {
        self.marked_at.lock().insert(page_id.to_string(), self.clock.monotonic_now());
    }

    /// Drop entries older than `prune_after`; called once per dispatch cycle.
    pub fn prune(&self) {
        let now = self.clock.monotonic_now();
        self.marked_at.lock().retain(|_, at| now.duration_since(*at) < self.prune_after);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.marked_at.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nomad_core::FakeClock;

    #[test]
    fn freshly_marked_page_is_cooling_down() {
        let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
        let tracker = CooldownTracker::new(clock.clone() as Arc<dyn Clock>, Duration::from_secs(120), Duration::from_secs(3600));
        tracker.mark("page-1");
        assert!(tracker.is_cooling_down("page-1"));
    }

    #[test]
    fn cooldown_expires_after_the_configured_duration() {
        let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
        let tracker = CooldownTracker::new(clock.clone() as Arc<dyn Clock>, Duration::from_secs(120), Duration::from_secs(3600));
        tracker.mark("page-1");
        clock.advance(Duration::from_secs(121));
        assert!(!tracker.is_cooling_down("page-1"));
    }

    #[test]
    fn unmarked_page_is_never_cooling_down() {
        let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
        let tracker = CooldownTracker::with_defaults(clock as Arc<dyn Clock>);
        assert!(!tracker.is_cooling_down("unknown"));
    }

    #[test]
    fn prune_drops_entries_older_than_prune_after() {
        let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
        let tracker = CooldownTracker::new(clock.clone() as Arc<dyn Clock>, Duration::from_secs(120), Duration::from_secs(3600));
        tracker.mark("page-1");
        clock.advance(Duration::from_secs(3601));
        tracker.prune();
        assert_eq!(tracker.len(), 0);
    }

    #[test]
    fn prune_keeps_recent_entries() {
        let clock = Arc::new(FakeClock::new(chrono::Utc::now()));
        let tracker = CooldownTracker::new(clock.clone() as Arc<dyn Clock>, Duration::from_secs(120), Duration::from_secs(3600));
        tracker.mark("page-1");
        clock.advance(Duration::from_secs(10));
        tracker.prune();
        assert_eq!(tracker.len(), 1);
    }
}
