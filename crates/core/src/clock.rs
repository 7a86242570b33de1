// SPDX-License-Identifier: MIT
// Copyright (c) 2026 nomad contributors

//! Clock abstraction so cooldown, backoff, and timestamp logic is testable
//! without sleeping in real time.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait Clock: Send + Sync {
    /// Wall-clock time, used for feedback timestamps and backup filenames.
    fn now_utc(&self) -> DateTime<Utc>;
    /// Monotonic instant, used for cooldowns and elapsed-time measurement.
    fn monotonic_now(&self) -> Instant;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn monotonic_now(&self) -> Instant {
        Instant::now()
    }
}

/// A controllable clock for tests: `now_utc` advances only when told to,
/// `monotonic_now` is anchored to process start plus an explicit offset.
#[derive(Clone)]
pub struct FakeClock {
    inner: Arc<Mutex<FakeClockState>>,
}

struct FakeClockState {
    utc: DateTime<Utc>,
    monotonic_base: Instant,
    offset: Duration,
}

impl FakeClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        FakeClock {
            inner: Arc::new(Mutex::new(FakeClockState {
                utc: start,
                monotonic_base: Instant::now(),
                offset: Duration::ZERO,
            })),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut state = self.inner.lock();
        state.utc += chrono::Duration::from_std(by).unwrap_or_default();
        state.offset += by;
    }
}

impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.inner.lock().utc
    }

    fn monotonic_now(&self) -> Instant {
        let state = self.inner.lock();
        state.monotonic_base + state.offset
    }
}
