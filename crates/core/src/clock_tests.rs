// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::{AtomicU64, Ordering};

struct FixedClock(AtomicU64);

impl ClockSource for FixedClock {
    fn now_ms(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[test]
fn system_clock_is_after_2020() {
    // 2020-01-01T00:00:00Z
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn elapsed_is_measured_from_since() {
    let clock = FixedClock(AtomicU64::new(1_000));
    assert_eq!(elapsed_ms(&clock, 250), 750);
}

#[test]
fn elapsed_saturates_when_clock_goes_backwards() {
    let clock = FixedClock(AtomicU64::new(100));
    assert_eq!(elapsed_ms(&clock, 500), 0);
}

#[test]
fn arc_clock_delegates() {
    let clock: Arc<dyn ClockSource> = Arc::new(FixedClock(AtomicU64::new(77)));
    assert_eq!(clock.now_ms(), 77);
}
