// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Debounce queue for file changes.
//!
//! A changed path is held until it has gone unseen for a settle window, so a
//! tool that rewrites a file several times in a row only causes one send of
//! the final contents. There is exactly one pending entry per path; seeing a
//! path again refreshes its timestamp in place.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::debug;

use crate::clock::ClockSource;
use crate::snapshot::{ChangeAction, ChangeEvent};

/// A change waiting for its path to settle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingChange {
    /// Project-relative path. Shared so copies handed out are cheap.
    pub path: Arc<str>,
    /// Clock time (ms) the path was last seen changing.
    pub last_seen_ms: u64,
    /// If set, only this client receives the file.
    pub target_client: Option<u32>,
}

/// Thread-safe set of pending changes, keyed by path.
pub struct SettleQueue {
    clock: Arc<dyn ClockSource>,
    pending: Mutex<BTreeMap<Arc<str>, PendingChange>>,
}

impl SettleQueue {
    /// Creates an empty queue timed by `clock`.
    pub fn new(clock: Arc<dyn ClockSource>) -> Self {
        SettleQueue { clock, pending: Mutex::new(BTreeMap::new()) }
    }

    /// Notes a change from the diff engine.
    ///
    /// Removals are ignored: deleted files are not propagated to clients.
    /// Returns true if the path was not already pending.
    pub fn record_change(&self, change: &ChangeEvent) -> bool {
        if change.action == ChangeAction::Removed {
            return false;
        }

        let now = self.clock.now_ms();
        let mut pending = self.lock();
        match pending.get_mut(change.path.as_str()) {
            Some(entry) => {
                debug!(path = %change.path, "file changing");
                entry.last_seen_ms = now;
                entry.target_client = None;
                false
            }
            None => {
                debug!(path = %change.path, "file changed");
                let path: Arc<str> = Arc::from(change.path.as_str());
                pending.insert(
                    Arc::clone(&path),
                    PendingChange { path, last_seen_ms: now, target_client: None },
                );
                true
            }
        }
    }

    /// Queues a path so it settles on the next drain.
    ///
    /// If the path is already pending for a different audience, the entry is
    /// widened to all clients rather than duplicated.
    pub fn inject_manual(&self, path: &str, target_client: Option<u32>) {
        let mut pending = self.lock();
        match pending.get_mut(path) {
            Some(entry) => {
                entry.last_seen_ms = 0;
                if entry.target_client != target_client {
                    entry.target_client = None;
                }
            }
            None => {
                let path: Arc<str> = Arc::from(path);
                pending.insert(Arc::clone(&path), PendingChange { path, last_seen_ms: 0, target_client });
            }
        }
    }

    /// Removes and returns every change unseen for at least `window`.
    ///
    /// Results are ordered by path.
    pub fn drain_settled(&self, window: Duration) -> Vec<PendingChange> {
        let now = self.clock.now_ms();
        let window_ms = window.as_millis() as u64;
        let mut pending = self.lock();

        let settled: Vec<Arc<str>> = pending
            .values()
            .filter(|c| now.saturating_sub(c.last_seen_ms) >= window_ms)
            .map(|c| Arc::clone(&c.path))
            .collect();
        settled.iter().filter_map(|path| pending.remove(path)).collect()
    }

    /// Number of paths waiting to settle.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<Arc<str>, PendingChange>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "settle_tests.rs"]
mod tests;
