// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sends settled file changes to connected clients.

use std::fs;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::time::Duration;

use asset_core::{elapsed_ms, ClockSource, PendingChange};
use tracing::{debug, info};

use crate::events::AgentEvent;
use crate::session::SessionRegistry;

/// Counts from one dispatched batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Files read and offered to clients.
    pub files: usize,
    /// Individual file sends that were queued.
    pub sends: usize,
    /// Changes dropped because the file could not be read.
    pub dropped: usize,
}

pub struct Distributor {
    project_root: PathBuf,
    registry: Arc<SessionRegistry>,
    events: Sender<AgentEvent>,
    clock: Arc<dyn ClockSource>,
    progress_interval_ms: u64,
}

impl Distributor {
    pub fn new(
        project_root: PathBuf,
        registry: Arc<SessionRegistry>,
        events: Sender<AgentEvent>,
        clock: Arc<dyn ClockSource>,
        progress_interval: Duration,
    ) -> Self {
        Distributor {
            project_root,
            registry,
            events,
            clock,
            progress_interval_ms: progress_interval.as_millis() as u64,
        }
    }

    /// Sends every change in `batch` to its matching sessions.
    ///
    /// Each send carries the number of files still to go in the batch,
    /// counting the current one. Files that are gone when the batch starts
    /// are dropped before counting, so they never inflate that number. A file
    /// that vanishes between the check and the read is dropped quietly too.
    pub fn dispatch(&self, batch: Vec<PendingChange>) -> DispatchSummary {
        let mut summary = DispatchSummary::default();
        let (present, missing): (Vec<_>, Vec<_>) =
            batch.into_iter().partition(|change| self.project_root.join(&*change.path).is_file());
        for change in &missing {
            debug!(path = %change.path, "dropping change to a missing file");
        }
        summary.dropped = missing.len();

        let mut pending = present.len();
        let mut last_notice_ms = self.clock.now_ms();
        let mut notified = false;

        for change in present {
            let hint = pending;
            pending -= 1;
            let contents = match fs::read(self.project_root.join(&*change.path)) {
                Ok(contents) => contents,
                Err(e) => {
                    debug!(path = %change.path, error = %e, "dropping unreadable change");
                    summary.dropped += 1;
                    continue;
                }
            };

            let sessions = self.registry.len();
            if sessions > 0 {
                info!("Changed '{}'", change.path);
            } else {
                debug!(path = %change.path, "changed with no clients connected");
            }
            let _ = self.events.send(AgentEvent::Change(change.path.to_string()));
            summary.files += 1;

            self.registry.for_each_matching(change.target_client, |j, session| {
                if session.send_file(&change.path, &contents, hint as u32) {
                    summary.sends += 1;
                }

                let remaining = (hint * sessions).saturating_sub(j + 1);
                if remaining > 0 && elapsed_ms(self.clock.as_ref(), last_notice_ms) > self.progress_interval_ms {
                    last_notice_ms = self.clock.now_ms();
                    info!("Still transferring files. {} to go!", remaining);
                    notified = true;
                }
            });
        }

        if notified {
            info!("Done transferring files!");
        }
        summary
    }
}

#[cfg(test)]
#[path = "distributor_tests.rs"]
mod tests;
