// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-thread event bridge to the embedding loop.
//!
//! Worker threads never call embedder callbacks directly. Log lines and
//! change notifications are sent as [`AgentEvent`]s over one channel and
//! delivered, in order, by whoever drains the receiver.

use std::fmt::{self, Write as _};
use std::sync::mpsc::{self, Receiver, Sender};

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Something the embedder should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// A formatted log line.
    Log(String),
    /// A tracked file was sent out (project-relative path).
    Change(String),
}

/// Creates the unbounded event channel.
pub fn channel() -> (Sender<AgentEvent>, Receiver<AgentEvent>) {
    mpsc::channel()
}

/// Delivers every queued event to the callbacks. Returns how many ran.
pub fn deliver(
    rx: &Receiver<AgentEvent>,
    on_log: &mut dyn FnMut(&str),
    on_change: &mut dyn FnMut(&str),
) -> usize {
    let mut delivered = 0;
    for event in rx.try_iter() {
        match event {
            AgentEvent::Log(line) => on_log(&line),
            AgentEvent::Change(path) => on_change(&path),
        }
        delivered += 1;
    }
    delivered
}

/// `tracing` layer that turns log events into [`AgentEvent::Log`].
///
/// Filtering is left to the subscriber it is installed in.
#[derive(Clone)]
pub struct CallbackLayer {
    tx: Sender<AgentEvent>,
}

impl CallbackLayer {
    pub fn new(tx: Sender<AgentEvent>) -> Self {
        CallbackLayer { tx }
    }
}

impl<S: Subscriber> Layer<S> for CallbackLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut line = LineVisitor::default();
        event.record(&mut line);
        // A closed receiver means the embedder is gone; nothing to deliver to.
        let _ = self.tx.send(AgentEvent::Log(line.finish()));
    }
}

/// Renders the message followed by ` key=value` for each other field.
#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl LineVisitor {
    fn finish(mut self) -> String {
        self.message.push_str(&self.fields);
        self.message
    }
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={}", field.name(), value);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={:?}", field.name(), value);
        }
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
