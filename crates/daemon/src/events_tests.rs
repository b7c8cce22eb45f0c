// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

fn capture(f: impl FnOnce()) -> Vec<AgentEvent> {
    let (tx, rx) = channel();
    let subscriber = Registry::default().with(CallbackLayer::new(tx));
    tracing::subscriber::with_default(subscriber, f);
    rx.try_iter().collect()
}

#[test]
fn log_events_become_lines() {
    let events = capture(|| {
        info!("Listening on port {}", 12340);
        warn!("Scanning files took {}ms, consider removing unused files", 300);
    });

    assert_eq!(
        events,
        vec![
            AgentEvent::Log("Listening on port 12340".into()),
            AgentEvent::Log("Scanning files took 300ms, consider removing unused files".into()),
        ]
    );
}

#[test]
fn structured_fields_follow_the_message() {
    let path = "assets/a.png";
    let events = capture(|| info!(client = 1000, path = %path, "sent"));
    assert_eq!(events, vec![AgentEvent::Log("sent client=1000 path=assets/a.png".into())]);
}

#[test]
fn deliver_preserves_order_and_kind() {
    let (tx, rx) = channel();
    tx.send(AgentEvent::Log("one".into())).unwrap();
    tx.send(AgentEvent::Change("src/main.ls".into())).unwrap();
    tx.send(AgentEvent::Log("two".into())).unwrap();

    let mut seen = Vec::new();
    let mut changes = Vec::new();
    let n = deliver(&rx, &mut |l| seen.push(l.to_string()), &mut |p| changes.push(p.to_string()));

    assert_eq!(n, 3);
    assert_eq!(seen, vec!["one", "two"]);
    assert_eq!(changes, vec!["src/main.ls"]);
    assert_eq!(deliver(&rx, &mut |_| {}, &mut |_| {}), 0);
}

#[test]
fn layer_survives_dropped_receiver() {
    let (tx, rx) = channel();
    drop(rx);
    let subscriber = Registry::default().with(CallbackLayer::new(tx));
    tracing::subscriber::with_default(subscriber, || info!("nobody listening"));
}
