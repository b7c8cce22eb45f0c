// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;
use tracing_subscriber::layer::SubscriberExt;

fn local_config(root: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.project_root = root.to_path_buf();
    config.listen.host = "127.0.0.1".to_string();
    config.listen.port = 0;
    config
}

#[test]
fn binds_an_os_assigned_port() {
    let temp = TempDir::new().unwrap();
    let agent = Agent::new(local_config(temp.path())).unwrap();
    assert_ne!(agent.local_addr().port(), 0);
    assert_eq!(agent.handle().local_addr(), agent.local_addr());
}

#[test]
fn taken_port_range_is_fatal() {
    let temp = TempDir::new().unwrap();
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let mut config = local_config(temp.path());
    config.listen.port = port;
    config.listen.port_attempts = 1;

    match Agent::new(config) {
        Err(Error::NoListenPort { first, last }) => assert_eq!((first, last), (port, port)),
        Err(e) => unreachable!("unexpected error: {e}"),
        Ok(_) => unreachable!("bound a taken port"),
    }
}

#[test]
fn quit_before_run_shuts_down_cleanly() {
    let temp = TempDir::new().unwrap();
    let agent = Agent::new(local_config(temp.path())).unwrap();
    let handle = agent.handle();
    handle.quit();
    assert!(handle.is_quitting());

    let subscriber = tracing_subscriber::registry().with(agent.log_layer());
    let mut lines = Vec::new();
    let mut idle_calls = 0;
    tracing::subscriber::with_default(subscriber, || {
        agent.run(|| idle_calls += 1, |line| lines.push(line.to_string()), |_| {}).unwrap();
    });

    assert_eq!(idle_calls, 0);
    assert!(lines.iter().any(|l| l.starts_with("Listening on port")), "{lines:?}");
    assert_eq!(lines.last().map(String::as_str), Some("Done! Goodbye."));
    assert_eq!(handle.session_count(), 0);
}

#[test]
fn quit_command_stops_run() {
    let temp = TempDir::new().unwrap();
    let agent = Agent::new(local_config(temp.path())).unwrap();
    let handle = agent.handle();

    let runner = thread::spawn(move || agent.run(|| {}, |_| {}, |_| {}));
    assert_eq!(handle.command(".quit"), ControlOutcome::Quit);
    runner.join().unwrap().unwrap();
}
