// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Operator commands.
//!
//! Local commands start with a dot and are matched anywhere in the input
//! line. Everything else is passed through to every connected client.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use asset_core::{scan, ScanRules, SettleQueue};
use tracing::info;

use crate::session::{SessionInfo, SessionRegistry};
use crate::telemetry::Telemetry;

/// Forwarded even when no client is connected, without a notice.
pub const TERMINATE: &str = "terminate";

pub const NO_CLIENTS_NOTICE: &str =
    "No clients connected, command ignored. Type .help for a list of local commands.";

const HELP: &[(&str, &str)] = &[
    (".sendall", "send every tracked file to every client"),
    (".clients", "list connected clients"),
    (".telemetry", "toggle telemetry"),
    (".help", "show this list"),
    (".quit", "stop the agent"),
];

/// A parsed operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    SendAll,
    Clients,
    Telemetry,
    Help,
    Quit,
    /// Opaque text for the clients.
    Forward(String),
    Empty,
}

impl ControlCommand {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            ControlCommand::Empty
        } else if text.contains(".sendall") {
            ControlCommand::SendAll
        } else if text.contains(".clients") {
            ControlCommand::Clients
        } else if text.contains(".telemetry") {
            ControlCommand::Telemetry
        } else if text.contains(".help") {
            ControlCommand::Help
        } else if text.contains(".quit") {
            ControlCommand::Quit
        } else {
            ControlCommand::Forward(text.to_string())
        }
    }
}

/// What a command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlOutcome {
    /// Files queued for resend.
    Resync(usize),
    Clients(Vec<SessionInfo>),
    /// New telemetry state.
    Telemetry(bool),
    Help,
    Quit,
    /// Sessions the text was delivered to.
    Forwarded(usize),
    /// Dropped because no client is connected.
    Ignored,
    Empty,
}

pub struct Control {
    registry: Arc<SessionRegistry>,
    settle: Arc<SettleQueue>,
    telemetry: Arc<Telemetry>,
    project_root: PathBuf,
    rules: ScanRules,
    quit: Arc<AtomicBool>,
}

impl Control {
    pub fn new(
        registry: Arc<SessionRegistry>,
        settle: Arc<SettleQueue>,
        telemetry: Arc<Telemetry>,
        project_root: PathBuf,
        rules: ScanRules,
        quit: Arc<AtomicBool>,
    ) -> Self {
        Control { registry, settle, telemetry, project_root, rules, quit }
    }

    /// Parses and runs one line of operator input.
    pub fn execute(&self, text: &str) -> ControlOutcome {
        match ControlCommand::parse(text) {
            ControlCommand::SendAll => ControlOutcome::Resync(self.post_all_files(None)),
            ControlCommand::Clients => ControlOutcome::Clients(self.list_clients()),
            ControlCommand::Telemetry => ControlOutcome::Telemetry(self.toggle_telemetry()),
            ControlCommand::Help => {
                info!("Local commands:");
                for (name, about) in HELP {
                    info!("   {:<12}{}", name, about);
                }
                info!("Anything else is sent to every connected client.");
                ControlOutcome::Help
            }
            ControlCommand::Quit => {
                info!("Quitting...");
                self.quit.store(true, Ordering::SeqCst);
                ControlOutcome::Quit
            }
            ControlCommand::Forward(text) => self.forward(&text),
            ControlCommand::Empty => ControlOutcome::Empty,
        }
    }

    /// Queues every tracked file to settle on the next drain.
    ///
    /// With a target only that client receives the files. Returns the
    /// number of files queued.
    pub fn post_all_files(&self, target: Option<u32>) -> usize {
        let snapshot = scan(&self.project_root, &self.rules);
        for path in snapshot.paths() {
            self.settle.inject_manual(path, target);
        }
        match target {
            Some(id) => info!("Queued {} files for client #{}", snapshot.len(), id),
            None => info!("Queued {} files for all clients", snapshot.len()),
        }
        snapshot.len()
    }

    fn list_clients(&self) -> Vec<SessionInfo> {
        let clients = self.registry.list();
        info!("Clients");
        for client in &clients {
            info!("   #{} - {}", client.id, client.description);
        }
        clients
    }

    fn toggle_telemetry(&self) -> bool {
        let running = self.telemetry.toggle();
        self.registry.forward(if running { "telemetryEnable" } else { "telemetryDisable" });
        running
    }

    fn forward(&self, text: &str) -> ControlOutcome {
        if self.registry.is_empty() && text != TERMINATE {
            info!("{}", NO_CLIENTS_NOTICE);
            return ControlOutcome::Ignored;
        }
        ControlOutcome::Forwarded(self.registry.forward(text))
    }
}

#[cfg(test)]
#[path = "control_tests.rs"]
mod tests;
