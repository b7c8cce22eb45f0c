// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Telemetry collector toggle.
//!
//! The agent only tracks whether telemetry is on and which directory the
//! collector serves. Collection itself lives outside the agent.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tracing::{info, warn};

use crate::config::{TelemetryConfig, TELEMETRY_SDK_SUBDIR};

pub struct Telemetry {
    running: AtomicBool,
    port: u16,
    client_root: Mutex<Option<PathBuf>>,
}

impl Telemetry {
    /// An explicit `client_root` wins over one derived from `sdk_root`.
    pub fn new(config: &TelemetryConfig) -> Self {
        let telemetry = Telemetry {
            running: AtomicBool::new(false),
            port: config.port,
            client_root: Mutex::new(config.client_root.clone()),
        };
        if let (None, Some(sdk)) = (&config.client_root, &config.sdk_root) {
            telemetry.set_client_root_from_sdk(sdk);
        }
        telemetry
    }

    /// Local URL of the telemetry page.
    pub fn url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Starts telemetry. Returns false if it was already running.
    pub fn start(&self) -> bool {
        if self.running.swap(true, Ordering::SeqCst) {
            return false;
        }
        match self.client_root() {
            Some(root) => info!("Telemetry running at {} (serving {})", self.url(), root.display()),
            None => {
                warn!("Telemetry running at {} without a client root; set sdk=<path>", self.url())
            }
        }
        true
    }

    /// Stops telemetry. Returns false if it was not running.
    pub fn stop(&self) -> bool {
        if !self.running.swap(false, Ordering::SeqCst) {
            return false;
        }
        info!("Telemetry stopped");
        true
    }

    /// Flips the running state and returns the new one.
    pub fn toggle(&self) -> bool {
        if self.is_running() {
            self.stop();
            false
        } else {
            self.start();
            true
        }
    }

    pub fn client_root(&self) -> Option<PathBuf> {
        self.client_root.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Points the collector at the client files inside an SDK install.
    pub fn set_client_root_from_sdk(&self, sdk: &Path) {
        let root = sdk.join(TELEMETRY_SDK_SUBDIR);
        *self.client_root.lock().unwrap_or_else(|e| e.into_inner()) = Some(root);
    }
}

#[cfg(test)]
#[path = "telemetry_tests.rs"]
mod tests;
