// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Agent configuration.
//!
//! Loaded once at startup from `.assetd.toml` in the project root (or an
//! explicit `--config` path). Every field has a default, so a missing or
//! empty file yields a working agent. `KEY=VALUE` options and environment
//! overrides are applied on top before the agent starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use asset_core::{ScanRules, TransportConfig};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Config file looked up in the project root when none is given.
pub const CONFIG_FILE_NAME: &str = ".assetd.toml";

/// Subdirectory of an SDK install holding the telemetry client files.
pub const TELEMETRY_SDK_SUBDIR: &str = "telemetry/www";

/// Top-level agent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory the scan roots are relative to.
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Where the agent listens for clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenConfig {
    #[serde(default = "default_host")]
    pub host: String,
    /// First port tried. 0 lets the OS choose.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of consecutive ports tried before giving up.
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,
}

/// File scanning and debounce timing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_scan_interval_ms")]
    pub interval_ms: u64,
    /// Quiet period a changed file needs before it is sent.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Scans slower than this log a warning.
    #[serde(default = "default_slow_scan_warn_ms")]
    pub slow_scan_warn_ms: u64,
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,
    #[serde(default = "default_ignore_suffixes")]
    pub ignore_suffixes: Vec<String>,
}

/// Client session policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Silence after which a client is evicted.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Sleep between IO loop passes when nothing is pending.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Send every tracked file to a client as soon as it connects.
    #[serde(default)]
    pub resync_on_connect: bool,
    /// Cadence of "still transferring" progress lines.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Start telemetry with the agent.
    #[serde(default)]
    pub enabled: bool,
    /// SDK install; the client root defaults to its `telemetry/www`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sdk_root: Option<PathBuf>,
    /// Explicit client root, wins over `sdk_root`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_root: Option<PathBuf>,
    #[serde(default = "default_telemetry_port")]
    pub port: u16,
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    12340
}

fn default_port_attempts() -> u16 {
    32
}

fn default_scan_interval_ms() -> u64 {
    100
}

fn default_settle_ms() -> u64 {
    750
}

fn default_slow_scan_warn_ms() -> u64 {
    250
}

fn default_roots() -> Vec<PathBuf> {
    ScanRules::default().roots
}

fn default_ignore_suffixes() -> Vec<String> {
    ScanRules::default().ignore_suffixes
}

fn default_timeout_ms() -> u64 {
    6000
}

fn default_poll_interval_ms() -> u64 {
    10
}

fn default_progress_interval_ms() -> u64 {
    2000
}

fn default_telemetry_port() -> u16 {
    8073
}

impl Default for ListenConfig {
    fn default() -> Self {
        ListenConfig { host: default_host(), port: default_port(), port_attempts: default_port_attempts() }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            interval_ms: default_scan_interval_ms(),
            settle_ms: default_settle_ms(),
            slow_scan_warn_ms: default_slow_scan_warn_ms(),
            roots: default_roots(),
            ignore_suffixes: default_ignore_suffixes(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            resync_on_connect: false,
            progress_interval_ms: default_progress_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig { enabled: false, sdk_root: None, client_root: None, port: default_telemetry_port() }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            project_root: default_project_root(),
            listen: ListenConfig::default(),
            scan: ScanConfig::default(),
            session: SessionConfig::default(),
            transport: TransportConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ListenConfig {
    /// Ports to try, in order. Port 0 is a single OS-assigned attempt.
    pub fn candidate_ports(&self) -> Vec<u16> {
        if self.port == 0 {
            return vec![0];
        }
        let attempts = self.port_attempts.max(1);
        (0..attempts).map_while(|i| self.port.checked_add(i)).collect()
    }
}

impl ScanConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// The scan roots and ignore rules as the snapshot engine takes them.
    pub fn rules(&self) -> ScanRules {
        ScanRules { roots: self.roots.clone(), ignore_suffixes: self.ignore_suffixes.clone() }
    }
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Loads `<project_root>/.assetd.toml`, or defaults if it does not exist.
    ///
    /// `project_root` is kept even if the file names a different one.
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let path = project_root.join(CONFIG_FILE_NAME);
        let mut config = if path.is_file() { Self::load(&path)? } else { Config::default() };
        config.project_root = project_root.to_path_buf();
        Ok(config)
    }

    /// Applies one `KEY=VALUE` option.
    ///
    /// Recognised keys are `telemetry` (`true`/`false`), `sdk` (path), `port`
    /// and `root` (project directory).
    pub fn set_option(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = || Error::InvalidOption { key: key.to_string(), value: value.to_string() };
        match key {
            "telemetry" => self.telemetry.enabled = parse_bool(value).ok_or_else(invalid)?,
            "sdk" => {
                if value.is_empty() {
                    return Err(invalid());
                }
                self.telemetry.sdk_root = Some(PathBuf::from(value));
            }
            "port" => self.listen.port = value.parse().map_err(|_| invalid())?,
            "root" => {
                if value.is_empty() {
                    return Err(invalid());
                }
                self.project_root = PathBuf::from(value);
            }
            _ => return Err(invalid()),
        }
        Ok(())
    }

    /// Applies a `KEY=VALUE` string as given on the command line.
    pub fn set_pair(&mut self, pair: &str) -> Result<()> {
        match pair.split_once('=') {
            Some((key, value)) => self.set_option(key.trim(), value.trim()),
            None => Err(Error::InvalidOption { key: pair.to_string(), value: String::new() }),
        }
    }

    /// Applies environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(root) = crate::env::telemetry_root() {
            self.telemetry.client_root = Some(root);
        }
        self
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
