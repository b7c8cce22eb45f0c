// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// Errors raised by the agent.
///
/// Only [`Error::NoListenPort`] stops the process at startup. Everything
/// after that degrades to fewer sessions instead of failing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no listen port available in {first}..={last}\n  hint: free a port or set --port")]
    NoListenPort { first: u16, last: u16 },

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid option {key}={value}\n  hint: valid keys are: telemetry, sdk, port, root")]
    InvalidOption { key: String, value: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A specialized Result type for agent operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
