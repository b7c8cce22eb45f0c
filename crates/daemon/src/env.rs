// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables read by the agent.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod names {
    include!(concat!(env!("OUT_DIR"), "/env_names.rs"));
}

/// Returns the value of `ASSETD_TELEMETRY_ROOT` if set and non-empty.
pub fn telemetry_root() -> Option<PathBuf> {
    std::env::var(names::ASSETD_TELEMETRY_ROOT).ok().filter(|v| !v.is_empty()).map(PathBuf::from)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
