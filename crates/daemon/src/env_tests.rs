// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::names;
use super::*;
use std::path::PathBuf;

#[test]
fn constants_match_env_var_names() {
    assert_eq!(names::ASSETD_TELEMETRY_ROOT, "ASSETD_TELEMETRY_ROOT");
    assert_eq!(names::RUST_LOG, "RUST_LOG");
}

// One test owns ASSETD_TELEMETRY_ROOT so parallel tests never race on it.
#[test]
fn telemetry_root_follows_env() {
    {
        let _guard = EnvGuard::new(names::ASSETD_TELEMETRY_ROOT, Some("/srv/telemetry"));
        assert_eq!(telemetry_root(), Some(PathBuf::from("/srv/telemetry")));

        let config = crate::Config::default().with_env_overrides();
        assert_eq!(config.telemetry.client_root, Some(PathBuf::from("/srv/telemetry")));
    }
    {
        let _guard = EnvGuard::new(names::ASSETD_TELEMETRY_ROOT, Some(""));
        assert_eq!(telemetry_root(), None);
    }
    {
        let _guard = EnvGuard::new(names::ASSETD_TELEMETRY_ROOT, None);
        assert_eq!(telemetry_root(), None);
        assert_eq!(crate::Config::default().with_env_overrides().telemetry.client_root, None);
    }
}

/// Overrides one variable for the guard's lifetime.
struct EnvGuard {
    key: &'static str,
    saved: Option<String>,
}

impl EnvGuard {
    fn new(key: &'static str, value: Option<&str>) -> Self {
        let saved = std::env::var(key).ok();
        apply(key, value);
        EnvGuard { key, saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        apply(self.key, self.saved.as_deref());
    }
}

fn apply(key: &str, value: Option<&str>) {
    match value {
        Some(v) => std::env::set_var(key, v),
        None => std::env::remove_var(key),
    }
}
