// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Directory snapshots and snapshot diffing.
//!
//! A [`Snapshot`] is a path-sorted list of tracked files. Sorting happens
//! at construction, which is what lets [`diff`] run as a single linear merge
//! over two snapshots. Modified time is the only change signal; contents
//! are never hashed.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};
use tracing::trace;
use walkdir::WalkDir;

/// State of one tracked file at scan time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    /// Path relative to the project root, `/`-separated.
    pub path: String,
    /// Modification time in milliseconds since Unix epoch.
    pub modified_time: i64,
    /// Size in bytes.
    pub size: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, modified_time: i64, size: u64) -> Self {
        FileRecord { path: path.into(), modified_time, size }
    }
}

/// A point-in-time list of tracked files, sorted by path with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: Vec<FileRecord>,
}

impl Snapshot {
    /// Builds a snapshot, sorting by path and dropping duplicate paths.
    ///
    /// When a path appears more than once the first occurrence wins.
    pub fn from_records(mut records: Vec<FileRecord>) -> Self {
        records.sort_by(|a, b| a.path.cmp(&b.path));
        records.dedup_by(|later, earlier| later.path == earlier.path);
        Snapshot { records }
    }

    pub fn records(&self) -> &[FileRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record by path.
    pub fn get(&self, path: &str) -> Option<&FileRecord> {
        self.records.binary_search_by(|r| r.path.as_str().cmp(path)).ok().map(|i| &self.records[i])
    }

    /// Iterates over tracked paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.path.as_str())
    }
}

/// Kind of change between two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Added,
    Removed,
    Modified,
}

/// One difference between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub action: ChangeAction,
    pub path: String,
}

impl ChangeEvent {
    pub fn new(action: ChangeAction, path: impl Into<String>) -> Self {
        ChangeEvent { action, path: path.into() }
    }
}

/// Which files a scan tracks.
///
/// Only files under one of `roots` are tracked, and any path ending in one
/// of `ignore_suffixes` is skipped (editor and build temp files).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanRules {
    /// Directories, relative to the project root, that are walked.
    pub roots: Vec<PathBuf>,
    /// Path suffixes that are never tracked.
    pub ignore_suffixes: Vec<String>,
}

impl Default for ScanRules {
    fn default() -> Self {
        ScanRules {
            roots: vec!["assets".into(), "src".into(), "bin".into()],
            ignore_suffixes: vec!["tmp".into()],
        }
    }
}

impl ScanRules {
    /// Returns true if a project-relative, `/`-separated path is tracked.
    pub fn admits(&self, path: &str) -> bool {
        if self.ignore_suffixes.iter().any(|s| !s.is_empty() && path.ends_with(s.as_str())) {
            return false;
        }
        self.roots.iter().any(|root| {
            let root = normalize(root);
            !root.is_empty()
                && path.len() > root.len()
                && path.starts_with(&root)
                && path.as_bytes()[root.len()] == b'/'
        })
    }
}

/// Converts a relative path into the `/`-separated form used in snapshots.
///
/// `.` components are dropped so `./assets` and `assets` compare equal.
pub fn normalize(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str(&part.to_string_lossy());
            }
            Component::ParentDir => {
                if !out.is_empty() {
                    out.push('/');
                }
                out.push_str("..");
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    out
}

/// Walks every root under `project_root` and snapshots the tracked files.
///
/// Unreadable entries are skipped. A missing root contributes nothing.
pub fn scan(project_root: &Path, rules: &ScanRules) -> Snapshot {
    let mut records = Vec::new();

    for root in &rules.roots {
        for entry in WalkDir::new(project_root.join(root)).follow_links(true) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    trace!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(project_root) else {
                continue;
            };
            let path = normalize(relative);
            if !rules.admits(&path) {
                continue;
            }

            match entry.metadata() {
                Ok(meta) => {
                    let modified_time = meta
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map_or(0, |d| d.as_millis() as i64);
                    records.push(FileRecord { path, modified_time, size: meta.len() });
                }
                Err(e) => trace!(path = %path, error = %e, "skipping file without metadata"),
            }
        }
    }

    Snapshot::from_records(records)
}

/// Computes the changes that turn `old` into `new`.
///
/// Events come out in path order. A path only in `old` is `Removed`, only in
/// `new` is `Added`, and in both is `Modified` iff its modified time differs.
pub fn diff(old: &Snapshot, new: &Snapshot) -> Vec<ChangeEvent> {
    let old = old.records();
    let new = new.records();
    let mut changes = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < old.len() && j < new.len() {
        match old[i].path.cmp(&new[j].path) {
            Ordering::Less => {
                changes.push(ChangeEvent::new(ChangeAction::Removed, old[i].path.clone()));
                i += 1;
            }
            Ordering::Greater => {
                changes.push(ChangeEvent::new(ChangeAction::Added, new[j].path.clone()));
                j += 1;
            }
            Ordering::Equal => {
                if old[i].modified_time != new[j].modified_time {
                    changes.push(ChangeEvent::new(ChangeAction::Modified, new[j].path.clone()));
                }
                i += 1;
                j += 1;
            }
        }
    }

    changes.extend(old[i..].iter().map(|r| ChangeEvent::new(ChangeAction::Removed, r.path.clone())));
    changes.extend(new[j..].iter().map(|r| ChangeEvent::new(ChangeAction::Added, r.path.clone())));
    changes
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
