// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! asset-core: Shared library for the asset synchronization agent
//!
//! This crate provides the buffered socket transport, the snapshot and diff
//! engine, and the settle queue used by the `assetd` daemon. It owns no
//! threads and no listening sockets; callers drive it.

pub mod clock;
pub mod error;
pub mod ring;
pub mod settle;
pub mod snapshot;
pub mod transport;

pub use clock::{elapsed_ms, ClockSource, SystemClock};
pub use error::{Error, Result};
pub use ring::RingBuffer;
pub use settle::{PendingChange, SettleQueue};
pub use snapshot::{diff, scan, ChangeAction, ChangeEvent, FileRecord, ScanRules, Snapshot};
pub use transport::{BufferStats, SocketId, Transport, TransportConfig};
