// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Buffered, non-blocking socket transport.
//!
//! Decouples a logical send from what the OS socket accepts right now. Every
//! registered socket gets a [`RingBuffer`] that is created on first write,
//! grown when a write does not fit, and shrunk again after a long run of
//! small writes. [`Transport::pump`] drains buffers with non-blocking writes
//! and tracks sockets that stop accepting data entirely.
//!
//! The transport never closes a socket. A socket that failed or stalled is
//! reported by [`Transport::is_alive`]; closing is the caller's job.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::clock::{elapsed_ms, ClockSource};
use crate::error::{Error, Result};
use crate::ring::RingBuffer;

/// Identifies a socket registered with a [`Transport`].
pub type SocketId = u64;

/// Tuning for write-buffer growth, shrink and stall detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Buffer capacities are always a multiple of this many bytes.
    pub page_size: usize,
    /// Largest run handed to a single non-blocking send.
    pub chunk_size: usize,
    /// Consecutive low-occupancy writes before the buffer shrinks.
    pub shrink_streak: u32,
    /// A write counts as low-occupancy below `capacity / shrink_divisor`.
    pub shrink_divisor: usize,
    /// Consecutive zero-byte pump cycles before the stall timer starts.
    pub stall_streak: u32,
    /// Time without progress, after the streak, before a socket is stalled.
    pub stall_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            page_size: 4 * 1024,
            chunk_size: 16 * 1024,
            shrink_streak: 200,
            shrink_divisor: 3,
            stall_streak: 200,
            stall_timeout_ms: 30_000,
        }
    }
}

impl TransportConfig {
    /// Rounds `len` up to the page granularity (at least one page).
    pub fn round_to_page(&self, len: usize) -> usize {
        let page = self.page_size.max(1);
        len.max(1).div_ceil(page) * page
    }
}

/// Point-in-time view of one socket's write buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferStats {
    pub used: usize,
    pub capacity: usize,
    pub bytes_sent_total: u64,
    pub stalled: bool,
    pub failed: bool,
}

/// Per-socket write state. Created lazily on the first write.
#[derive(Debug)]
struct WriteBuffer {
    ring: RingBuffer,
    small_write_streak: u32,
    stall_write_streak: u32,
    /// When the stall streak crossed its threshold; cleared on progress.
    idle_since_ms: Option<u64>,
    stalled: bool,
    /// A hard (non would-block) send error was seen.
    failed: bool,
    bytes_sent_total: u64,
}

impl WriteBuffer {
    fn new(capacity: usize) -> Self {
        WriteBuffer {
            ring: RingBuffer::new(capacity),
            small_write_streak: 0,
            stall_write_streak: 0,
            idle_since_ms: None,
            stalled: false,
            failed: false,
            bytes_sent_total: 0,
        }
    }

    /// Grows capacity so `incoming` more bytes fit.
    ///
    /// New capacity is double the current one, or enough for everything
    /// pending plus `incoming` if that is larger, rounded up to a page.
    fn reserve(&mut self, incoming: usize, config: &TransportConfig) {
        if incoming <= self.ring.free_len() {
            return;
        }
        let needed = self.ring.used_len() + incoming;
        let capacity = config.round_to_page((self.ring.capacity() * 2).max(needed));
        debug!(from = self.ring.capacity(), to = capacity, "growing write buffer");
        self.ring.resize(capacity);
    }

    /// Shrink heuristic, evaluated once per write.
    fn note_write(&mut self, config: &TransportConfig) {
        let divisor = config.shrink_divisor.max(1);
        if self.ring.used_len() >= self.ring.capacity() / divisor {
            self.small_write_streak = 0;
            return;
        }

        self.small_write_streak += 1;
        if self.small_write_streak < config.shrink_streak {
            return;
        }
        self.small_write_streak = 0;

        let capacity = config.round_to_page(self.ring.used_len() * 2);
        if capacity < self.ring.capacity() {
            debug!(from = self.ring.capacity(), to = capacity, "shrinking write buffer");
            self.ring.resize(capacity);
        }
    }

    /// Stall bookkeeping after a pump cycle that had pending data.
    fn note_cycle(&mut self, sent: usize, config: &TransportConfig, clock: &dyn ClockSource) {
        if sent > 0 {
            // Progress resets the detector but never clears `stalled`.
            self.stall_write_streak = 0;
            self.idle_since_ms = None;
            return;
        }

        self.stall_write_streak = self.stall_write_streak.saturating_add(1);
        if self.stall_write_streak <= config.stall_streak {
            return;
        }

        match self.idle_since_ms {
            None => self.idle_since_ms = Some(clock.now_ms()),
            Some(since) => {
                if !self.stalled && elapsed_ms(clock, since) >= config.stall_timeout_ms {
                    self.stalled = true;
                }
            }
        }
    }

    fn stats(&self) -> BufferStats {
        BufferStats {
            used: self.ring.used_len(),
            capacity: self.ring.capacity(),
            bytes_sent_total: self.bytes_sent_total,
            stalled: self.stalled,
            failed: self.failed,
        }
    }
}

/// One registered socket: its write half and (once written to) its buffer.
struct Endpoint {
    sink: Box<dyn Write + Send>,
    buffer: Option<WriteBuffer>,
}

/// Registry of per-socket write buffers.
///
/// Constructed once at startup and shared by handle. The table lock is held
/// only to look up or insert endpoints; each endpoint has its own lock, so a
/// send on one socket never blocks bookkeeping for another.
pub struct Transport {
    config: TransportConfig,
    clock: Arc<dyn ClockSource>,
    endpoints: Mutex<HashMap<SocketId, Arc<Mutex<Endpoint>>>>,
    next_id: AtomicU64,
}

impl Transport {
    /// Creates an empty transport.
    pub fn new(config: TransportConfig, clock: Arc<dyn ClockSource>) -> Self {
        Transport { config, clock, endpoints: Mutex::new(HashMap::new()), next_id: AtomicU64::new(1) }
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Registers the write half of a socket and returns its id.
    ///
    /// `sink` is expected to be non-blocking: a full OS buffer must surface
    /// as [`io::ErrorKind::WouldBlock`].
    pub fn open(&self, sink: Box<dyn Write + Send>) -> SocketId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let endpoint = Arc::new(Mutex::new(Endpoint { sink, buffer: None }));
        self.table().insert(id, endpoint);
        trace!(socket = id, "opened transport endpoint");
        id
    }

    /// Drops a socket's buffer and write half. Returns false if unknown.
    ///
    /// Unsent bytes are discarded.
    pub fn close(&self, id: SocketId) -> bool {
        let removed = self.table().remove(&id);
        if let Some(endpoint) = &removed {
            let endpoint = endpoint.lock().unwrap_or_else(|e| e.into_inner());
            let pending = endpoint.buffer.as_ref().map_or(0, |b| b.ring.used_len());
            if pending > 0 {
                debug!(socket = id, pending, "closing socket with unsent bytes");
            }
        }
        removed.is_some()
    }

    /// Queues `bytes` for the socket and immediately tries to send.
    ///
    /// Never drops or truncates: the buffer grows until the whole write fits.
    pub fn write(&self, id: SocketId, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }

        let endpoint = self.endpoint(id)?;
        let mut endpoint = endpoint.lock().unwrap_or_else(|e| e.into_inner());

        let config = &self.config;
        let buffer = endpoint
            .buffer
            .get_or_insert_with(|| WriteBuffer::new(config.round_to_page(bytes.len())));
        buffer.reserve(bytes.len(), config);
        if !buffer.ring.offer(bytes) {
            return Err(Error::BufferOverflow { requested: bytes.len(), free: buffer.ring.free_len() });
        }
        buffer.note_write(config);

        self.pump_endpoint(id, &mut endpoint);
        Ok(())
    }

    /// Attempts to drain every socket's buffer. Returns total bytes sent.
    pub fn pump(&self) -> usize {
        let endpoints: Vec<(SocketId, Arc<Mutex<Endpoint>>)> =
            self.table().iter().map(|(id, ep)| (*id, Arc::clone(ep))).collect();

        let mut sent = 0;
        for (id, endpoint) in endpoints {
            let mut endpoint = endpoint.lock().unwrap_or_else(|e| e.into_inner());
            sent += self.pump_endpoint(id, &mut endpoint);
        }
        sent
    }

    /// Liveness query: registered, not stalled, and no hard send error.
    pub fn is_alive(&self, id: SocketId) -> bool {
        match self.stats(id) {
            Some(stats) => !stats.stalled && !stats.failed,
            None => false,
        }
    }

    /// Buffer statistics for a registered socket.
    ///
    /// A socket that was never written to reports an empty zero-capacity
    /// buffer.
    pub fn stats(&self, id: SocketId) -> Option<BufferStats> {
        let endpoint = self.table().get(&id).map(Arc::clone)?;
        let endpoint = endpoint.lock().unwrap_or_else(|e| e.into_inner());
        Some(endpoint.buffer.as_ref().map(WriteBuffer::stats).unwrap_or_default())
    }

    /// Bytes queued but not yet accepted by the OS.
    pub fn buffered_len(&self, id: SocketId) -> usize {
        self.stats(id).map_or(0, |s| s.used)
    }

    /// Number of registered sockets.
    pub fn len(&self) -> usize {
        self.table().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn table(&self) -> std::sync::MutexGuard<'_, HashMap<SocketId, Arc<Mutex<Endpoint>>>> {
        self.endpoints.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn endpoint(&self, id: SocketId) -> Result<Arc<Mutex<Endpoint>>> {
        self.table().get(&id).map(Arc::clone).ok_or(Error::UnknownSocket(id))
    }

    /// One pump cycle for one socket.
    fn pump_endpoint(&self, id: SocketId, endpoint: &mut Endpoint) -> usize {
        let Endpoint { sink, buffer } = endpoint;
        let Some(buffer) = buffer.as_mut() else {
            return 0;
        };
        if buffer.ring.is_empty() || buffer.failed {
            return 0;
        }

        let was_stalled = buffer.stalled;
        let mut sent = 0;
        loop {
            let run = buffer.ring.peek_contiguous(self.config.chunk_size);
            if run.is_empty() {
                break;
            }
            let offered = run.len();

            match sink.write(run) {
                Ok(0) => {
                    debug!(socket = id, "socket accepted zero bytes, treating as closed");
                    buffer.failed = true;
                    break;
                }
                Ok(n) => {
                    buffer.ring.advance(n);
                    buffer.bytes_sent_total += n as u64;
                    sent += n;
                    if n < offered {
                        break;
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(socket = id, error = %e, "socket send failed");
                    buffer.failed = true;
                    break;
                }
            }
        }

        buffer.note_cycle(sent, &self.config, self.clock.as_ref());
        if buffer.stalled && !was_stalled {
            warn!(socket = id, pending = buffer.ring.used_len(), "socket stalled");
        }
        sent
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
