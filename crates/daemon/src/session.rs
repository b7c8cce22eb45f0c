// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connected clients.
//!
//! The registry owns every live [`Session`] behind one lock. Sessions are
//! created by the IO loop on accept and removed by [`SessionRegistry::sweep`]
//! or at shutdown; nothing else closes a client.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use asset_core::{elapsed_ms, ClockSource, SocketId, Transport};
use asset_proto::{ProtocolError, ProtocolHandler};
use chrono::{DateTime, Local};
use tracing::{debug, info};

/// First id handed to a client.
pub const FIRST_CLIENT_ID: u32 = 1000;

/// Why a session was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvictReason {
    /// No inbound traffic within the session timeout.
    TimedOut,
    /// Peer closed the connection or broke the protocol.
    Disconnected,
    /// The transport stopped making progress on this socket.
    Stalled,
    /// A send failed at the OS level.
    SocketError,
}

impl fmt::Display for EvictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EvictReason::TimedOut => "timed out",
            EvictReason::Disconnected => "disconnected",
            EvictReason::Stalled => "stalled",
            EvictReason::SocketError => "socket error",
        };
        f.write_str(text)
    }
}

/// Read-only view of a session for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: u32,
    pub description: String,
    pub connected_at: DateTime<Local>,
}

/// One connected client.
pub struct Session {
    handler: Box<dyn ProtocolHandler>,
    /// Transport socket to close on eviction, if the handler writes through one.
    socket: Option<SocketId>,
    connected_at: DateTime<Local>,
    /// Set when a send fails; the next sweep evicts the session.
    broken: Option<EvictReason>,
}

impl Session {
    pub fn id(&self) -> u32 {
        self.handler.id()
    }

    pub fn info(&self) -> SessionInfo {
        SessionInfo {
            id: self.handler.id(),
            description: self.handler.description(),
            connected_at: self.connected_at,
        }
    }

    /// Sends a file. Failures mark the session for eviction.
    pub fn send_file(&mut self, path: &str, contents: &[u8], pending: u32) -> bool {
        let result = self.handler.send_file(path, contents, pending);
        self.note_send(result)
    }

    /// Sends a command. Failures mark the session for eviction.
    pub fn send_command(&mut self, text: &str) -> bool {
        let result = self.handler.send_command(text);
        self.note_send(result)
    }

    fn note_send(&mut self, result: asset_proto::Result<()>) -> bool {
        match result {
            Ok(()) => true,
            Err(e) => {
                debug!(client = self.id(), error = %e, "send failed");
                self.broken.get_or_insert(match e {
                    ProtocolError::Disconnected => EvictReason::Disconnected,
                    _ => EvictReason::SocketError,
                });
                false
            }
        }
    }
}

/// All live sessions, shared by the IO loop, the distributor, and the
/// control channel.
pub struct SessionRegistry {
    sessions: Mutex<Vec<Session>>,
    next_id: AtomicU32,
    timeout_ms: u64,
    clock: Arc<dyn ClockSource>,
    transport: Arc<Transport>,
}

impl SessionRegistry {
    pub fn new(transport: Arc<Transport>, clock: Arc<dyn ClockSource>, timeout: Duration) -> Self {
        SessionRegistry {
            sessions: Mutex::new(Vec::new()),
            next_id: AtomicU32::new(FIRST_CLIENT_ID),
            timeout_ms: timeout.as_millis() as u64,
            clock,
            transport,
        }
    }

    /// Reserves the id for the next client.
    pub fn allocate_id(&self) -> u32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Adds an accepted client. Returns its id.
    pub fn register(&self, handler: Box<dyn ProtocolHandler>, socket: Option<SocketId>) -> u32 {
        let session = Session { handler, socket, connected_at: Local::now(), broken: None };
        let id = session.id();
        info!("Client connected (#{} {})", id, session.handler.description());
        self.lock().push(session);
        id
    }

    /// Services every session and evicts the dead ones.
    ///
    /// Each session processes its inbound traffic first, then is checked
    /// for failed sends, the activity timeout, and transport liveness.
    pub fn sweep(&self) -> Vec<(u32, EvictReason)> {
        let mut sessions = self.lock();
        let mut evicted = Vec::new();

        let mut i = 0;
        while i < sessions.len() {
            match self.check(&mut sessions[i]) {
                Some(reason) => {
                    let session = sessions.remove(i);
                    evicted.push((session.id(), reason));
                    self.close(session, reason);
                }
                None => i += 1,
            }
        }
        evicted
    }

    fn check(&self, session: &mut Session) -> Option<EvictReason> {
        if let Some(reason) = session.broken {
            return Some(reason);
        }

        if let Err(e) = session.handler.process() {
            match e {
                ProtocolError::Disconnected => {}
                e => debug!(client = session.id(), error = %e, "protocol error"),
            }
            return Some(EvictReason::Disconnected);
        }

        if elapsed_ms(self.clock.as_ref(), session.handler.last_active_ms()) > self.timeout_ms {
            return Some(EvictReason::TimedOut);
        }

        let socket = session.socket?;
        match self.transport.stats(socket) {
            Some(stats) if stats.stalled => Some(EvictReason::Stalled),
            Some(stats) if stats.failed => Some(EvictReason::SocketError),
            Some(_) => None,
            None => Some(EvictReason::SocketError),
        }
    }

    fn close(&self, session: Session, reason: EvictReason) {
        let id = session.id();
        match reason {
            EvictReason::TimedOut => info!("Client timed out (#{})", id),
            EvictReason::Stalled => info!("Client stalled (#{})", id),
            EvictReason::Disconnected => info!("Client disconnected (#{})", id),
            EvictReason::SocketError => info!("Client disconnected (#{}, {})", id, reason),
        }
        if let Some(socket) = session.socket {
            self.transport.close(socket);
        }
        // Dropping the handler closes the read half.
    }

    /// Runs `f` on every live session matching `target` (all when `None`).
    ///
    /// Sessions already known to be dead (failed send, stalled or failed
    /// socket) are skipped; the next sweep removes them. The registry lock is
    /// held for the duration, so `f` must not block.
    pub fn for_each_matching(&self, target: Option<u32>, mut f: impl FnMut(usize, &mut Session)) -> usize {
        let mut sessions = self.lock();
        let mut visited = 0;
        let live = sessions
            .iter_mut()
            .filter(|s| target.map_or(true, |t| s.id() == t))
            .filter(|s| s.broken.is_none() && s.socket.map_or(true, |id| self.transport.is_alive(id)));
        for session in live {
            f(visited, session);
            visited += 1;
        }
        visited
    }

    /// Sends a command to every session. Returns how many accepted it.
    pub fn forward(&self, text: &str) -> usize {
        let mut delivered = 0;
        self.for_each_matching(None, |_, session| {
            if session.send_command(text) {
                delivered += 1;
            }
        });
        delivered
    }

    pub fn list(&self) -> Vec<SessionInfo> {
        self.lock().iter().map(Session::info).collect()
    }

    pub fn ids(&self) -> Vec<u32> {
        self.lock().iter().map(Session::id).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every session. Used at shutdown.
    pub fn close_all(&self) {
        let sessions: Vec<Session> = self.lock().drain(..).collect();
        for session in sessions {
            debug!(client = session.id(), "closing session");
            if let Some(socket) = session.socket {
                self.transport.close(socket);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
