// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-connection protocol handling.

use std::io::{self, Read};
use std::net::SocketAddr;
use std::sync::Arc;

use asset_core::{ClockSource, SocketId, Transport};
use tracing::{debug, info, trace, warn};

use crate::error::{ProtocolError, Result};
use crate::frame::{decode, file_frames, Frame, MAX_FRAME_LEN};

/// Reads attempted per [`ProtocolHandler::process`] call.
const MAX_READS_PER_PROCESS: usize = 64;

/// One client connection as seen by the agent.
///
/// Any error returned from a method means the connection is unusable and
/// the session should be evicted.
pub trait ProtocolHandler: Send {
    /// Client id assigned at accept time.
    fn id(&self) -> u32;

    /// Human-readable peer description.
    fn description(&self) -> String;

    /// Clock time (ms) of the last inbound frame.
    fn last_active_ms(&self) -> u64;

    /// Queues a file transfer. `pending` is the number of files still queued
    /// behind this one in the current batch.
    fn send_file(&mut self, path: &str, contents: &[u8], pending: u32) -> Result<()>;

    /// Queues a command for the client.
    fn send_command(&mut self, text: &str) -> Result<()>;

    /// Handles whatever the client has sent since the last call.
    fn process(&mut self) -> Result<()>;
}

/// Handler for the asset wire protocol.
///
/// Reads come straight from the socket's read half; every write goes
/// through the shared [`Transport`] under `socket`.
pub struct AssetProtocolHandler<R> {
    id: u32,
    socket: SocketId,
    peer: Option<SocketAddr>,
    reader: R,
    transport: Arc<Transport>,
    clock: Arc<dyn ClockSource>,
    inbound: Vec<u8>,
    last_active_ms: u64,
}

impl<R: Read + Send> AssetProtocolHandler<R> {
    /// Creates a handler. The reader should be non-blocking.
    pub fn new(
        id: u32,
        socket: SocketId,
        reader: R,
        transport: Arc<Transport>,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        let last_active_ms = clock.now_ms();
        AssetProtocolHandler {
            id,
            socket,
            peer: None,
            reader,
            transport,
            clock,
            inbound: Vec::new(),
            last_active_ms,
        }
    }

    pub fn with_peer(mut self, peer: SocketAddr) -> Self {
        self.peer = Some(peer);
        self
    }

    fn send(&self, bytes: &[u8]) -> Result<()> {
        self.transport.write(self.socket, bytes)?;
        Ok(())
    }

    /// Pulls available bytes until the socket would block.
    fn fill(&mut self) -> Result<()> {
        let mut buf = [0u8; 4096];
        for _ in 0..MAX_READS_PER_PROCESS {
            match self.reader.read(&mut buf) {
                Ok(0) => return Err(ProtocolError::Disconnected),
                Ok(n) => self.inbound.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
            if self.inbound.len() > MAX_FRAME_LEN {
                break;
            }
        }
        Ok(())
    }

    fn handle_frame(&mut self, frame: Frame) -> Result<()> {
        match frame {
            Frame::Ping => {
                trace!(client = self.id, "ping");
                self.send(&Frame::Pong.encode())
            }
            Frame::Pong => Ok(()),
            Frame::Log(text) => {
                info!(client = self.id, "{}", text);
                Ok(())
            }
            Frame::Command(text) => {
                debug!(client = self.id, command = %text, "ignoring command from client");
                Ok(())
            }
            Frame::FileBegin { .. } | Frame::FileChunk { .. } => {
                debug!(client = self.id, "ignoring file frame from client");
                Ok(())
            }
            Frame::Unknown { fourcc } => {
                warn!(client = self.id, fourcc = %format_fourcc(fourcc), "unknown frame type");
                Ok(())
            }
        }
    }
}

impl<R: Read + Send> ProtocolHandler for AssetProtocolHandler<R> {
    fn id(&self) -> u32 {
        self.id
    }

    fn description(&self) -> String {
        match self.peer {
            Some(peer) => format!("[ip={peer}]"),
            None => "[ip=unknown]".to_string(),
        }
    }

    fn last_active_ms(&self) -> u64 {
        self.last_active_ms
    }

    fn send_file(&mut self, path: &str, contents: &[u8], pending: u32) -> Result<()> {
        for frame in file_frames(path, contents, pending)? {
            self.send(&frame)?;
        }
        Ok(())
    }

    fn send_command(&mut self, text: &str) -> Result<()> {
        self.send(&Frame::Command(text.to_string()).encode())
    }

    fn process(&mut self) -> Result<()> {
        self.fill()?;

        let mut consumed = 0;
        while let Some((frame, used)) = decode(&self.inbound[consumed..])? {
            consumed += used;
            self.last_active_ms = self.clock.now_ms();
            self.handle_frame(frame)?;
        }
        self.inbound.drain(..consumed);
        Ok(())
    }
}

/// Renders a fourcc as text when printable, hex otherwise.
fn format_fourcc(fourcc: u32) -> String {
    let bytes = fourcc.to_le_bytes();
    if bytes.iter().all(|b| b.is_ascii_graphic()) {
        String::from_utf8_lossy(&bytes).into_owned()
    } else {
        format!("{fourcc:#010x}")
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
