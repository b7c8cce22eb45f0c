// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fakes for unit tests.

#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use asset_core::ClockSource;
use asset_proto::{ProtocolError, ProtocolHandler, Result};

/// Mock clock for testing with controllable time.
pub struct MockClock {
    time_ms: AtomicU64,
}

impl MockClock {
    pub fn new(initial_ms: u64) -> Arc<Self> {
        Arc::new(MockClock { time_ms: AtomicU64::new(initial_ms) })
    }

    pub fn advance(&self, ms: u64) {
        self.time_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl ClockSource for MockClock {
    fn now_ms(&self) -> u64 {
        self.time_ms.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub struct HandlerState {
    pub files: Vec<(String, Vec<u8>, u32)>,
    pub commands: Vec<String>,
    pub last_active_ms: u64,
    pub hung_up: bool,
    pub fail_sends: bool,
}

/// Protocol handler that records sends. Clones share state.
#[derive(Clone)]
pub struct MockHandler {
    id: u32,
    pub state: Arc<Mutex<HandlerState>>,
}

impl MockHandler {
    pub fn new(id: u32, last_active_ms: u64) -> Self {
        let state = HandlerState { last_active_ms, ..Default::default() };
        MockHandler { id, state: Arc::new(Mutex::new(state)) }
    }

    pub fn boxed(&self) -> Box<dyn ProtocolHandler> {
        Box::new(self.clone())
    }

    pub fn files(&self) -> Vec<(String, Vec<u8>, u32)> {
        self.state.lock().unwrap().files.clone()
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.files().into_iter().map(|(p, _, _)| p).collect()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state.lock().unwrap().commands.clone()
    }

    pub fn touch(&self, now_ms: u64) {
        self.state.lock().unwrap().last_active_ms = now_ms;
    }

    pub fn hang_up(&self) {
        self.state.lock().unwrap().hung_up = true;
    }

    pub fn fail_sends(&self) {
        self.state.lock().unwrap().fail_sends = true;
    }
}

impl ProtocolHandler for MockHandler {
    fn id(&self) -> u32 {
        self.id
    }

    fn description(&self) -> String {
        format!("[ip=mock:{}]", self.id)
    }

    fn last_active_ms(&self) -> u64 {
        self.state.lock().unwrap().last_active_ms
    }

    fn send_file(&mut self, path: &str, contents: &[u8], pending: u32) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(ProtocolError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        state.files.push((path.to_string(), contents.to_vec(), pending));
        Ok(())
    }

    fn send_command(&mut self, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_sends {
            return Err(ProtocolError::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        state.commands.push(text.to_string());
        Ok(())
    }

    fn process(&mut self) -> Result<()> {
        if self.state.lock().unwrap().hung_up {
            return Err(ProtocolError::Disconnected);
        }
        Ok(())
    }
}
