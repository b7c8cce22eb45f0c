// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for protocol operations.

use thiserror::Error;

use crate::frame::MAX_FRAME_LEN;

/// Malformed or unrepresentable frame.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("bad frame checkpoint: expected {expected:#010x}, found {found:#010x}")]
    BadCheckpoint { expected: u32, found: u32 },

    #[error("frame too large: {0} bytes (max {max})", max = MAX_FRAME_LEN)]
    TooLarge(usize),

    #[error("frame too short: {0} bytes")]
    TooShort(usize),

    #[error("frame payload ends early")]
    Truncated,
}

/// Errors raised while talking to a client. All of them end the session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("client disconnected")]
    Disconnected,

    #[error("protocol error: {0}")]
    Frame(#[from] FrameError),

    #[error("transport error: {0}")]
    Transport(#[from] asset_core::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
