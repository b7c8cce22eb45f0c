// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for asset-core operations.

use thiserror::Error;

use crate::transport::SocketId;

/// All possible errors that can occur in asset-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown socket: {0}")]
    UnknownSocket(SocketId),

    #[error("write buffer overflow: {requested} bytes requested but only {free} free after growth")]
    BufferOverflow { requested: usize, free: usize },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for asset-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
