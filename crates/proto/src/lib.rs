// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client wire protocol for the asset agent.
//!
//! This crate defines the frame format spoken with runtime clients and the
//! per-connection [`ProtocolHandler`] the agent drives. Outbound frames are
//! written through the buffered [`asset_core::Transport`], so a slow client
//! never blocks the caller.

pub mod error;
pub mod frame;
pub mod handler;

pub use error::{FrameError, ProtocolError, Result};
pub use frame::{decode, file_frames, FourCc, Frame, MAX_FRAME_LEN};
pub use handler::{AssetProtocolHandler, ProtocolHandler};
