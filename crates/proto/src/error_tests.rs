// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

#[parameterized(
    checkpoint = { FrameError::BadCheckpoint { expected: 0xDEADBEEF, found: 1 }, "0xdeadbeef" },
    too_large = { FrameError::TooLarge(5_000_000), "5000000" },
    too_short = { FrameError::TooShort(4), "4 bytes" },
    truncated = { FrameError::Truncated, "ends early" },
)]
fn frame_error_display_contains(err: FrameError, expected: &str) {
    assert!(err.to_string().contains(expected));
}

#[test]
fn protocol_error_from_frame() {
    let err: ProtocolError = FrameError::Truncated.into();
    assert!(matches!(err, ProtocolError::Frame(FrameError::Truncated)));
}

#[test]
fn protocol_error_from_transport() {
    let err: ProtocolError = asset_core::Error::UnknownSocket(3).into();
    assert!(err.to_string().contains("unknown socket: 3"));
}
