// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

/// Consumes everything pending, one contiguous run at a time.
fn drain(ring: &mut RingBuffer) -> Vec<u8> {
    let mut out = Vec::new();
    while !ring.is_empty() {
        let run = ring.peek_contiguous(usize::MAX).to_vec();
        ring.advance(run.len());
        out.extend(run);
    }
    out
}

#[test]
fn new_buffer_is_empty() {
    let ring = RingBuffer::new(16);
    assert_eq!(ring.capacity(), 16);
    assert_eq!(ring.used_len(), 0);
    assert_eq!(ring.free_len(), 16);
    assert!(ring.is_empty());
    assert!(ring.peek_contiguous(8).is_empty());
}

#[test]
fn offer_and_peek() {
    let mut ring = RingBuffer::new(8);
    assert!(ring.offer(b"abc"));
    assert_eq!(ring.used_len(), 3);
    assert_eq!(ring.free_len(), 5);
    assert_eq!(ring.peek_contiguous(8), b"abc");
    assert_eq!(ring.peek_contiguous(2), b"ab");
}

#[test]
fn offer_rejects_what_does_not_fit() {
    let mut ring = RingBuffer::new(4);
    assert!(ring.offer(b"abc"));
    assert!(!ring.offer(b"de"));
    assert_eq!(ring.used_len(), 3);
    assert_eq!(drain(&mut ring), b"abc");
}

#[test]
fn offer_into_zero_capacity() {
    let mut ring = RingBuffer::new(0);
    assert!(ring.offer(b""));
    assert!(!ring.offer(b"x"));
}

#[test]
fn wraparound_exposes_first_region_only() {
    let mut ring = RingBuffer::new(8);
    assert!(ring.offer(b"123456"));
    ring.advance(5);
    assert!(ring.offer(b"abcde"));

    // "6ab" sits at the end of storage, "cde" wrapped to the start.
    assert_eq!(ring.used_len(), 6);
    assert_eq!(ring.peek_contiguous(16), b"6ab");
    ring.advance(3);
    assert_eq!(ring.peek_contiguous(16), b"cde");
}

#[test]
fn advance_is_clamped() {
    let mut ring = RingBuffer::new(4);
    assert!(ring.offer(b"ab"));
    ring.advance(10);
    assert!(ring.is_empty());
    assert_eq!(ring.free_len(), 4);
}

#[test]
fn resize_grow_preserves_wrapped_order() {
    let mut ring = RingBuffer::new(8);
    assert!(ring.offer(b"xxxxxx"));
    ring.advance(5);
    assert!(ring.offer(b"hello"));
    assert_eq!(ring.peek_contiguous(32), b"xhe");

    ring.resize(32);
    assert_eq!(ring.capacity(), 32);
    assert_eq!(ring.peek_contiguous(32), b"xhello");
    ring.advance(1);
    assert!(ring.offer(b" world"));
    assert_eq!(drain(&mut ring), b"hello world");
}

#[test]
fn resize_shrink_never_drops_pending_bytes() {
    let mut ring = RingBuffer::new(64);
    assert!(ring.offer(b"0123456789"));

    ring.resize(4);
    assert_eq!(ring.capacity(), 10);
    assert_eq!(ring.free_len(), 0);
    assert_eq!(drain(&mut ring), b"0123456789");
}

#[test]
fn interleaved_offer_and_advance_round_trip() {
    let mut ring = RingBuffer::new(7);
    let mut expected = Vec::new();
    let mut received = Vec::new();

    for i in 0u8..50 {
        let chunk = [i, i.wrapping_mul(3)];
        if !ring.offer(&chunk) {
            received.extend(drain(&mut ring));
            assert!(ring.offer(&chunk));
        }
        expected.extend_from_slice(&chunk);

        let run = ring.peek_contiguous(3).to_vec();
        ring.advance(run.len());
        received.extend(run);
    }
    received.extend(drain(&mut ring));

    assert_eq!(received, expected);
}
