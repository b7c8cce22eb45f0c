// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Variable-capacity circular byte buffer.
//!
//! Bytes are appended at the tail and consumed from the head. Pending data
//! occupies at most two regions of the backing storage (head to end, then
//! start to tail); [`RingBuffer::peek_contiguous`] only ever exposes the first
//! region so callers can hand it straight to a socket write without copying.

/// A circular byte buffer with explicit, caller-controlled capacity.
#[derive(Debug, Clone, Default)]
pub struct RingBuffer {
    data: Vec<u8>,
    head: usize,
    len: usize,
}

impl RingBuffer {
    /// Creates an empty buffer holding at most `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        RingBuffer { data: vec![0; capacity], head: 0, len: 0 }
    }

    /// Total bytes the buffer can hold.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes written but not yet consumed.
    pub fn used_len(&self) -> usize {
        self.len
    }

    /// Bytes that can be offered before the buffer is full.
    pub fn free_len(&self) -> usize {
        self.capacity() - self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends all of `bytes`, or nothing.
    ///
    /// Returns false without modifying the buffer if `bytes` does not fit.
    pub fn offer(&mut self, bytes: &[u8]) -> bool {
        if bytes.is_empty() {
            return true;
        }
        if bytes.len() > self.free_len() {
            return false;
        }

        let capacity = self.capacity();
        let tail = (self.head + self.len) % capacity;
        let first = bytes.len().min(capacity - tail);
        self.data[tail..tail + first].copy_from_slice(&bytes[..first]);
        let rest = bytes.len() - first;
        if rest > 0 {
            self.data[..rest].copy_from_slice(&bytes[first..]);
        }
        self.len += bytes.len();
        true
    }

    /// Returns up to `max_len` pending bytes that are contiguous in memory.
    ///
    /// May return fewer bytes than are pending when the data wraps around;
    /// the remainder becomes visible after [`advance`](Self::advance).
    pub fn peek_contiguous(&self, max_len: usize) -> &[u8] {
        if self.len == 0 {
            return &[];
        }
        let end = (self.head + self.len).min(self.capacity());
        let run = (end - self.head).min(max_len);
        &self.data[self.head..self.head + run]
    }

    /// Consumes `len` bytes from the head. Clamped to the pending length.
    pub fn advance(&mut self, len: usize) {
        let len = len.min(self.len);
        if len == 0 {
            return;
        }
        self.len -= len;
        self.head = if self.len == 0 { 0 } else { (self.head + len) % self.capacity() };
    }

    /// Changes capacity, preserving pending bytes in order.
    ///
    /// The new capacity is clamped so it never drops below
    /// [`used_len`](Self::used_len). Pending data is compacted to the start
    /// of the new storage.
    pub fn resize(&mut self, new_capacity: usize) {
        let new_capacity = new_capacity.max(self.len);
        if new_capacity == self.capacity() && self.head + self.len <= self.capacity() {
            return;
        }

        let mut data = vec![0; new_capacity];
        let first = self.peek_contiguous(self.len).len();
        data[..first].copy_from_slice(&self.data[self.head..self.head + first]);
        let rest = self.len - first;
        if rest > 0 {
            data[first..self.len].copy_from_slice(&self.data[..rest]);
        }
        self.data = data;
        self.head = 0;
    }
}

#[cfg(test)]
#[path = "ring_tests.rs"]
mod tests;
