// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Frame encoding and decoding.
//!
//! Every frame is a little-endian header followed by a payload:
//!
//! ```text
//! u32 total_len | u32 0xDEADBEEF | u32 fourcc | payload
//! ```
//!
//! `total_len` counts the whole frame including itself. Strings in a payload
//! are a `u32` byte length followed by exactly that many bytes. The `FILE`
//! path is the one string sent with its NUL terminator, counted in the
//! length. File
//! contents travel as one `FILE` header frame followed by `FCHK` chunks of at
//! most [`MAX_CHUNK_LEN`] bytes, each closed by its own checkpoint marker.

use crate::error::FrameError;

/// Marker after the length field of every frame.
pub const CHECKPOINT: u32 = 0xDEAD_BEEF;
/// Marker closing a `FILE` header.
pub const FILE_END: u32 = 0xDEAD_BEE3;
/// Marker closing an `FCHK` chunk.
pub const CHUNK_END: u32 = 0xDEAD_BEE2;

/// Largest file slice carried by one chunk frame.
pub const MAX_CHUNK_LEN: usize = 8 * 1024;
/// Largest inbound frame accepted from a client.
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

const HEADER_LEN: usize = 12;

/// Four-character frame type tags, read as little-endian `u32`.
pub struct FourCc;

impl FourCc {
    pub const PING: u32 = u32::from_le_bytes(*b"PING");
    pub const PONG: u32 = u32::from_le_bytes(*b"PONG");
    pub const LOG: u32 = u32::from_le_bytes(*b"LOG1");
    pub const COMMAND: u32 = u32::from_le_bytes(*b"CMD1");
    pub const FILE: u32 = u32::from_le_bytes(*b"FILE");
    pub const CHUNK: u32 = u32::from_le_bytes(*b"FCHK");
}

/// A decoded protocol frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Ping,
    Pong,
    /// Log text from a client.
    Log(String),
    /// Command text, forwarded to a client.
    Command(String),
    /// Start of a file transfer. `pending` is how many files are queued
    /// behind this one, `length` the total content size.
    FileBegin { pending: u32, path: String, length: u32 },
    /// A slice of file contents starting at `offset`.
    FileChunk { pending: u32, offset: u32, data: Vec<u8> },
    /// Well-formed frame of a type this side does not handle.
    Unknown { fourcc: u32 },
}

impl Frame {
    /// Serializes the frame to its wire form.
    ///
    /// Lengths are written as `u32`; callers keep payloads below 4 GiB.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Frame::Ping => FrameWriter::new(FourCc::PING).finish(),
            Frame::Pong => FrameWriter::new(FourCc::PONG).finish(),
            Frame::Log(text) => FrameWriter::new(FourCc::LOG).string(text.as_bytes()).finish(),
            Frame::Command(text) => FrameWriter::new(FourCc::COMMAND).string(text.as_bytes()).finish(),
            Frame::FileBegin { pending, path, length } => FrameWriter::new(FourCc::FILE)
                .u32(*pending)
                .string(&nul_terminated(path))
                .u32(*length)
                .u32(FILE_END)
                .finish(),
            Frame::FileChunk { pending, offset, data } => FrameWriter::new(FourCc::CHUNK)
                .u32(*pending)
                .u32(*offset)
                .string(data)
                .u32(CHUNK_END)
                .finish(),
            Frame::Unknown { fourcc } => FrameWriter::new(*fourcc).finish(),
        }
    }
}

/// Encodes a whole file transfer: one header frame, then the content chunks.
///
/// An empty file yields only the header.
pub fn file_frames<'a>(
    path: &'a str,
    contents: &'a [u8],
    pending: u32,
) -> Result<impl Iterator<Item = Vec<u8>> + 'a, FrameError> {
    let length = u32::try_from(contents.len()).map_err(|_| FrameError::TooLarge(contents.len()))?;

    let header = Frame::FileBegin { pending, path: path.to_string(), length }.encode();
    let chunks = contents.chunks(MAX_CHUNK_LEN).enumerate().map(move |(i, chunk)| {
        // Offsets fit: the whole file length was checked above.
        let offset = (i * MAX_CHUNK_LEN) as u32;
        FrameWriter::new(FourCc::CHUNK).u32(pending).u32(offset).string(chunk).u32(CHUNK_END).finish()
    });
    Ok(std::iter::once(header).chain(chunks))
}

/// Decodes the first frame in `buf`.
///
/// Returns `Ok(None)` until a whole frame is buffered, otherwise the frame
/// and the number of bytes it occupied. A bad checkpoint or impossible
/// length is an error: the stream cannot be resynchronized.
pub fn decode(buf: &[u8]) -> Result<Option<(Frame, usize)>, FrameError> {
    if buf.len() < 8 {
        return Ok(None);
    }
    let mut header = FrameReader::new(&buf[..8]);
    let total = header.u32()? as usize;
    let checkpoint = header.u32()?;
    if checkpoint != CHECKPOINT {
        return Err(FrameError::BadCheckpoint { expected: CHECKPOINT, found: checkpoint });
    }
    if total < HEADER_LEN {
        return Err(FrameError::TooShort(total));
    }
    if total > MAX_FRAME_LEN {
        return Err(FrameError::TooLarge(total));
    }
    if buf.len() < total {
        return Ok(None);
    }

    let mut reader = FrameReader::new(&buf[8..total]);
    let fourcc = reader.u32()?;
    let frame = match fourcc {
        FourCc::PING => Frame::Ping,
        FourCc::PONG => Frame::Pong,
        FourCc::LOG => Frame::Log(reader.text()?),
        FourCc::COMMAND => Frame::Command(reader.text()?),
        FourCc::FILE => {
            let pending = reader.u32()?;
            let path = reader.text()?;
            let length = reader.u32()?;
            reader.checkpoint(FILE_END)?;
            Frame::FileBegin { pending, path, length }
        }
        FourCc::CHUNK => {
            let pending = reader.u32()?;
            let offset = reader.u32()?;
            let data = reader.string()?.to_vec();
            reader.checkpoint(CHUNK_END)?;
            Frame::FileChunk { pending, offset, data }
        }
        fourcc => Frame::Unknown { fourcc },
    };
    Ok(Some((frame, total)))
}

fn nul_terminated(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() + 1);
    bytes.extend_from_slice(text.as_bytes());
    bytes.push(0);
    bytes
}

/// Builds one frame, patching the length field on finish.
struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    fn new(fourcc: u32) -> Self {
        let mut buf = Vec::with_capacity(64);
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&CHECKPOINT.to_le_bytes());
        buf.extend_from_slice(&fourcc.to_le_bytes());
        FrameWriter { buf }
    }

    fn u32(mut self, value: u32) -> Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    fn string(mut self, bytes: &[u8]) -> Self {
        self.buf.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
        self.buf.extend_from_slice(bytes);
        self
    }

    fn finish(mut self) -> Vec<u8> {
        let total = self.buf.len() as u32;
        self.buf[..4].copy_from_slice(&total.to_le_bytes());
        self.buf
    }
}

/// Cursor over a frame payload.
struct FrameReader<'a> {
    buf: &'a [u8],
}

impl<'a> FrameReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        FrameReader { buf }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], FrameError> {
        if self.buf.len() < n {
            return Err(FrameError::Truncated);
        }
        let (head, rest) = self.buf.split_at(n);
        self.buf = rest;
        Ok(head)
    }

    fn u32(&mut self) -> Result<u32, FrameError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Length-prefixed bytes.
    fn string(&mut self) -> Result<&'a [u8], FrameError> {
        let len = self.u32()? as usize;
        self.take(len)
    }

    /// A string as text, without trailing NULs or line breaks.
    fn text(&mut self) -> Result<String, FrameError> {
        let bytes = self.string()?;
        let text = String::from_utf8_lossy(bytes);
        Ok(text.trim_end_matches(['\0', '\r', '\n']).to_string())
    }

    fn checkpoint(&mut self, expected: u32) -> Result<(), FrameError> {
        let found = self.u32()?;
        if found != expected {
            return Err(FrameError::BadCheckpoint { expected, found });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
