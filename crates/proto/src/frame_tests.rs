// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use yare::parameterized;

fn u32_at(buf: &[u8], at: usize) -> u32 {
    u32::from_le_bytes(buf[at..at + 4].try_into().unwrap())
}

#[parameterized(
    ping = { Frame::Ping },
    pong = { Frame::Pong },
    log = { Frame::Log("loading scene".into()) },
    command = { Frame::Command(".reload".into()) },
    empty_command = { Frame::Command(String::new()) },
    file = { Frame::FileBegin { pending: 3, path: "assets/a.png".into(), length: 12 } },
    chunk = { Frame::FileChunk { pending: 0, offset: 8192, data: vec![1, 2, 3, 0, 4] } },
)]
fn decode_reads_back_encoded_frame(frame: Frame) {
    let bytes = frame.encode();
    let (decoded, used) = decode(&bytes).unwrap().unwrap();
    assert_eq!(decoded, frame);
    assert_eq!(used, bytes.len());
}

#[test]
fn header_layout() {
    let bytes = Frame::Ping.encode();
    assert_eq!(bytes.len(), 12);
    assert_eq!(u32_at(&bytes, 0), 12);
    assert_eq!(u32_at(&bytes, 4), CHECKPOINT);
    assert_eq!(&bytes[8..12], b"PING");
}

/// Concatenates little-endian words and raw byte runs into one frame.
fn wire(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

fn le(value: u32) -> [u8; 4] {
    value.to_le_bytes()
}

#[test]
fn command_string_is_length_prefixed_without_terminator() {
    let bytes = Frame::Command("hi".into()).encode();
    assert_eq!(&bytes[8..12], b"CMD1");
    assert_eq!(u32_at(&bytes, 12), 2);
    assert_eq!(&bytes[16..], b"hi");
    assert_eq!(bytes.len(), 16 + 2);
    assert_eq!(u32_at(&bytes, 0) as usize, bytes.len());
}

#[test]
fn command_frame_matches_client_layout() {
    let expected = wire(&[&le(18), &le(CHECKPOINT), b"CMD1", &le(2), b"hi"]);
    assert_eq!(Frame::Command("hi".into()).encode(), expected);
}

#[test]
fn log_frame_matches_client_layout() {
    let expected = wire(&[&le(16 + 5), &le(CHECKPOINT), b"LOG1", &le(5), b"ready"]);
    assert_eq!(Frame::Log("ready".into()).encode(), expected);
}

#[test]
fn file_header_matches_client_layout() {
    // The path length counts its NUL terminator; the frame is 7 words plus the path.
    let expected = wire(&[
        &le(7 * 4 + 6),
        &le(CHECKPOINT),
        b"FILE",
        &le(2),
        &le(6),
        b"a.txt\0",
        &le(3),
        &le(FILE_END),
    ]);
    let bytes = Frame::FileBegin { pending: 2, path: "a.txt".into(), length: 3 }.encode();
    assert_eq!(bytes, expected);
}

#[test]
fn file_chunk_matches_client_layout() {
    let expected = wire(&[
        &le(7 * 4 + 3),
        &le(CHECKPOINT),
        b"FCHK",
        &le(2),
        &le(0),
        &le(3),
        b"xyz",
        &le(CHUNK_END),
    ]);
    let frames: Vec<Vec<u8>> = file_frames("a.txt", b"xyz", 2).unwrap().collect();
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[1], expected);
}

#[test]
fn client_reader_finds_length_and_marker_after_path() {
    // A client reads the path string, then the next two words directly.
    let bytes = Frame::FileBegin { pending: 0, path: "assets/a.png".into(), length: 0x300 }.encode();
    let path_len = u32_at(&bytes, 16) as usize;
    assert_eq!(&bytes[20..20 + path_len], b"assets/a.png\0");
    assert_eq!(u32_at(&bytes, 20 + path_len), 0x300);
    assert_eq!(u32_at(&bytes, 24 + path_len), FILE_END);
    assert_eq!(bytes.len(), 28 + path_len);
}

#[test]
fn file_header_ends_with_marker() {
    let bytes = Frame::FileBegin { pending: 0, path: "src/x".into(), length: 9 }.encode();
    let n = bytes.len();
    assert_eq!(u32_at(&bytes, n - 4), FILE_END);
    assert_eq!(u32_at(&bytes, n - 8), 9);
}

#[test]
fn partial_frame_needs_more_bytes() {
    let bytes = Frame::Log("partial".into()).encode();
    for cut in [0, 3, 8, bytes.len() - 1] {
        assert!(decode(&bytes[..cut]).unwrap().is_none(), "cut at {cut}");
    }
}

#[test]
fn decode_consumes_only_the_first_frame() {
    let mut bytes = Frame::Ping.encode();
    bytes.extend(Frame::Log("next".into()).encode());

    let (frame, used) = decode(&bytes).unwrap().unwrap();
    assert_eq!(frame, Frame::Ping);
    let (frame, _) = decode(&bytes[used..]).unwrap().unwrap();
    assert_eq!(frame, Frame::Log("next".into()));
}

#[test]
fn bad_checkpoint_is_rejected() {
    let mut bytes = Frame::Ping.encode();
    bytes[4] ^= 0xFF;
    assert!(matches!(decode(&bytes), Err(FrameError::BadCheckpoint { .. })));
}

#[test]
fn oversized_length_is_rejected() {
    let mut bytes = Frame::Ping.encode();
    bytes[..4].copy_from_slice(&((MAX_FRAME_LEN + 1) as u32).to_le_bytes());
    assert!(matches!(decode(&bytes), Err(FrameError::TooLarge(_))));
}

#[test]
fn undersized_length_is_rejected() {
    let mut bytes = Frame::Ping.encode();
    bytes[..4].copy_from_slice(&4u32.to_le_bytes());
    assert!(matches!(decode(&bytes), Err(FrameError::TooShort(4))));
}

#[test]
fn string_longer_than_frame_is_truncated() {
    let mut bytes = Frame::Log("abc".into()).encode();
    bytes[12..16].copy_from_slice(&100u32.to_le_bytes());
    assert!(matches!(decode(&bytes), Err(FrameError::Truncated)));
}

#[test]
fn unknown_fourcc_is_preserved() {
    let fourcc = u32::from_le_bytes(*b"ZZZZ");
    let bytes = Frame::Unknown { fourcc }.encode();
    assert_eq!(decode(&bytes).unwrap().unwrap().0, Frame::Unknown { fourcc });
}

#[parameterized(
    newline = { "hello\n", "hello" },
    crlf = { "hello\r\n", "hello" },
    nul = { "hello\0", "hello" },
    inner_space = { "a b ", "a b " },
)]
fn log_text_is_trimmed(sent: &str, expected: &str) {
    let bytes = Frame::Log(sent.into()).encode();
    assert_eq!(decode(&bytes).unwrap().unwrap().0, Frame::Log(expected.into()));
}

#[test]
fn file_frames_split_contents_into_chunks() {
    let contents: Vec<u8> = (0..(MAX_CHUNK_LEN * 2 + 10)).map(|i| (i % 251) as u8).collect();
    let frames: Vec<Vec<u8>> = file_frames("assets/big.bin", &contents, 4).unwrap().collect();
    assert_eq!(frames.len(), 4);

    let (header, _) = decode(&frames[0]).unwrap().unwrap();
    assert_eq!(
        header,
        Frame::FileBegin { pending: 4, path: "assets/big.bin".into(), length: contents.len() as u32 }
    );

    let mut rebuilt = Vec::new();
    for (i, bytes) in frames[1..].iter().enumerate() {
        let (frame, _) = decode(bytes).unwrap().unwrap();
        let Frame::FileChunk { pending, offset, data } = frame else { unreachable!("expected chunk frame") };
        assert_eq!(pending, 4);
        assert_eq!(offset as usize, i * MAX_CHUNK_LEN);
        assert!(data.len() <= MAX_CHUNK_LEN);
        rebuilt.extend(data);
    }
    assert_eq!(rebuilt, contents);
}

#[test]
fn empty_file_is_header_only() {
    let frames: Vec<Vec<u8>> = file_frames("src/empty.ls", &[], 0).unwrap().collect();
    assert_eq!(frames.len(), 1);
    let (frame, _) = decode(&frames[0]).unwrap().unwrap();
    assert_eq!(frame, Frame::FileBegin { pending: 0, path: "src/empty.ls".into(), length: 0 });
}
