//! Frame decoder: turns arbitrary-size byte reads from a worker pipe into a
//! sequence of newline-delimited frames, each either an opaque output line
//! or a parsed [`Record`].
use crate::record::{Record, MARKER};
use mm_core::LINE_LIMIT;

/// A single decoded line: either solver chatter (no `@@` marker anywhere in
/// the line) or a parsed protocol record.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Opaque(String),
    Record(Record),
}

/// Turn one complete line (CR already allowed, newline already stripped)
/// into a [`Frame`]. A frame is opaque unless it contains the literal `@@`
/// marker, in which case parsing starts at that marker — any bytes before
/// it are noise and are dropped (the decoding contract tolerates leading
/// noise such as stray carriage-return artefacts).
pub fn parse_frame(line: &str) -> Frame {
    let line = line.trim_end_matches('\r');
    match line.find(MARKER) {
        Some(at) => Frame::Record(Record::parse(&line[at + MARKER.len()..])),
        None => Frame::Opaque(line.to_string()),
    }
}

/// Buffers raw bytes from a non-blocking pipe read into complete frames.
///
/// Lines longer than [`LINE_LIMIT`] are truncated and parsed as if the
/// limit were the newline — the decoder never blocks waiting for a
/// terminator other than `\n`.
#[derive(Default)]
pub struct FrameReader {
    buf: Vec<u8>,
}

impl FrameReader {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed newly-read bytes, returning every frame that became complete.
    /// Incomplete trailing bytes remain buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Frame> {
        self.buf.extend_from_slice(bytes);
        let mut frames = Vec::new();
        loop {
            if let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
                let line = self.buf.drain(..=pos).collect::<Vec<u8>>();
                let line = &line[..line.len() - 1];
                frames.push(parse_frame(&String::from_utf8_lossy(line)));
                continue;
            }
            if self.buf.len() >= LINE_LIMIT {
                let line = self.buf.drain(..LINE_LIMIT).collect::<Vec<u8>>();
                frames.push(parse_frame(&String::from_utf8_lossy(&line)));
                continue;
            }
            break;
        }
        frames
    }

    /// Flush a non-empty partial line buffered at EOF as a final frame.
    pub fn flush(&mut self) -> Option<Frame> {
        if self.buf.is_empty() {
            return None;
        }
        let line = std::mem::take(&mut self.buf);
        Some(parse_frame(&String::from_utf8_lossy(&line)))
    }

    /// True if no partial line is currently buffered.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}
