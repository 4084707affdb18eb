//! Incremental decoder for `data:`-framed event streams.
//!
//! Frames are separated by a blank line. Inside a frame only `data:` lines
//! carry payload; multiple `data:` lines are joined with `\n`. The payload
//! `[DONE]` marks logical end-of-stream and is surfaced as [`Frame::Done`]
//! instead of being handed to a JSON parser.
//!
//! Input is buffered as bytes, so chunk boundaries may fall anywhere: inside
//! the marker, inside a JSON token, between `\r` and `\n`, or in the middle
//! of a multi-byte UTF-8 sequence.

use futures::StreamExt;

use super::ByteStream;
use crate::error::QuillError;

const DATA_MARKER: &str = "data:";

/// Payload value that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// One decoded unit of the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Payload text of a frame (normally one JSON document).
    Data(String),
    /// The end-of-stream sentinel.
    Done,
}

/// Push-based frame decoder.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of the current, not yet terminated line.
    pending: Vec<u8>,
    /// `data:` values collected for the frame being built.
    data_lines: Vec<String>,
    done: bool,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the end-of-stream sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed one chunk and return the frames it completes.
    ///
    /// Anything after the sentinel is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }

        // Pending bytes never contain a newline, so only the new chunk is scanned.
        let mut buffer = std::mem::take(&mut self.pending);
        let mut scan = buffer.len();
        buffer.extend_from_slice(chunk);

        let mut consumed = 0;
        while let Some(pos) = buffer[scan..].iter().position(|&b| b == b'\n') {
            let line_end = scan + pos;
            let mut line = &buffer[consumed..line_end];
            if line.last() == Some(&b'\r') {
                line = &line[..line.len() - 1];
            }
            consumed = line_end + 1;
            scan = consumed;

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
                if self.done {
                    return frames;
                }
            }
        }

        buffer.drain(..consumed);
        self.pending = buffer;
        frames
    }

    /// Flush at physical end of input.
    ///
    /// A trailing unterminated line and a frame missing its closing blank
    /// line are still delivered.
    pub fn finish(&mut self) -> Vec<Frame> {
        let mut frames = Vec::new();
        if self.done {
            return frames;
        }
        let rest = std::mem::take(&mut self.pending);
        let rest = rest.strip_suffix(b"\r").unwrap_or(&rest);
        if !rest.is_empty() {
            frames.extend(self.process_line(rest));
        }
        if !self.done {
            frames.extend(self.dispatch());
        }
        frames
    }

    fn process_line(&mut self, line: &[u8]) -> Option<Frame> {
        if line.is_empty() {
            return self.dispatch();
        }
        let line = String::from_utf8_lossy(line);
        if line.starts_with(':') {
            return None;
        }
        if let Some(value) = line.strip_prefix(DATA_MARKER) {
            let value = value.strip_prefix(' ').unwrap_or(value);
            self.data_lines.push(value.to_string());
        }
        None
    }

    fn dispatch(&mut self) -> Option<Frame> {
        if self.data_lines.is_empty() {
            return None;
        }
        let payload = std::mem::take(&mut self.data_lines).join("\n");
        if payload.trim_end() == DONE_SENTINEL {
            self.done = true;
            return Some(Frame::Done);
        }
        Some(Frame::Data(payload))
    }
}

/// Decode a byte stream into frames.
///
/// The output ends after [`Frame::Done`], after the input ends, or right
/// after the first read error.
pub fn decode_frames(
    mut bytes: ByteStream,
) -> futures::stream::BoxStream<'static, Result<Frame, QuillError>> {
    let stream = async_stream::stream! {
        let mut decoder = FrameDecoder::new();
        let mut failed = false;

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => {
                    for frame in decoder.push(&chunk) {
                        yield Ok(frame);
                    }
                    if decoder.is_done() {
                        break;
                    }
                }
                Err(err) => {
                    failed = true;
                    yield Err(err);
                    break;
                }
            }
        }

        if !failed {
            for frame in decoder.finish() {
                yield Ok(frame);
            }
        }
    };

    Box::pin(stream)
}
