//! Server-Sent Events framing for streaming responses.
//!
//! [`FrameParser`] turns arbitrarily split text into [`RawFrame`]s, and
//! [`frames`] adapts a response byte stream into a lazy stream of frames,
//! decoding UTF-8 incrementally on the way.

use std::collections::VecDeque;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};

use crate::error::Result;
use crate::observability::STREAM_BYTES;
use crate::types::RawFrame;
use crate::utils::Utf8Decoder;

/// Prefix of the lines that carry frame data.
pub const DATA_PREFIX: &str = "data:";

/// Reassembles event frames from line-oriented text.
///
/// Text is fed in chunks of any size.  Complete lines are consumed as they
/// become available; a line that starts with `data:` contributes its body to
/// the current frame, and a blank line ends the frame.  Every other line
/// (`event:`, `id:`, comments) is ignored.
#[derive(Debug, Default)]
pub struct FrameParser {
    line_buffer: String,
    frame_buffer: String,
}

impl FrameParser {
    /// Creates a parser with empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk of text and returns the frames it completed, in order.
    pub fn push(&mut self, chunk: &str) -> Vec<RawFrame> {
        // The buffered tail never holds a newline, so only new text is scanned.
        let mut search = self.line_buffer.len();
        self.line_buffer.push_str(chunk);
        let mut buffer = std::mem::take(&mut self.line_buffer);
        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = buffer[search..].find('\n') {
            let end = search + offset;
            if let Some(frame) = self.handle_line(&buffer[start..end]) {
                frames.push(frame);
            }
            start = end + 1;
            search = start;
        }
        buffer.drain(..start);
        self.line_buffer = buffer;
        frames
    }

    /// Ends the input.
    ///
    /// An unterminated last line is processed as if it were terminated, and a
    /// frame still being assembled is returned: streams need not end with a
    /// blank line.
    pub fn finish(&mut self) -> Option<RawFrame> {
        let line = std::mem::take(&mut self.line_buffer);
        if !line.is_empty() {
            if let Some(frame) = self.handle_line(&line) {
                return Some(frame);
            }
        }
        self.take_frame()
    }

    fn handle_line(&mut self, line: &str) -> Option<RawFrame> {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return self.take_frame();
        }
        if let Some(data) = line.strip_prefix(DATA_PREFIX) {
            let data = data.strip_prefix(' ').unwrap_or(data);
            self.frame_buffer.push_str(data);
            self.frame_buffer.push('\n');
        }
        None
    }

    fn take_frame(&mut self) -> Option<RawFrame> {
        if self.frame_buffer.is_empty() {
            return None;
        }
        let mut data = std::mem::take(&mut self.frame_buffer);
        if data.ends_with('\n') {
            data.pop();
        }
        Some(RawFrame::new(data))
    }
}

struct FrameStreamState<S> {
    bytes: S,
    decoder: Utf8Decoder,
    parser: FrameParser,
    ready: VecDeque<RawFrame>,
    done: bool,
}

/// Process a stream of bytes into a stream of raw event frames.
///
/// The returned stream is lazy and single-pass: bytes are pulled only when the
/// next frame is requested.  A transport error is yielded once and ends the
/// stream; whatever partial frame was buffered at that point is discarded.
pub fn frames<S>(byte_stream: S) -> impl Stream<Item = Result<RawFrame>>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let state = FrameStreamState {
        bytes: byte_stream,
        decoder: Utf8Decoder::new(),
        parser: FrameParser::new(),
        ready: VecDeque::new(),
        done: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.done {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    STREAM_BYTES.count(bytes.len() as u64);
                    let text = state.decoder.decode(&bytes);
                    let completed = state.parser.push(&text);
                    state.ready.extend(completed);
                }
                Some(Err(e)) => {
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    let tail = state.decoder.finish();
                    let completed = state.parser.push(&tail);
                    state.ready.extend(completed);
                    state.ready.extend(state.parser.finish());
                }
            }
        }
    })
}
