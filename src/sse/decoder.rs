//! Chunk-level SSE framing.
//!
//! The transport hands over opaque byte chunks that can split a frame
//! anywhere - mid-line, mid-field, even inside a multi-byte UTF-8
//! sequence. [`FrameDecoder`] re-buffers those chunks and drains complete
//! frames in arrival order. Feeding the same stream one byte at a time or
//! as a single chunk yields the same event sequence.

use tracing::warn;

use super::events::{SseParseError, StreamEvent};
use super::parser::SseParser;

/// One decoded frame: a parsed event or the reason that frame was skipped.
pub type DecodedFrame = Result<StreamEvent, SseParseError>;

/// Stateful decoder that turns a chunk stream into complete SSE frames.
///
/// Owned by exactly one stream session; state is reset only by building a
/// new decoder at session start.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    /// Bytes of an incomplete UTF-8 sequence from the previous chunk
    utf8_tail: Vec<u8>,
    /// Text of the incomplete trailing line
    buffer: String,
    /// Line accumulator
    parser: SseParser,
    /// Set once flush ran; later feeds/flushes are no-ops
    finished: bool,
}

impl FrameDecoder {
    /// Create a new decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning every frame it completed.
    ///
    /// Incomplete trailing data (a partial line or a split UTF-8
    /// sequence) stays buffered for the next call. Malformed frames come
    /// back as `Err` items in position; decoding continues after them.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<DecodedFrame> {
        if self.finished {
            return Vec::new();
        }
        self.absorb(chunk);
        self.drain_lines()
    }

    /// Convenience wrapper for text chunks.
    pub fn feed_str(&mut self, chunk: &str) -> Vec<DecodedFrame> {
        self.feed(chunk.as_bytes())
    }

    /// Signal end-of-stream.
    ///
    /// Any buffered remainder is treated as a final line, a pending frame
    /// is forced out, and a synthetic terminal marker is appended so the
    /// interpreter always observes a terminal even when the backend never
    /// sent one.
    pub fn flush(&mut self) -> Vec<DecodedFrame> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut frames = Vec::new();
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            push_fed(&mut frames, self.parser.feed_line(line.trim_end_matches('\r')));
        }
        // Force out a frame that never got its blank-line delimiter
        if self.parser.has_pending() {
            push_fed(&mut frames, self.parser.feed_line(""));
        }
        frames.push(Ok(StreamEvent::Done { message_id: None }));
        frames
    }

    /// Whether the decoder holds undelivered partial data.
    pub fn has_partial(&self) -> bool {
        !self.buffer.is_empty() || !self.utf8_tail.is_empty() || self.parser.has_pending()
    }

    /// Append a chunk to the text buffer, carrying split UTF-8 sequences
    /// across calls and skipping truly invalid bytes.
    fn absorb(&mut self, chunk: &[u8]) {
        let mut bytes = std::mem::take(&mut self.utf8_tail);
        bytes.extend_from_slice(chunk);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // valid_up_to guarantees this slice is well-formed
                    self.buffer.push_str(std::str::from_utf8(valid).unwrap_or(""));
                    match err.error_len() {
                        Some(skip) => {
                            warn!(bytes = skip, "skipping invalid UTF-8 in stream");
                            rest = &after[skip..];
                        }
                        None => {
                            // Incomplete sequence at the end - keep for next chunk
                            self.utf8_tail = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
    }

    /// Drain every complete line currently buffered.
    fn drain_lines(&mut self) -> Vec<DecodedFrame> {
        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find('\n') {
            let line: String = self.buffer[..pos].trim_end_matches('\r').to_string();
            self.buffer.drain(..=pos);
            push_fed(&mut frames, self.parser.feed_line(&line));
        }
        frames
    }
}

fn push_fed(frames: &mut Vec<DecodedFrame>, fed: Result<Option<StreamEvent>, SseParseError>) {
    match fed {
        Ok(Some(event)) => frames.push(Ok(event)),
        Ok(None) => {}
        Err(e) => frames.push(Err(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> String {
        [
            "event: content\n",
            "data: {\"text\": \"Hello, \"}\n",
            "\n",
            "event: content\n",
            "data: {\"text\": \"world!\"}\n",
            "\n",
            "event: done\n",
            "\n",
        ]
        .concat()
    }

    fn events_of(frames: Vec<DecodedFrame>) -> Vec<StreamEvent> {
        frames.into_iter().map(|f| f.unwrap()).collect()
    }

    #[test]
    fn test_single_chunk_decodes_all_frames() {
        let mut decoder = FrameDecoder::new();
        let events = events_of(decoder.feed_str(&body()));
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], StreamEvent::Content { text, .. } if text == "Hello, "));
        assert!(matches!(&events[1], StreamEvent::Content { text, .. } if text == "world!"));
        assert_eq!(events[2], StreamEvent::Done { message_id: None });
    }

    #[test]
    fn test_byte_at_a_time_matches_single_chunk() {
        let body = body();

        let mut whole = FrameDecoder::new();
        let mut expected = events_of(whole.feed_str(&body));
        expected.extend(events_of(whole.flush()));

        let mut split = FrameDecoder::new();
        let mut got = Vec::new();
        for byte in body.as_bytes() {
            got.extend(events_of(split.feed(&[*byte])));
        }
        got.extend(events_of(split.flush()));

        assert_eq!(got, expected);
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        let body = "data: {\"text\": \"héllo\"}\n\n".as_bytes();
        // Split in the middle of the two-byte 'é'
        let split_at = body.iter().position(|&b| b == 0xc3).unwrap() + 1;
        let mut events = events_of(decoder.feed(&body[..split_at]));
        events.extend(events_of(decoder.feed(&body[split_at..])));
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], StreamEvent::Content { text, .. } if text == "héllo"));
    }

    #[test]
    fn test_malformed_frame_reported_in_position_and_decoding_continues() {
        let mut decoder = FrameDecoder::new();
        let body = [
            "event: content\n",
            "data: not json\n",
            "\n",
            "event: content\n",
            "data: {\"text\": \"still here\"}\n",
            "\n",
        ]
        .concat();
        let frames = decoder.feed_str(&body);
        assert_eq!(frames.len(), 2);
        assert!(matches!(frames[0], Err(SseParseError::InvalidJson { .. })));
        assert!(
            matches!(&frames[1], Ok(StreamEvent::Content { text, .. }) if text == "still here")
        );
    }

    #[test]
    fn test_unknown_event_is_error_frame() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed_str("event: widget_moved\ndata: {}\n\n");
        assert_eq!(frames.len(), 1);
        assert!(matches!(
            frames[0],
            Err(SseParseError::UnknownEventType(_))
        ));
    }

    #[test]
    fn test_flush_emits_trailing_frame_and_synthetic_done() {
        let mut decoder = FrameDecoder::new();
        // Final frame is missing its blank-line delimiter and trailing newline
        let frames = decoder.feed_str("event: content\ndata: {\"text\": \"tail\"}");
        assert!(frames.is_empty());
        assert!(decoder.has_partial());

        let frames = decoder.flush();
        assert_eq!(frames.len(), 2);
        assert!(matches!(&frames[0], Ok(StreamEvent::Content { text, .. }) if text == "tail"));
        assert_eq!(frames[1], Ok(StreamEvent::Done { message_id: None }));
    }

    #[test]
    fn test_flush_on_clean_stream_only_adds_done() {
        let mut decoder = FrameDecoder::new();
        decoder.feed_str(&body());
        let frames = decoder.flush();
        assert_eq!(frames, vec![Ok(StreamEvent::Done { message_id: None })]);
    }

    #[test]
    fn test_flush_is_terminal() {
        let mut decoder = FrameDecoder::new();
        decoder.feed_str(&body());
        decoder.flush();
        assert!(decoder.flush().is_empty());
        assert!(decoder.feed_str("event: content\n").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.feed_str("event: content\r\ndata: {\"text\": \"crlf\"}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert!(matches!(&frames[0], Ok(StreamEvent::Content { text, .. }) if text == "crlf"));
    }

    #[test]
    fn test_has_partial_tracks_buffered_data() {
        let mut decoder = FrameDecoder::new();
        assert!(!decoder.has_partial());
        decoder.feed_str("event: cont");
        assert!(decoder.has_partial());
        decoder.feed_str("ent\ndata: {\"text\": \"x\"}\n\n");
        assert!(!decoder.has_partial());
    }
}
