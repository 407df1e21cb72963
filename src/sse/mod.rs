//! SSE (Server-Sent Events) stream decoding.
//!
//! Parses the SSE format of the Atelier streaming API:
//! - `event: <type>` - event type line
//! - `data: <json>` - data payload line
//! - Empty line - signals end of event
//! - Lines starting with `:` - comments (ignored)
//!
//! Some deployments omit the `event:` line and put the type inside the
//! JSON payload; both forms are accepted. A bare `data: [DONE]` sentinel
//! is treated as the terminal marker.
//!
//! # Module structure
//! - `events` - Event type definitions (StreamEvent enum, SseLine, SseParseError)
//! - `payloads` - Internal payload deserialization structs
//! - `parser` - Line-level parsing (SseParser, parse_sse_line, parse_sse_event)
//! - `decoder` - Chunk-level framing (FrameDecoder with feed/flush)

mod decoder;
mod events;
mod parser;
mod payloads;

pub use decoder::FrameDecoder;
pub use events::{EventMeta, SseLine, SseParseError, StreamEvent};
pub use parser::{parse_sse_event, parse_sse_line, SseParser};
