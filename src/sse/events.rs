//! SSE event types and definitions.
//!
//! [`StreamEvent`] is the closed vocabulary of frames the Atelier backend
//! sends. Unknown event tags are a decode error, not a silent skip - the
//! session surfaces them as non-fatal warnings.

use crate::models::{Artifact, ThinkingStep};

/// Metadata the backend flattens into the root of content payloads.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventMeta {
    /// Sequence number for ordering events (auto-increments per event)
    pub seq: Option<u64>,
    /// Unix timestamp in milliseconds
    pub timestamp: Option<u64>,
    /// Conversation this event belongs to
    pub conversation_id: Option<String>,
}

/// Typed SSE events from the Atelier streaming API.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Text chunk of the assistant reply
    Content { text: String, meta: EventMeta },
    /// Thinking-step updates (new steps or refinements of earlier ones)
    Thinking { steps: Vec<ThinkingStep> },
    /// Follow-up suggestions, sent once per message
    Suggestions { suggestions: Vec<String> },
    /// Generated artifact references, sent once per message
    Artifacts { artifacts: Vec<Artifact> },
    /// A document-generation stream begins
    DocumentStart { document_id: Option<String> },
    /// A new block of generated document content begins
    ContentBlockStart { label: Option<String> },
    /// Text chunk for the current document block
    ContentBlockDelta { text: String },
    /// Text chunk for the document outside any labeled block
    DocumentDelta { text: String },
    /// The document-generation stream is complete
    DocumentStop,
    /// Stream completed successfully
    Done { message_id: Option<String> },
    /// Error reported by the backend
    Error {
        message: String,
        code: Option<String>,
    },
    /// Heartbeat/keepalive
    Ping,
}

impl StreamEvent {
    /// Returns the event type name as a string for logging purposes.
    pub fn event_type_name(&self) -> &'static str {
        match self {
            StreamEvent::Content { .. } => "content",
            StreamEvent::Thinking { .. } => "thinking",
            StreamEvent::Suggestions { .. } => "suggestions",
            StreamEvent::Artifacts { .. } => "artifacts",
            StreamEvent::DocumentStart { .. } => "document_start",
            StreamEvent::ContentBlockStart { .. } => "content_block_start",
            StreamEvent::ContentBlockDelta { .. } => "content_block_delta",
            StreamEvent::DocumentDelta { .. } => "document_delta",
            StreamEvent::DocumentStop => "document_stop",
            StreamEvent::Done { .. } => "done",
            StreamEvent::Error { .. } => "error",
            StreamEvent::Ping => "ping",
        }
    }

    /// Whether this event belongs to the document-generation stream.
    pub fn is_document_event(&self) -> bool {
        matches!(
            self,
            StreamEvent::DocumentStart { .. }
                | StreamEvent::ContentBlockStart { .. }
                | StreamEvent::ContentBlockDelta { .. }
                | StreamEvent::DocumentDelta { .. }
                | StreamEvent::DocumentStop
        )
    }
}

/// Represents a parsed SSE line.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    /// Event type declaration (e.g., "event: content")
    Event(String),
    /// Data payload (e.g., "data: {\"text\": \"hello\"}")
    Data(String),
    /// Empty line - signals end of event
    Empty,
    /// Comment line (starts with ':')
    Comment(String),
}

/// Errors that can occur during SSE parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum SseParseError {
    /// Unknown event type received
    UnknownEventType(String),
    /// Invalid JSON in data payload
    InvalidJson { event_type: String, source: String },
    /// Missing data for event
    MissingData { event_type: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::UnknownEventType(t) => write!(f, "Unknown SSE event type: {}", t),
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}
