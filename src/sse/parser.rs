//! Line-level SSE parsing.
//!
//! [`SseParser`] accumulates `event:`/`data:` lines and emits a complete
//! [`StreamEvent`] when the blank frame delimiter arrives. Chunk-level
//! re-buffering lives in [`super::FrameDecoder`].

use super::events::{EventMeta, SseLine, SseParseError, StreamEvent};
use super::payloads::{
    ArtifactsPayload, ContentBlockStartPayload, ContentPayload, DocumentStartPayload, DonePayload,
    ErrorPayload, SuggestionEntry, SuggestionsPayload, ThinkingPayload,
};

/// Terminal sentinel some backends send instead of a `done` event.
const DONE_SENTINEL: &str = "[DONE]";

/// Parse a single SSE line into its component type.
pub fn parse_sse_line(line: &str) -> SseLine {
    if line.is_empty() {
        return SseLine::Empty;
    }

    if let Some(stripped) = line.strip_prefix(':') {
        return SseLine::Comment(stripped.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("event:") {
        return SseLine::Event(rest.trim().to_string());
    }

    if let Some(rest) = line.strip_prefix("data:") {
        return SseLine::Data(rest.trim().to_string());
    }

    // Unknown line format - treat as comment
    SseLine::Comment(line.to_string())
}

fn invalid_json(event_type: &str, err: serde_json::Error) -> SseParseError {
    SseParseError::InvalidJson {
        event_type: event_type.to_string(),
        source: err.to_string(),
    }
}

/// Parse SSE event type and data into a typed StreamEvent.
///
/// Unknown event names are an error: the frame vocabulary is closed and
/// the caller decides whether to skip or abort (sessions skip).
pub fn parse_sse_event(event_type: &str, data: &str) -> Result<StreamEvent, SseParseError> {
    match event_type {
        // Support the content event names seen across backend versions
        "content" | "text" | "message" | "chunk" | "delta" | "message_delta" => {
            let payload: ContentPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            let text = payload.take_text();
            let meta = EventMeta {
                seq: payload.seq,
                timestamp: payload.timestamp,
                conversation_id: payload.conversation_id.clone(),
            };
            Ok(StreamEvent::Content { text, meta })
        }
        "thinking" | "meta" | "thinking_delta" | "reasoning" => {
            let payload: ThinkingPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::Thinking {
                steps: payload.into_steps(),
            })
        }
        "suggestions" | "suggestion_set" => {
            let payload: SuggestionsPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::Suggestions {
                suggestions: payload
                    .suggestions
                    .into_iter()
                    .map(SuggestionEntry::into_text)
                    .collect(),
            })
        }
        "artifacts" | "artifact_set" => {
            let payload: ArtifactsPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::Artifacts {
                artifacts: payload.artifacts,
            })
        }
        "document_start" => {
            let payload: DocumentStartPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::DocumentStart {
                document_id: payload.document_id,
            })
        }
        "content_block_start" => {
            let payload: ContentBlockStartPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::ContentBlockStart {
                label: payload.label,
            })
        }
        "content_block_delta" => {
            let payload: ContentPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::ContentBlockDelta {
                text: payload.take_text(),
            })
        }
        "document_delta" => {
            let payload: ContentPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::DocumentDelta {
                text: payload.take_text(),
            })
        }
        "document_stop" => Ok(StreamEvent::DocumentStop),
        "done" => {
            let message_id = serde_json::from_str::<DonePayload>(data)
                .ok()
                .and_then(|p| p.message_id_string());
            Ok(StreamEvent::Done { message_id })
        }
        "error" => {
            let payload: ErrorPayload =
                serde_json::from_str(data).map_err(|e| invalid_json(event_type, e))?;
            Ok(StreamEvent::Error {
                message: payload.message,
                code: payload.code,
            })
        }
        "ping" => Ok(StreamEvent::Ping),
        other => Err(SseParseError::UnknownEventType(other.to_string())),
    }
}

/// Stateful SSE parser that accumulates lines and emits complete events.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Current event type being accumulated
    current_event_type: Option<String>,
    /// Accumulated data lines (SSE allows multiple data: lines)
    data_buffer: Vec<String>,
}

impl SseParser {
    /// Create a new SSE parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a line to the parser, potentially returning a complete event.
    ///
    /// Returns:
    /// - `Ok(Some(event))` - A complete event was parsed
    /// - `Ok(None)` - Line was consumed but event is incomplete
    /// - `Err(error)` - Parse error occurred
    pub fn feed_line(&mut self, line: &str) -> Result<Option<StreamEvent>, SseParseError> {
        match parse_sse_line(line) {
            SseLine::Event(event_type) => {
                self.current_event_type = Some(event_type);
                Ok(None)
            }
            SseLine::Data(data) => {
                self.data_buffer.push(data);
                Ok(None)
            }
            SseLine::Empty => self.try_emit_event(),
            SseLine::Comment(_) => Ok(None),
        }
    }

    /// Whether the parser holds a partially accumulated frame.
    pub fn has_pending(&self) -> bool {
        self.current_event_type.is_some() || !self.data_buffer.is_empty()
    }

    /// Try to emit a complete event from accumulated state.
    fn try_emit_event(&mut self) -> Result<Option<StreamEvent>, SseParseError> {
        if !self.has_pending() {
            return Ok(None);
        }

        let mut event_type = self.current_event_type.take();
        let data = self.data_buffer.join("\n");
        self.data_buffer.clear();

        // Terminal sentinel: "data: [DONE]" with no event line
        if event_type.is_none() && data == DONE_SENTINEL {
            return Ok(Some(StreamEvent::Done { message_id: None }));
        }

        // If no explicit event type, try the JSON "type" field:
        // data: {"type":"content","data":"hello",...}
        if event_type.is_none() && !data.is_empty() {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&data) {
                if let Some(t) = json.get("type").and_then(|v| v.as_str()) {
                    event_type = Some(t.to_string());
                }
            }
        }

        match event_type {
            Some(et) => {
                // done, ping and document_stop may arrive without data
                if data.is_empty() && matches!(et.as_str(), "done" | "ping" | "document_stop") {
                    parse_sse_event(&et, "{}").map(Some)
                } else if data.is_empty() {
                    Err(SseParseError::MissingData { event_type: et })
                } else {
                    parse_sse_event(&et, &data).map(Some)
                }
            }
            None => {
                // Data without any type - treat as content by default
                if !data.is_empty() {
                    parse_sse_event("content", &data).map(Some)
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Reset the parser state.
    pub fn reset(&mut self) {
        self.current_event_type = None;
        self.data_buffer.clear();
    }
}
