//! The core stream state machine.
//!
//! [`MessageInterpreter`] consumes decoded frames in arrival order and
//! maintains the accumulating [`AssistantMessage`], emitting one outcome
//! per frame. Per message it moves `Streaming -> Done` and accepts no
//! frame after `Done`. Decode and interpret errors skip their frame and
//! never abort the message: partial progress beats total failure
//! mid-stream.
//!
//! # Module structure
//! - `fences` - Split-safe code-fence scanning
//! - `steps` - Thinking-step merge rules
//! - `document` - Interpreter for document-generation streams

mod document;
mod fences;
mod steps;

pub use document::{DocumentBlock, DocumentDraft, DocumentInterpreter};
pub use fences::{FencePiece, FenceScanner};

use tracing::debug;

use crate::error::StreamError;
use crate::models::AssistantMessage;
use crate::sse::{SseParseError, StreamEvent};

/// Lifecycle of one interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpreterState {
    #[default]
    Streaming,
    Done,
}

/// Result of applying one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    /// The frame changed state; here is the new snapshot
    Updated(T),
    /// The frame was skipped; surfaced as a non-fatal warning
    Warning(StreamError),
    /// The frame required no action (pings, frames after Done)
    Ignored,
}

/// Applies chat-stream frames to one [`AssistantMessage`].
#[derive(Debug)]
pub struct MessageInterpreter {
    message: AssistantMessage,
    scanner: FenceScanner,
    state: InterpreterState,
}

impl MessageInterpreter {
    /// Create an interpreter for one message in the given conversation.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            message: AssistantMessage::new(conversation_id),
            scanner: FenceScanner::new(),
            state: InterpreterState::Streaming,
        }
    }

    pub fn state(&self) -> InterpreterState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == InterpreterState::Done
    }

    /// Current message snapshot.
    pub fn snapshot(&self) -> AssistantMessage {
        self.message.clone()
    }

    /// Apply one decoded frame.
    ///
    /// Exactly one outcome per frame, in arrival order. Once the terminal
    /// marker has been processed every further frame is ignored, so a
    /// duplicated terminal causes no state change and no extra emission.
    pub fn apply(
        &mut self,
        frame: Result<StreamEvent, SseParseError>,
    ) -> Outcome<AssistantMessage> {
        if self.is_done() {
            return Outcome::Ignored;
        }

        let event = match frame {
            Ok(event) => event,
            Err(e) => return Outcome::Warning(StreamError::from(e)),
        };

        match event {
            StreamEvent::Content { text, .. } => {
                if text.is_empty() {
                    return Outcome::Ignored;
                }
                self.apply_text(&text);
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::Thinking { steps } => {
                steps::merge_steps(&mut self.message.thinking_steps, steps);
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::Suggestions { suggestions } => {
                // Terminal list: a repeated frame overwrites, never merges
                self.message.suggestions = suggestions;
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::Artifacts { artifacts } => {
                self.message.artifacts = artifacts;
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::Done { message_id } => {
                debug!(message_id = ?message_id, "stream terminal marker");
                Outcome::Updated(self.finalize())
            }
            StreamEvent::Error { message, code } => {
                // The backend aborted generation; the session decides how
                // to surface this. Accumulated state stays untouched here.
                Outcome::Warning(StreamError::Backend { code, message })
            }
            StreamEvent::Ping => Outcome::Ignored,
            // Document events belong to the document interpreter
            event if event.is_document_event() => Outcome::Ignored,
            _ => Outcome::Ignored,
        }
    }

    /// Freeze the message with whatever has accumulated, flushing any
    /// buffered fence state. Used for the terminal marker, transport
    /// loss, and cancellation alike. Idempotent.
    pub fn finalize(&mut self) -> AssistantMessage {
        if self.state != InterpreterState::Done {
            let pieces = self.scanner.finish();
            self.fold_pieces(pieces);
            self.sync_code_state();
            self.message.finalize();
            self.state = InterpreterState::Done;
        }
        self.snapshot()
    }

    /// Append one text delta: raw content grows verbatim, the fence
    /// scanner classifies the same bytes into prose and code segments.
    fn apply_text(&mut self, text: &str) {
        self.message.content.push_str(text);
        let pieces = self.scanner.scan(text);
        self.fold_pieces(pieces);
        self.sync_code_state();
    }

    fn fold_pieces(&mut self, pieces: Vec<FencePiece>) {
        for piece in pieces {
            match piece {
                FencePiece::Text(text) => self.message.push_text(&text),
                FencePiece::Code(text) => self.message.push_code(&text),
                FencePiece::Open => self.message.open_code_segment(),
                FencePiece::Language(tag) => {
                    let language = if tag.is_empty() { None } else { Some(tag) };
                    self.message.tag_code_segment(language);
                }
                FencePiece::Close => {}
            }
        }
    }

    fn sync_code_state(&mut self) {
        self.message.code_block.in_code_block = self.scanner.in_code_block();
        self.message.code_block.language = self.scanner.language().map(String::from);
    }
}
