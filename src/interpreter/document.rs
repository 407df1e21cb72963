//! Interpreter for document-generation streams.
//!
//! RFP answer drafting streams document content as labeled blocks:
//! `document_start`, then `content_block_start` / `content_block_delta`
//! (or unlabeled `document_delta`) pairs, then `document_stop`. The
//! accumulated draft follows the same ownership and terminal rules as the
//! chat message.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StreamError;
use crate::sse::{SseParseError, StreamEvent};

use super::{InterpreterState, Outcome};

/// One block of generated document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentBlock {
    /// Section label, when the backend names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Block text, append-only while the stream runs
    pub content: String,
}

/// The accumulating draft of one generated document.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentDraft {
    /// Target document, when the backend names one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Generated blocks in arrival order
    #[serde(default)]
    pub blocks: Vec<DocumentBlock>,
    /// True once `document_stop` was seen
    #[serde(default)]
    pub is_complete: bool,
}

impl DocumentDraft {
    /// Append text to the last block, opening an unlabeled one if needed.
    fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.blocks.is_empty() {
            self.blocks.push(DocumentBlock {
                label: None,
                content: String::new(),
            });
        }
        if let Some(block) = self.blocks.last_mut() {
            block.content.push_str(text);
        }
    }

    /// Concatenated text of all blocks.
    pub fn full_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

/// Applies document events to a [`DocumentDraft`].
#[derive(Debug, Default)]
pub struct DocumentInterpreter {
    draft: DocumentDraft,
    state: InterpreterState,
}

impl DocumentInterpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any document event has been applied.
    pub fn is_empty(&self) -> bool {
        self.draft.document_id.is_none() && self.draft.blocks.is_empty()
    }

    pub fn is_done(&self) -> bool {
        self.state == InterpreterState::Done
    }

    /// Current draft snapshot.
    pub fn snapshot(&self) -> DocumentDraft {
        self.draft.clone()
    }

    /// Apply one decoded frame. Same contract as the message interpreter:
    /// one outcome per frame, decode errors mutate nothing, frames after
    /// the terminal are ignored.
    pub fn apply(&mut self, frame: Result<StreamEvent, SseParseError>) -> Outcome<DocumentDraft> {
        if self.is_done() {
            return Outcome::Ignored;
        }

        let event = match frame {
            Ok(event) => event,
            Err(e) => return Outcome::Warning(StreamError::from(e)),
        };

        match event {
            StreamEvent::DocumentStart { document_id } => {
                debug!(document_id = ?document_id, "document stream started");
                self.draft = DocumentDraft {
                    document_id,
                    ..Default::default()
                };
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::ContentBlockStart { label } => {
                self.draft.blocks.push(DocumentBlock {
                    label,
                    content: String::new(),
                });
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::ContentBlockDelta { text } | StreamEvent::DocumentDelta { text } => {
                if text.is_empty() {
                    return Outcome::Ignored;
                }
                self.draft.append(&text);
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::DocumentStop => {
                self.draft.is_complete = true;
                Outcome::Updated(self.snapshot())
            }
            StreamEvent::Done { .. } => {
                self.state = InterpreterState::Done;
                Outcome::Updated(self.snapshot())
            }
            // Chat events belong to the message interpreter
            _ => Outcome::Ignored,
        }
    }

    /// Freeze the draft, keeping whatever accumulated. Idempotent.
    pub fn finalize(&mut self) -> DocumentDraft {
        self.state = InterpreterState::Done;
        self.snapshot()
    }
}
