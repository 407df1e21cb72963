//! Messages a stream session emits to its consumer.
//!
//! The presentation layer receives these over an unbounded channel, one
//! per processed frame, in frame arrival order. Snapshots are owned
//! clones - the session never shares its live state.

use crate::error::StreamError;
use crate::interpreter::DocumentDraft;
use crate::models::AssistantMessage;

/// Update emitted by a stream session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionMessage {
    /// The assistant message changed; here is the full snapshot
    MessageUpdate {
        conversation_id: String,
        snapshot: AssistantMessage,
    },
    /// The generated document draft changed
    DocumentUpdate {
        conversation_id: String,
        draft: DocumentDraft,
    },
    /// A frame was skipped (decode/interpret error); the stream goes on
    Warning {
        conversation_id: String,
        error: StreamError,
    },
    /// The stream reached its terminal marker or closed cleanly
    Completed {
        conversation_id: String,
        snapshot: AssistantMessage,
    },
    /// The stream ended abnormally. `snapshot` carries the partial
    /// message when streaming had begun, so callers can keep showing it.
    Failed {
        conversation_id: String,
        error: StreamError,
        snapshot: Option<AssistantMessage>,
    },
    /// The caller cancelled; the snapshot is the final state
    Cancelled {
        conversation_id: String,
        snapshot: AssistantMessage,
    },
}

impl SessionMessage {
    /// Conversation this message belongs to.
    pub fn conversation_id(&self) -> &str {
        match self {
            SessionMessage::MessageUpdate { conversation_id, .. }
            | SessionMessage::DocumentUpdate { conversation_id, .. }
            | SessionMessage::Warning { conversation_id, .. }
            | SessionMessage::Completed { conversation_id, .. }
            | SessionMessage::Failed { conversation_id, .. }
            | SessionMessage::Cancelled { conversation_id, .. } => conversation_id,
        }
    }

    /// Whether this message ends the session.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionMessage::Completed { .. }
                | SessionMessage::Failed { .. }
                | SessionMessage::Cancelled { .. }
        )
    }
}
