//! Request structure for streaming API calls.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of stream the backend should produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    /// A chat reply (text, thinking steps, suggestions, artifacts)
    #[default]
    Chat,
    /// Generated document content (RFP answer drafting)
    Document,
}

/// Request structure for the `/v1/stream` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamRequest {
    /// The prompt/message to send
    pub prompt: String,
    /// Client-generated session id for this streaming request
    pub session_id: String,
    /// Conversation id - None means start a new conversation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    /// Kind of stream to produce
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_kind: Option<StreamKind>,
    /// Document the generated content targets (document streams only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

impl StreamRequest {
    /// Create a new StreamRequest for a new conversation.
    pub fn new(prompt: String) -> Self {
        Self {
            prompt,
            session_id: Uuid::new_v4().to_string(),
            conversation_id: None,
            stream_kind: None,
            document_id: None,
        }
    }

    /// Create a StreamRequest for an existing conversation.
    pub fn with_conversation(prompt: String, conversation_id: String) -> Self {
        Self {
            prompt,
            session_id: Uuid::new_v4().to_string(),
            conversation_id: Some(conversation_id),
            stream_kind: None,
            document_id: None,
        }
    }

    /// Set the stream kind.
    pub fn with_kind(mut self, kind: StreamKind) -> Self {
        self.stream_kind = Some(kind);
        self
    }

    /// Set the target document id.
    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    /// The key sessions and the coordinator use for this request: the
    /// conversation id when present, otherwise the one-off session id.
    pub fn conversation_key(&self) -> &str {
        self.conversation_id.as_deref().unwrap_or(&self.session_id)
    }
}
