//! Internal payload deserialization structs.
//!
//! These mirror the JSON bodies of `data:` lines. Field names vary across
//! backend versions, so content-bearing payloads accept the aliases that
//! have been observed in traffic.

use serde::Deserialize;

use crate::models::{Artifact, ThinkingStep};

/// Raw data payload for content-bearing events.
/// Also captures flattened metadata fields from the backend.
#[derive(Debug, Clone, Deserialize)]
pub(super) struct ContentPayload {
    /// The text content - accepts "text", "content", "data", "chunk", or "token"
    #[serde(alias = "content", alias = "data", alias = "chunk", alias = "token")]
    pub text: Option<String>,
    /// Some backends nest content in a delta object
    #[serde(default)]
    pub delta: Option<DeltaPayload>,
    #[serde(default)]
    pub seq: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl ContentPayload {
    /// Extract text from the possible locations in the payload.
    pub fn take_text(&self) -> String {
        self.text
            .clone()
            .or_else(|| self.delta.as_ref().and_then(|d| d.content.clone()))
            .or_else(|| self.delta.as_ref().and_then(|d| d.text.clone()))
            .unwrap_or_default()
    }
}

/// Nested delta payload for providers that wrap the chunk.
#[derive(Debug, Clone, Deserialize, Default)]
pub(super) struct DeltaPayload {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

/// Thinking payloads arrive either as `{"steps":[...]}` or as a single
/// step object at the root.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum ThinkingPayload {
    Batch { steps: Vec<ThinkingStep> },
    Single(ThinkingStep),
}

impl ThinkingPayload {
    pub fn into_steps(self) -> Vec<ThinkingStep> {
        match self {
            ThinkingPayload::Batch { steps } => steps,
            ThinkingPayload::Single(step) => vec![step],
        }
    }
}

/// Suggestions arrive as bare strings or `{text}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(super) enum SuggestionEntry {
    Text(String),
    Object {
        #[serde(alias = "label", alias = "prompt")]
        text: String,
    },
}

impl SuggestionEntry {
    pub fn into_text(self) -> String {
        match self {
            SuggestionEntry::Text(text) => text,
            SuggestionEntry::Object { text } => text,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct SuggestionsPayload {
    #[serde(default)]
    pub suggestions: Vec<SuggestionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ArtifactsPayload {
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DonePayload {
    #[serde(default)]
    pub message_id: Option<serde_json::Value>,
}

impl DonePayload {
    /// The backend sends message ids as strings or integers.
    pub fn message_id_string(&self) -> Option<String> {
        match &self.message_id {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ErrorPayload {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct DocumentStartPayload {
    #[serde(default, alias = "id")]
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(super) struct ContentBlockStartPayload {
    #[serde(default, alias = "title", alias = "heading")]
    pub label: Option<String>,
}
