//! The accumulating assistant message.
//!
//! One [`AssistantMessage`] is owned by exactly one stream session. The
//! raw `content` grows append-only while the stream runs; `segments` is
//! the derived presentation view that splits the same text into prose and
//! fenced code runs. Snapshots handed to the presentation layer are plain
//! clones - the live value is never shared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::artifact::Artifact;
use super::thinking::ThinkingStep;

/// Whether the message text currently sits inside a fenced code block,
/// and which language tag applies.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeBlockState {
    /// True while an opening fence has not been matched by a closing one
    #[serde(default)]
    pub in_code_block: bool,
    /// Language tag of the open block, if one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// A run of message content - either prose or the body of a fenced code
/// block. Fence markers and language tags stay in the raw `content` but
/// are excluded from `Code` bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageSegment {
    Text {
        text: String,
    },
    Code {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String,
    },
}

/// The accumulating representation of one in-flight assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssistantMessage {
    /// Conversation this message belongs to
    pub conversation_id: String,
    /// Raw text accumulated so far, in arrival order, never truncated
    pub content: String,
    /// Derived prose/code view of `content`
    #[serde(default)]
    pub segments: Vec<MessageSegment>,
    /// Current code-fence state
    #[serde(default)]
    pub code_block: CodeBlockState,
    /// Thinking steps, identity-stable across updates
    #[serde(default)]
    pub thinking_steps: Vec<ThinkingStep>,
    /// Follow-up suggestions, attached once near stream end
    #[serde(default)]
    pub suggestions: Vec<String>,
    /// Generated artifact references, attached once near stream end
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// True once the terminal marker was seen or the session ended
    #[serde(default)]
    pub is_done: bool,
    /// When this message started streaming
    pub started_at: DateTime<Utc>,
}

impl AssistantMessage {
    /// Create an empty message for a conversation.
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            content: String::new(),
            segments: Vec::new(),
            code_block: CodeBlockState::default(),
            thinking_steps: Vec::new(),
            suggestions: Vec::new(),
            artifacts: Vec::new(),
            is_done: false,
            started_at: Utc::now(),
        }
    }

    /// Append prose to the segment view, extending the last `Text` run.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(MessageSegment::Text { text: last }) = self.segments.last_mut() {
            last.push_str(text);
        } else {
            self.segments.push(MessageSegment::Text {
                text: text.to_string(),
            });
        }
    }

    /// Open a new (empty, untagged) code segment.
    pub fn open_code_segment(&mut self) {
        self.segments.push(MessageSegment::Code {
            language: None,
            content: String::new(),
        });
    }

    /// Append to the body of the open code segment.
    pub fn push_code(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(MessageSegment::Code { content, .. }) = self.segments.last_mut() {
            content.push_str(text);
        } else {
            // Fence bookkeeping went wrong upstream; keep the text anyway.
            self.segments.push(MessageSegment::Code {
                language: None,
                content: text.to_string(),
            });
        }
    }

    /// Set the language tag on the open code segment.
    pub fn tag_code_segment(&mut self, language: Option<String>) {
        if let Some(MessageSegment::Code { language: slot, .. }) = self.segments.last_mut() {
            *slot = language;
        }
    }

    /// Mark the message done. Idempotent.
    pub fn finalize(&mut self) {
        self.is_done = true;
    }

    /// Total length of the raw text accumulated so far.
    pub fn content_len(&self) -> usize {
        self.content.len()
    }
}
