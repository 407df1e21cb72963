//! Streaming-related error types.
//!
//! This module defines errors that occur while an Atelier SSE stream is
//! being decoded and interpreted. None of these abort an in-progress
//! session on their own: decode and interpret errors skip the offending
//! frame, and transport loss finalizes the session with whatever state
//! has accumulated.

use std::fmt;

use crate::sse::SseParseError;

/// Stream-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamError {
    /// Stream connection was lost mid-stream.
    ConnectionLost {
        message: String,
    },

    /// The stream request was rejected before any frame arrived.
    RequestFailed {
        status: Option<u16>,
        message: String,
    },

    /// A single frame failed to decode (malformed SSE or bad JSON).
    Decode {
        event_type: String,
        message: String,
    },

    /// A known event type carried a payload the interpreter cannot apply.
    Interpret {
        event_type: String,
        message: String,
    },

    /// The backend reported an error via the stream itself.
    Backend {
        code: Option<String>,
        message: String,
    },
}

impl StreamError {
    /// Check if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StreamError::ConnectionLost { .. } | StreamError::RequestFailed { status: None, .. }
        )
    }

    /// Check if this error terminates the session.
    ///
    /// Decode and interpret errors are per-frame: the session skips the
    /// frame and keeps going. Everything else ends the stream.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            StreamError::Decode { .. } | StreamError::Interpret { .. }
        )
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            StreamError::ConnectionLost { .. } => {
                "Connection to the server was lost. The partial response has been kept.".to_string()
            }
            StreamError::RequestFailed { status, .. } => match status {
                Some(s) => format!("The server rejected the request ({}).", s),
                None => "Could not reach the server. Please try again.".to_string(),
            },
            StreamError::Decode { event_type, .. } => {
                format!("Skipped an unreadable server message ({}).", event_type)
            }
            StreamError::Interpret { event_type, .. } => {
                format!("Skipped a malformed server message ({}).", event_type)
            }
            StreamError::Backend { message, .. } => {
                format!("The assistant stopped early: {}", message)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            StreamError::ConnectionLost { .. } => "E_STREAM_CONN",
            StreamError::RequestFailed { .. } => "E_STREAM_REQ",
            StreamError::Decode { .. } => "E_STREAM_DECODE",
            StreamError::Interpret { .. } => "E_STREAM_INTERP",
            StreamError::Backend { .. } => "E_STREAM_BACKEND",
        }
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StreamError::ConnectionLost { message } => {
                write!(f, "Stream connection lost: {}", message)
            }
            StreamError::RequestFailed { status, message } => match status {
                Some(s) => write!(f, "Stream request failed ({}): {}", s, message),
                None => write!(f, "Stream request failed: {}", message),
            },
            StreamError::Decode { event_type, message } => {
                write!(f, "Failed to decode {} frame: {}", event_type, message)
            }
            StreamError::Interpret { event_type, message } => {
                write!(f, "Failed to interpret {} frame: {}", event_type, message)
            }
            StreamError::Backend { code, message } => match code {
                Some(c) => write!(f, "Backend error [{}]: {}", c, message),
                None => write!(f, "Backend error: {}", message),
            },
        }
    }
}

impl std::error::Error for StreamError {}

impl From<SseParseError> for StreamError {
    fn from(err: SseParseError) -> Self {
        match err {
            SseParseError::UnknownEventType(event_type) => StreamError::Decode {
                event_type,
                message: "unknown event type".to_string(),
            },
            SseParseError::InvalidJson { event_type, source } => StreamError::Decode {
                event_type,
                message: source,
            },
            SseParseError::MissingData { event_type } => StreamError::Decode {
                event_type,
                message: "missing data".to_string(),
            },
        }
    }
}
