//! Data models for the stream core.
//!
//! # Module structure
//! - `message` - The accumulating assistant message and its segments
//! - `thinking` - Thinking steps and their status lattice
//! - `artifact` - Generated artifact references attached to a message
//! - `request` - The outgoing stream request

mod artifact;
mod message;
mod request;
mod thinking;

pub use artifact::Artifact;
pub use message::{AssistantMessage, CodeBlockState, MessageSegment};
pub use request::{StreamKind, StreamRequest};
pub use thinking::{StepStatus, ThinkingStep};
