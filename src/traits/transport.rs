//! Transport trait abstraction for the streaming backend.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::Stream;
use std::pin::Pin;

use crate::atelier::AtelierError;
use crate::models::StreamRequest;

/// The raw chunk stream of one streaming response.
///
/// Chunk boundaries are arbitrary: a chunk can split an SSE frame
/// anywhere, including inside a multi-byte character. The decoder owns
/// re-assembly.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AtelierError>> + Send>>;

/// Trait for the streaming backend transport.
///
/// Implemented by [`crate::atelier::AtelierClient`] for real HTTP and by
/// scripted mocks in tests.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Open a streaming response for the request.
    ///
    /// A non-success status is an error here, before any frame is
    /// decoded - the session never enters streaming in that case.
    async fn stream(&self, request: &StreamRequest) -> Result<ByteStream, AtelierError>;

    /// Ask the backend to stop generating for a conversation.
    async fn cancel_stream(&self, conversation_id: &str) -> Result<(), AtelierError>;

    /// Check if the backend is healthy and reachable.
    async fn health_check(&self) -> Result<bool, AtelierError>;
}
