//! At-most-one-active-stream-per-conversation bookkeeping.
//!
//! Sending a new message while a conversation is still streaming must
//! first cancel the running session. The coordinator owns that invariant
//! so callers never juggle raw handles.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use super::{SessionHandle, SessionMessage, StreamSession};
use crate::models::StreamRequest;
use crate::traits::StreamTransport;

/// Starts and tracks stream sessions, one active per conversation.
pub struct StreamCoordinator {
    transport: Arc<dyn StreamTransport>,
    tx: mpsc::UnboundedSender<SessionMessage>,
    active: HashMap<String, SessionHandle>,
}

impl StreamCoordinator {
    /// Create a coordinator emitting session messages on `tx`.
    pub fn new(
        transport: Arc<dyn StreamTransport>,
        tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> Self {
        Self {
            transport,
            tx,
            active: HashMap::new(),
        }
    }

    /// Start streaming `request`, cancelling any session still active
    /// for the same conversation first. Returns the conversation key the
    /// new session runs under.
    pub fn start_stream(&mut self, request: StreamRequest) -> String {
        let key = request.conversation_key().to_string();

        if let Some(prev) = self.active.get(&key) {
            if !prev.is_finished() {
                info!(conversation = %key, "cancelling previous stream before starting a new one");
                prev.cancel();
            }
        }

        let handle = StreamSession::spawn(
            Arc::clone(&self.transport),
            request,
            self.tx.clone(),
        );
        self.active.insert(key.clone(), handle);
        key
    }

    /// Cancel the active session for a conversation, if any.
    ///
    /// Returns true when a running session was told to stop.
    pub fn cancel(&self, conversation_id: &str) -> bool {
        match self.active.get(conversation_id) {
            Some(handle) if !handle.is_finished() => {
                handle.cancel();
                true
            }
            _ => false,
        }
    }

    /// Whether a conversation has a running stream.
    pub fn is_streaming(&self, conversation_id: &str) -> bool {
        self.active
            .get(conversation_id)
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }

    /// Drop handles whose sessions have exited.
    pub fn prune_finished(&mut self) {
        self.active.retain(|_, handle| !handle.is_finished());
    }

    /// Number of tracked sessions (including finished, unpruned ones).
    pub fn tracked_count(&self) -> usize {
        self.active.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atelier::AtelierError;
    use crate::traits::ByteStream;
    use async_trait::async_trait;

    /// Transport whose streams never produce data and never end.
    struct HangingTransport;

    #[async_trait]
    impl StreamTransport for HangingTransport {
        async fn stream(&self, _request: &StreamRequest) -> Result<ByteStream, AtelierError> {
            Ok(Box::pin(futures_util::stream::pending()))
        }

        async fn cancel_stream(&self, _conversation_id: &str) -> Result<(), AtelierError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<bool, AtelierError> {
            Ok(true)
        }
    }

    fn request_for(conversation: &str) -> StreamRequest {
        StreamRequest::with_conversation("hi".to_string(), conversation.to_string())
    }

    async fn wait_for_terminal(
        rx: &mut mpsc::UnboundedReceiver<SessionMessage>,
    ) -> SessionMessage {
        loop {
            let msg = rx.recv().await.expect("channel open");
            if msg.is_terminal() {
                return msg;
            }
        }
    }

    #[tokio::test]
    async fn test_starting_twice_cancels_previous_session() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coordinator = StreamCoordinator::new(Arc::new(HangingTransport), tx);

        let key = coordinator.start_stream(request_for("conv-1"));
        assert_eq!(key, "conv-1");
        assert!(coordinator.is_streaming("conv-1"));

        // Second send for the same conversation: the first session must
        // end as Cancelled
        coordinator.start_stream(request_for("conv-1"));
        let terminal = wait_for_terminal(&mut rx).await;
        assert!(matches!(terminal, SessionMessage::Cancelled { .. }));
        assert_eq!(terminal.conversation_id(), "conv-1");

        // The replacement session is still running
        assert!(coordinator.is_streaming("conv-1"));
    }

    #[tokio::test]
    async fn test_independent_conversations_stream_concurrently() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut coordinator = StreamCoordinator::new(Arc::new(HangingTransport), tx);

        coordinator.start_stream(request_for("conv-1"));
        coordinator.start_stream(request_for("conv-2"));
        assert!(coordinator.is_streaming("conv-1"));
        assert!(coordinator.is_streaming("conv-2"));
        assert_eq!(coordinator.tracked_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_by_conversation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coordinator = StreamCoordinator::new(Arc::new(HangingTransport), tx);

        coordinator.start_stream(request_for("conv-1"));
        assert!(coordinator.cancel("conv-1"));
        let terminal = wait_for_terminal(&mut rx).await;
        assert!(matches!(terminal, SessionMessage::Cancelled { .. }));

        assert!(!coordinator.cancel("conv-unknown"));
    }

    #[tokio::test]
    async fn test_prune_finished_drops_exited_sessions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut coordinator = StreamCoordinator::new(Arc::new(HangingTransport), tx);

        coordinator.start_stream(request_for("conv-1"));
        coordinator.cancel("conv-1");
        wait_for_terminal(&mut rx).await;

        // Let the session task wind down, then prune
        for _ in 0..10 {
            coordinator.prune_finished();
            if coordinator.tracked_count() == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(coordinator.tracked_count(), 0);
        assert!(!coordinator.is_streaming("conv-1"));
    }
}
