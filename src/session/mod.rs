//! Stream sessions: one task per in-flight assistant reply.
//!
//! A session drives transport -> decoder -> interpreters on a spawned
//! task and emits [`SessionMessage`] values on an unbounded channel,
//! exactly one per processed frame, in arrival order. The session owns
//! its state exclusively; the consumer only ever sees cloned snapshots.
//!
//! Cancellation is cooperative: [`SessionHandle::cancel`] takes effect at
//! the next chunk-read boundary. Whatever sits half-decoded in the
//! decoder buffer at that point is discarded, never applied.
//!
//! # Module structure
//! - `messages` - The update vocabulary emitted to the consumer
//! - `coordinator` - At-most-one-active-stream-per-conversation bookkeeping

mod coordinator;
mod messages;

pub use coordinator::StreamCoordinator;
pub use messages::SessionMessage;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StreamError;
use crate::interpreter::{DocumentInterpreter, MessageInterpreter, Outcome};
use crate::models::StreamRequest;
use crate::sse::{FrameDecoder, StreamEvent};
use crate::traits::{ByteStream, StreamTransport};

/// Handle to a running stream session.
pub struct SessionHandle {
    conversation_id: String,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
    join: JoinHandle<()>,
}

impl SessionHandle {
    /// Conversation this session streams for.
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Request cancellation. Idempotent; takes effect at the next
    /// chunk-read boundary.
    pub fn cancel(&self) {
        if !self.cancelled.swap(true, Ordering::SeqCst) {
            self.notify.notify_one();
        }
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Whether the session task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the session task to exit.
    pub async fn join(self) {
        let _ = self.join.await;
    }
}

/// Spawns and drives stream sessions.
pub struct StreamSession;

impl StreamSession {
    /// Start streaming `request` on a new task.
    ///
    /// Every update lands on `tx`; the last message for a session is
    /// always terminal (`Completed`, `Failed` or `Cancelled`).
    pub fn spawn(
        transport: Arc<dyn StreamTransport>,
        request: StreamRequest,
        tx: mpsc::UnboundedSender<SessionMessage>,
    ) -> SessionHandle {
        let conversation_id = request.conversation_key().to_string();
        let cancelled = Arc::new(AtomicBool::new(false));
        let notify = Arc::new(Notify::new());

        let join = tokio::spawn(run_session(
            transport,
            request,
            tx,
            conversation_id.clone(),
            Arc::clone(&cancelled),
            Arc::clone(&notify),
        ));

        SessionHandle {
            conversation_id,
            cancelled,
            notify,
            join,
        }
    }
}

/// Whether the read loop should keep going after a frame.
enum Flow {
    Continue,
    Stop,
}

async fn run_session(
    transport: Arc<dyn StreamTransport>,
    request: StreamRequest,
    tx: mpsc::UnboundedSender<SessionMessage>,
    conversation_id: String,
    cancelled: Arc<AtomicBool>,
    notify: Arc<Notify>,
) {
    let mut stream: ByteStream = match transport.stream(&request).await {
        Ok(stream) => stream,
        Err(e) => {
            // Rejected before any frame: the session never enters streaming
            let error = StreamError::RequestFailed {
                status: e.status(),
                message: e.to_string(),
            };
            let _ = tx.send(SessionMessage::Failed {
                conversation_id,
                error,
                snapshot: None,
            });
            return;
        }
    };

    let mut decoder = FrameDecoder::new();
    let mut message = MessageInterpreter::new(conversation_id.as_str());
    let mut document = DocumentInterpreter::new();
    let mut completed_sent = false;

    loop {
        // Cancel requested while the request was still connecting
        if cancelled.load(Ordering::SeqCst) {
            finish_cancelled(&transport, &tx, &conversation_id, &mut message);
            return;
        }

        tokio::select! {
            biased;
            _ = notify.notified() => {
                // The decoder and its partial buffer are dropped unprocessed
                finish_cancelled(&transport, &tx, &conversation_id, &mut message);
                return;
            }
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    for frame in decoder.feed(&bytes) {
                        match route_frame(
                            frame,
                            &mut message,
                            &mut document,
                            &tx,
                            &conversation_id,
                            &mut completed_sent,
                        ) {
                            Flow::Continue => {}
                            Flow::Stop => return,
                        }
                    }
                }
                Some(Err(e)) => {
                    // Transport loss mid-stream: keep the partial message,
                    // report the error separately
                    warn!(conversation = %conversation_id, error = %e, "stream connection lost");
                    let snapshot = message.finalize();
                    let _ = tx.send(SessionMessage::Failed {
                        conversation_id,
                        error: StreamError::ConnectionLost {
                            message: e.to_string(),
                        },
                        snapshot: Some(snapshot),
                    });
                    return;
                }
                None => {
                    for frame in decoder.flush() {
                        match route_frame(
                            frame,
                            &mut message,
                            &mut document,
                            &tx,
                            &conversation_id,
                            &mut completed_sent,
                        ) {
                            Flow::Continue => {}
                            Flow::Stop => return,
                        }
                    }
                    if !completed_sent {
                        let snapshot = message.finalize();
                        let _ = tx.send(SessionMessage::Completed {
                            conversation_id,
                            snapshot,
                        });
                    }
                    return;
                }
            }
        }
    }
}

/// Apply one decoded frame to the right interpreter and emit its update.
fn route_frame(
    frame: Result<StreamEvent, crate::sse::SseParseError>,
    message: &mut MessageInterpreter,
    document: &mut DocumentInterpreter,
    tx: &mpsc::UnboundedSender<SessionMessage>,
    conversation_id: &str,
    completed_sent: &mut bool,
) -> Flow {
    let is_document = matches!(&frame, Ok(event) if event.is_document_event());
    if is_document {
        match document.apply(frame) {
            Outcome::Updated(draft) => {
                let _ = tx.send(SessionMessage::DocumentUpdate {
                    conversation_id: conversation_id.to_string(),
                    draft,
                });
            }
            Outcome::Warning(error) => {
                let _ = tx.send(SessionMessage::Warning {
                    conversation_id: conversation_id.to_string(),
                    error,
                });
            }
            Outcome::Ignored => {}
        }
        return Flow::Continue;
    }

    match message.apply(frame) {
        Outcome::Updated(snapshot) => {
            if snapshot.is_done {
                if !*completed_sent {
                    *completed_sent = true;
                    // Freeze the document draft alongside the message
                    if !document.is_empty() && !document.is_done() {
                        let draft = document.finalize();
                        let _ = tx.send(SessionMessage::DocumentUpdate {
                            conversation_id: conversation_id.to_string(),
                            draft,
                        });
                    }
                    debug!(conversation = %conversation_id, "stream completed");
                    let _ = tx.send(SessionMessage::Completed {
                        conversation_id: conversation_id.to_string(),
                        snapshot,
                    });
                }
            } else {
                let _ = tx.send(SessionMessage::MessageUpdate {
                    conversation_id: conversation_id.to_string(),
                    snapshot,
                });
            }
            Flow::Continue
        }
        Outcome::Warning(error) => {
            if error.is_fatal() {
                // The backend reported an abort: finalize with the
                // accumulated partial state
                let snapshot = message.finalize();
                let _ = tx.send(SessionMessage::Failed {
                    conversation_id: conversation_id.to_string(),
                    error,
                    snapshot: Some(snapshot),
                });
                Flow::Stop
            } else {
                let _ = tx.send(SessionMessage::Warning {
                    conversation_id: conversation_id.to_string(),
                    error,
                });
                Flow::Continue
            }
        }
        Outcome::Ignored => Flow::Continue,
    }
}

/// Finalize after a cancel request: the accumulated state becomes final,
/// the backend is told to stop, and the consumer gets `Cancelled`.
fn finish_cancelled(
    transport: &Arc<dyn StreamTransport>,
    tx: &mpsc::UnboundedSender<SessionMessage>,
    conversation_id: &str,
    message: &mut MessageInterpreter,
) {
    debug!(conversation = %conversation_id, "stream cancelled by caller");
    let snapshot = message.finalize();

    // Best-effort backend cancel; the local session is already done
    let transport = Arc::clone(transport);
    let id = conversation_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = transport.cancel_stream(&id).await {
            warn!(conversation = %id, error = %e, "backend cancel request failed");
        }
    });

    let _ = tx.send(SessionMessage::Cancelled {
        conversation_id: conversation_id.to_string(),
        snapshot,
    });
}
