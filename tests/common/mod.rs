//! Common test utilities for integration tests.
//!
//! Provides canned SSE bodies and a wiremock-backed Atelier endpoint so
//! the full pipeline (HTTP -> decoder -> interpreter -> session channel)
//! can be exercised against real bytes.

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use inkwell::session::SessionMessage;
use tokio::sync::mpsc;

/// Build an SSE body from (event, data) pairs. An empty data string
/// yields an event-only frame.
pub fn sse_body(frames: &[(&str, &str)]) -> String {
    let mut body = String::new();
    for (event, data) in frames {
        body.push_str("event: ");
        body.push_str(event);
        body.push('\n');
        if !data.is_empty() {
            body.push_str("data: ");
            body.push_str(data);
            body.push('\n');
        }
        body.push('\n');
    }
    body
}

/// Start a mock Atelier backend whose `/v1/stream` answers with `body`.
pub async fn mock_stream_backend(body: String) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stream"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/event-stream"),
        )
        .mount(&server)
        .await;
    server
}

/// Receive session messages until the terminal one, inclusive.
pub async fn collect_until_terminal(
    rx: &mut mpsc::UnboundedReceiver<SessionMessage>,
) -> Vec<SessionMessage> {
    let mut messages = Vec::new();
    while let Some(msg) = rx.recv().await {
        let terminal = msg.is_terminal();
        messages.push(msg);
        if terminal {
            break;
        }
    }
    messages
}
