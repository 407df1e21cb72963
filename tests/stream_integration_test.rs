//! End-to-end stream tests against a mock Atelier backend.
//!
//! These drive the real HTTP client through wiremock, so every byte goes
//! through the same decoder and interpreter path production uses.

mod common;

use std::sync::Arc;

use tokio::sync::mpsc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{collect_until_terminal, mock_stream_backend, sse_body};
use inkwell::atelier::AtelierClient;
use inkwell::error::StreamError;
use inkwell::models::{StepStatus, StreamRequest};
use inkwell::session::{SessionMessage, StreamCoordinator, StreamSession};

fn request() -> StreamRequest {
    StreamRequest::with_conversation("write me an intro".to_string(), "conv-1".to_string())
}

#[tokio::test]
async fn test_full_chat_stream_reaches_completed_snapshot() {
    let body = sse_body(&[
        (
            "thinking",
            r#"{"steps":[{"id":"s1","title":"Outline","status":"inprogress"}]}"#,
        ),
        ("content", r#"{"text": "Dear "}"#),
        ("content", r#"{"text": "reviewer,"}"#),
        (
            "thinking",
            r#"{"steps":[{"id":"s1","status":"completed"}]}"#,
        ),
        ("suggestions", r#"{"suggestions": ["Add a closing line"]}"#),
        (
            "artifacts",
            r#"{"artifacts": [{"id":"a1","title":"Draft","type":"document"}]}"#,
        ),
        ("done", r#"{"message_id": "m-1"}"#),
    ]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let handle = StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;
    handle.join().await;

    // One update per state-changing frame, then the terminal
    assert_eq!(messages.len(), 7);
    match messages.last().unwrap() {
        SessionMessage::Completed { snapshot, .. } => {
            assert_eq!(snapshot.content, "Dear reviewer,");
            assert!(snapshot.is_done);
            assert_eq!(snapshot.thinking_steps.len(), 1);
            assert_eq!(snapshot.thinking_steps[0].status, StepStatus::Completed);
            assert_eq!(snapshot.suggestions, vec!["Add a closing line"]);
            assert_eq!(snapshot.artifacts[0].artifact_type, "document");
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_code_fence_reconstruction_over_http() {
    let body = sse_body(&[
        ("content", r#"{"text": "Here is "}"#),
        ("content", r#"{"text": "some "}"#),
        ("content", r#"{"text": "```py\ncode"}"#),
        ("content", r#"{"text": "\n```"}"#),
        ("done", ""),
    ]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    match messages.last().unwrap() {
        SessionMessage::Completed { snapshot, .. } => {
            assert_eq!(snapshot.content, "Here is some ```py\ncode\n```");
            assert!(!snapshot.code_block.in_code_block);
            assert!(snapshot.is_done);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_rejection_fails_before_streaming() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/stream"))
        .respond_with(ResponseTemplate::new(422).set_body_string("bad request"))
        .mount(&server)
        .await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    assert_eq!(messages.len(), 1);
    match &messages[0] {
        SessionMessage::Failed {
            error, snapshot, ..
        } => {
            assert!(matches!(
                error,
                StreamError::RequestFailed {
                    status: Some(422),
                    ..
                }
            ));
            assert!(snapshot.is_none());
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_stream_without_terminal_still_completes() {
    // The body ends without a done frame; the decoder synthesizes one
    let body = sse_body(&[("content", r#"{"text": "partial but kept"}"#)]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    match messages.last().unwrap() {
        SessionMessage::Completed { snapshot, .. } => {
            assert_eq!(snapshot.content, "partial but kept");
            assert!(snapshot.is_done);
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_unknown_event_yields_warning_and_stream_continues() {
    let body = sse_body(&[
        ("widget_resized", r#"{"w": 3}"#),
        ("content", r#"{"text": "unaffected"}"#),
        ("done", ""),
    ]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    assert!(matches!(
        &messages[0],
        SessionMessage::Warning {
            error: StreamError::Decode { .. },
            ..
        }
    ));
    match messages.last().unwrap() {
        SessionMessage::Completed { snapshot, .. } => {
            assert_eq!(snapshot.content, "unaffected");
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_document_generation_stream() {
    let body = sse_body(&[
        ("document_start", r#"{"document_id": "rfp-7"}"#),
        ("content_block_start", r#"{"label": "Security"}"#),
        ("content_block_delta", r#"{"text": "Data is encrypted "}"#),
        ("content_block_delta", r#"{"text": "at rest and in transit."}"#),
        ("content_block_start", r#"{"label": "Support"}"#),
        ("content_block_delta", r#"{"text": "24/7 on-call."}"#),
        ("document_stop", ""),
        ("done", ""),
    ]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    let final_draft = messages
        .iter()
        .rev()
        .find_map(|m| match m {
            SessionMessage::DocumentUpdate { draft, .. } => Some(draft.clone()),
            _ => None,
        })
        .expect("document updates emitted");
    assert!(final_draft.is_complete);
    assert_eq!(final_draft.document_id.as_deref(), Some("rfp-7"));
    assert_eq!(final_draft.blocks.len(), 2);
    assert_eq!(
        final_draft.blocks[0].content,
        "Data is encrypted at rest and in transit."
    );
    assert_eq!(final_draft.blocks[1].label.as_deref(), Some("Support"));
}

#[tokio::test]
async fn test_done_sentinel_body() {
    // Streams that end with the bare [DONE] sentinel instead of an event
    let server = MockServer::start().await;
    let body = "data: {\"type\":\"content\",\"data\":\"sentinel style\"}\n\ndata: [DONE]\n\n";
    Mock::given(method("POST"))
        .and(path("/v1/stream"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(body.as_bytes().to_vec(), "text/event-stream"),
        )
        .mount(&server)
        .await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    StreamSession::spawn(Arc::new(client), request(), tx);
    let messages = collect_until_terminal(&mut rx).await;

    match messages.last().unwrap() {
        SessionMessage::Completed { snapshot, .. } => {
            assert_eq!(snapshot.content, "sentinel style");
        }
        other => panic!("Expected Completed, got {:?}", other),
    }
}

#[tokio::test]
async fn test_health_check_against_mock_backend() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    let client = AtelierClient::with_base_url(server.uri());
    assert!(client.health_check().await.unwrap());
}

#[tokio::test]
async fn test_cancel_endpoint_called() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/cancel"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let client = AtelierClient::with_base_url(server.uri());
    client.cancel_stream("conv-1").await.unwrap();
}

#[tokio::test]
async fn test_coordinator_over_http_backend() {
    let body = sse_body(&[("content", r#"{"text": "hi"}"#), ("done", "")]);
    let server = mock_stream_backend(body).await;
    let client = AtelierClient::with_base_url(server.uri());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut coordinator = StreamCoordinator::new(Arc::new(client), tx);
    let key = coordinator.start_stream(request());
    assert_eq!(key, "conv-1");

    let messages = collect_until_terminal(&mut rx).await;
    assert!(matches!(
        messages.last().unwrap(),
        SessionMessage::Completed { .. }
    ));
}
