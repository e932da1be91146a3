//! Integration tests for the ragline library.
//!
//! Each test binds an ephemeral TCP listener and speaks just enough HTTP/1.1
//! to satisfy the client, so no live service is required. The stub accepts a
//! single connection, captures the request for assertions, and replies with a
//! canned response.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use ragline::chat::{ChatConfig, ChatSession};
use ragline::{
    AuthSession, Error, HistoryPage, MemoryTokenStore, RagClient, SessionId, TokenStore,
};

/// Serve one canned response; resolves to the captured request text.
async fn stub_service(
    status: &str,
    content_type: &str,
    body: &str,
) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len(),
    );
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        request
    });
    (base_url, handle)
}

/// Read a full HTTP/1.1 request, headers plus Content-Length body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        buffer.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buffer);
        if let Some(at) = text.find("\r\n\r\n") {
            let content_length = text[..at]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    if name.eq_ignore_ascii_case("content-length") {
                        value.trim().parse::<usize>().ok()
                    } else {
                        None
                    }
                })
                .unwrap_or(0);
            if buffer.len() >= at + 4 + content_length {
                return text.into_owned();
            }
        }
        if n == 0 {
            return String::from_utf8_lossy(&buffer).into_owned();
        }
    }
}

fn harness(
    base_url: &str,
    config: ChatConfig,
) -> (
    Arc<MemoryTokenStore>,
    Arc<RagClient>,
    Arc<AuthSession>,
    ChatSession,
) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let client =
        Arc::new(RagClient::new(base_url, tokens.clone() as Arc<dyn TokenStore>).unwrap());
    let auth = AuthSession::new(client.clone(), tokens.clone());
    auth.install_guard();
    let session = ChatSession::new(client.clone(), auth.clone(), config);
    (tokens, client, auth, session)
}

#[tokio::test]
async fn login_stores_token_and_user() {
    let body = serde_json::json!({
        "access_token": "tok1",
        "token_type": "bearer",
        "user": {"id": "u1", "email": "alice@example.com"}
    })
    .to_string();
    let (base_url, server) = stub_service("200 OK", "application/json", &body).await;
    let (tokens, _client, auth, _session) = harness(&base_url, ChatConfig::new());

    assert!(auth.login("alice@example.com", "hunter2").await);
    assert_eq!(tokens.get(), Some("tok1".to_string()));
    assert_eq!(auth.current_user().unwrap().email, "alice@example.com");

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /auth/login "));
    // The login endpoint itself is called unauthorized.
    assert!(!request.to_ascii_lowercase().contains("authorization:"));
    assert!(request.contains("alice@example.com"));
}

#[tokio::test]
async fn rejected_login_leaves_state_unchanged() {
    let body = r#"{"detail": "Incorrect email or password"}"#;
    let (base_url, server) = stub_service("401 Unauthorized", "application/json", body).await;
    let (tokens, _client, auth, _session) = harness(&base_url, ChatConfig::new());

    assert!(!auth.login("alice@example.com", "wrong").await);
    assert_eq!(tokens.get(), None);
    assert!(auth.current_user().is_none());
    server.await.unwrap();
}

#[tokio::test]
async fn expired_token_forces_logout() {
    let body = r#"{"detail": "Token expired"}"#;
    let (base_url, server) = stub_service("401 Unauthorized", "application/json", body).await;
    let (tokens, _client, auth, session) = harness(&base_url, ChatConfig::new());
    tokens.set(Some("tok1"));

    // Hydration fails quietly; the guard clears the credentials as a side
    // effect of the 401 passing through the client.
    assert!(!session.hydrate().await);
    assert!(!auth.is_authenticated());
    assert_eq!(tokens.get(), None);

    let request = server.await.unwrap();
    assert!(request.starts_with("GET /queries/history"));
    assert!(request.contains("Bearer tok1"));
}

#[tokio::test]
async fn error_detail_maps_to_typed_error() {
    let body = r#"{"detail": "Not allowed"}"#;
    let (base_url, server) = stub_service("403 Forbidden", "application/json", body).await;
    let (_tokens, client, _auth, _session) = harness(&base_url, ChatConfig::new());

    let err = client
        .get_json::<HistoryPage>("queries/history", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Permission { .. }));
    assert!(err.to_string().contains("Not allowed"));
    server.await.unwrap();
}

#[tokio::test]
async fn blocking_send_settles_transcript() {
    let body = serde_json::json!({
        "query": "what is a frame?",
        "response": "A frame is a unit.",
        "context_documents": [],
        "input_tokens": 10,
        "output_tokens": 32,
        "total_tokens": 42,
        "source_attribution": ["notes.md"],
        "processing_time_ms": 12.5
    })
    .to_string();
    let (base_url, server) = stub_service("200 OK", "application/json", &body).await;
    let config = ChatConfig::new()
        .with_streaming(false)
        .with_session_id(Some(SessionId::from("s1")));
    let (tokens, _client, _auth, session) = harness(&base_url, config);
    tokens.set(Some("tok1"));

    assert!(session.send("what is a frame?").await.unwrap());

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "what is a frame?");
    assert_eq!(messages[1].text, "A frame is a unit.");
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert_eq!(metadata.total_tokens, Some(42));
    assert!(!metadata.tokens_estimated);
    assert_eq!(metadata.sources, vec!["notes.md"]);
    assert_eq!(metadata.processing_time_ms, Some(12.5));

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /queries/rag "));
    assert!(request.contains("Bearer tok1"));
    assert!(request.contains("\"session_id\":\"s1\""));
}

#[tokio::test]
async fn streaming_send_concatenates_frames() {
    let body = "data: foo\n\ndata: bar\n\ndata: [DONE]\n\n";
    let (base_url, server) = stub_service("200 OK", "text/event-stream", body).await;
    let (tokens, _client, _auth, session) = harness(&base_url, ChatConfig::new());
    tokens.set(Some("tok1"));

    assert!(session.send("hello").await.unwrap());

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "foobar");
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert!(metadata.tokens_estimated);
    // Six characters at roughly four characters per token.
    assert_eq!(metadata.total_tokens, Some(1));
    assert!(metadata.sources.is_empty());

    let request = server.await.unwrap();
    assert!(request.starts_with("POST /queries/rag/stream "));
    assert!(request.contains("text/event-stream"));
}

#[tokio::test]
async fn cancel_mid_stream_settles_with_partial_text() {
    // One frame arrives, then the stream stalls with the connection held
    // open; only cancellation can settle the exchange.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/", listener.local_addr().unwrap());
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let _request = read_request(&mut socket).await;
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: 1000\r\n\r\ndata: partial\n\n";
        socket.write_all(head.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;
    });

    let (tokens, _client, _auth, session) = harness(&base_url, ChatConfig::new());
    tokens.set(Some("tok1"));
    let session = Arc::new(session);

    let send = tokio::spawn({
        let session = session.clone();
        async move { session.send("hello").await }
    });

    // Wait for the first frame to land in the placeholder before cancelling.
    for _ in 0..200 {
        let landed = session
            .messages()
            .last()
            .is_some_and(|message| message.text == "partial");
        if landed {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    session.cancel();

    // The send resolves promptly with the partial text it accumulated.
    assert!(send.await.unwrap().unwrap());
    assert!(!session.is_busy());

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, "partial");
    let metadata = messages[1].metadata.as_ref().unwrap();
    assert!(metadata.tokens_estimated);

    server.abort();
}

#[tokio::test]
async fn hydration_replaces_transcript() {
    let body = serde_json::json!({
        "queries": [
            {
                "id": "q1",
                "query_text": "first?",
                "created_at": "2024-05-01T12:00:00Z",
                "processing_time_ms": 900.0,
                "total_tokens": 80,
                "status": "completed",
                "response": {
                    "response_text": "first answer",
                    "context_chunks": [],
                    "source_attribution": ["notes.md"],
                    "created_at": "2024-05-01T12:00:02Z"
                }
            }
        ],
        "total": 1
    })
    .to_string();
    let (base_url, server) = stub_service("200 OK", "application/json", &body).await;
    let (tokens, _client, _auth, session) = harness(&base_url, ChatConfig::new());
    tokens.set(Some("tok1"));

    assert!(session.hydrate().await);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id, "q1-user");
    assert_eq!(messages[0].text, "first?");
    assert_eq!(messages[1].id, "q1-assistant");
    assert_eq!(messages[1].text, "first answer");

    let request = server.await.unwrap();
    assert!(request.contains("session_id="));
    assert!(request.contains("limit=50"));
}

#[tokio::test]
async fn empty_history_keeps_transcript() {
    let body = r#"{"queries": [], "total": 0}"#;
    let (base_url, server) = stub_service("200 OK", "application/json", body).await;
    let (tokens, _client, _auth, session) = harness(&base_url, ChatConfig::new());
    tokens.set(Some("tok1"));

    assert!(!session.hydrate().await);
    assert_eq!(session.message_count(), 0);
    server.await.unwrap();
}
