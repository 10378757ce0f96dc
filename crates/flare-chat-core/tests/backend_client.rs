use flare_chat_core::{
    BackendClient, BackendError, ChatBackend, ChatRequest, ChatSession, Role, Turn,
    FALLBACK_REPLY,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A request as seen by the mock server
struct Captured {
    request_line: String,
    body: String,
}

/// Serve exactly one HTTP exchange with a canned response.
async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();

        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);

        while buf.len() < header_end + content_length {
            let n = stream.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.ok();

        Captured {
            request_line: head.lines().next().unwrap_or_default().to_string(),
            body: String::from_utf8_lossy(&buf[header_end..]).to_string(),
        }
    });

    (base_url, handle)
}

/// The mock server is on loopback; keep any proxy from the environment out of the way.
fn local_client(base_url: &str) -> BackendClient {
    let http = reqwest::Client::builder().no_proxy().build().unwrap();
    BackendClient::with_http_client(http, base_url)
}

#[tokio::test]
async fn test_chat_posts_history_and_prompt() {
    let (base_url, server) =
        serve_once("200 OK", r#"{"response":"Use the FTSO.","session_id":"s-1"}"#).await;
    let client = local_client(&base_url);

    let request = ChatRequest {
        messages: vec![Turn::user("hi"), Turn::assistant("hello")],
        prompt: "price feeds?".to_string(),
        session_id: None,
    };
    let reply = client.chat(&request).await.unwrap();
    assert_eq!(reply.response, "Use the FTSO.");
    assert_eq!(reply.session_id.as_deref(), Some("s-1"));

    let captured = server.await.unwrap();
    assert!(captured.request_line.starts_with("POST /api/chat "));
    let sent: ChatRequest = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, request);
}

#[tokio::test]
async fn test_chat_non_success_status() {
    let (base_url, server) =
        serve_once("500 Internal Server Error", r#"{"detail":"model missing"}"#).await;
    let client = local_client(&base_url);

    let request = ChatRequest {
        messages: Vec::new(),
        prompt: "hi".to_string(),
        session_id: None,
    };
    let err = client.chat(&request).await.unwrap_err();
    match err {
        BackendError::Status { status, body } => {
            assert_eq!(status.as_u16(), 500);
            assert!(body.contains("model missing"));
        }
        other => panic!("unexpected error: {other}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_chat_undecodable_body() {
    let (base_url, server) = serve_once("200 OK", r#"{"answer":"wrong field"}"#).await;
    let client = local_client(&base_url);

    let request = ChatRequest {
        messages: Vec::new(),
        prompt: "hi".to_string(),
        session_id: None,
    };
    assert!(matches!(
        client.chat(&request).await,
        Err(BackendError::Decode(_))
    ));
    server.await.unwrap();
}

#[tokio::test]
async fn test_health_reports_rag() {
    let (base_url, server) = serve_once("200 OK", r#"{"status":"healthy","rag":"available"}"#).await;
    let client = local_client(&base_url);

    assert!(client.rag_available().await);
    let captured = server.await.unwrap();
    assert!(captured.request_line.starts_with("GET / "));
}

#[tokio::test]
async fn test_health_failure_is_unavailable() {
    // Bind then drop so nothing is listening on the port.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = local_client(&base_url);
    assert!(!client.rag_available().await);
}

#[tokio::test]
async fn test_reset_posts_session_id() {
    let (base_url, server) = serve_once("200 OK", r#"{"status":"success"}"#).await;
    let client = local_client(&base_url);

    client.reset("s-1").await.unwrap();

    let captured = server.await.unwrap();
    assert!(captured.request_line.starts_with("POST /api/reset "));
    let body: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(body, serde_json::json!({ "session_id": "s-1" }));
}

#[tokio::test]
async fn test_session_over_http_falls_back_on_error() {
    let (base_url, server) = serve_once("502 Bad Gateway", "{}").await;
    let mut session = ChatSession::new(local_client(&base_url));

    let pending = session.append_user_turn("hello?").unwrap();
    let turn = session.submit(pending).await.unwrap();

    assert_eq!(turn.role, Role::Assistant);
    assert_eq!(turn.content, FALLBACK_REPLY);
    assert_eq!(session.turns().len(), 2);
    assert!(!session.is_busy());
    server.await.unwrap();
}

#[tokio::test]
async fn test_health_non_success_status() {
    let (base_url, server) = serve_once("503 Service Unavailable", "warming up").await;
    let client = local_client(&base_url);

    match client.health().await {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(body, "warming up");
        }
        other => panic!("unexpected result: {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_reset_non_success_status() {
    let (base_url, server) = serve_once("404 Not Found", r#"{"detail":"unknown session"}"#).await;
    let client = local_client(&base_url);

    match client.reset("s-9").await {
        Err(BackendError::Status { status, body }) => {
            assert_eq!(status.as_u16(), 404);
            assert!(body.contains("unknown session"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    server.await.unwrap();
}
