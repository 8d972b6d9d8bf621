use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use super::*;

/// Serve canned HTTP responses, one per accepted connection.
async fn serve_responses(listener: TcpListener, bodies: Vec<String>) {
    for body in bodies {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut byte = [0u8; 1];
        loop {
            let n = stream.read(&mut byte).await.unwrap();
            if n == 0 {
                break;
            }
            head.push(byte[0]);
            if head.ends_with(b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.unwrap();
    }
}

#[tokio::test]
async fn test_discover_page_target_picks_first_page() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let body = r#"[
        {"id":"W1","type":"service_worker","title":"sw","url":"https://x/","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/page/W1"},
        {"id":"P1","type":"page","title":"Example","url":"https://example.com/","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/page/P1"},
        {"id":"P2","type":"page","title":"Other","url":"https://other/","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/page/P2"}
    ]"#;
    let server = tokio::spawn(serve_responses(listener, vec![body.to_string()]));

    let target = discover_page_target(port).await.unwrap();
    assert_eq!(target.id, "P1");
    assert_eq!(target.target_type, "page");
    assert_eq!(
        target.web_socket_debugger_url.as_deref(),
        Some("ws://127.0.0.1:9222/devtools/page/P1")
    );
    server.await.unwrap();
}

#[tokio::test]
async fn test_discover_page_target_retries_until_page_appears() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    // First poll: browser is up but has no page yet. Second poll: page.
    let empty = "[]".to_string();
    let with_page = r#"[{"id":"P9","type":"page","title":"","url":"about:blank","webSocketDebuggerUrl":"ws://127.0.0.1:1/devtools/page/P9"}]"#.to_string();
    let server = tokio::spawn(serve_responses(listener, vec![empty, with_page]));

    let target = discover_page_target(port).await.unwrap();
    assert_eq!(target.id, "P9");
    server.await.unwrap();
}

#[tokio::test]
async fn test_discover_browser_ws_url() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let body = r#"{"Browser":"Chrome/125.0","Protocol-Version":"1.3","webSocketDebuggerUrl":"ws://127.0.0.1:9222/devtools/browser/abc-def"}"#;
    let server = tokio::spawn(serve_responses(listener, vec![body.to_string()]));

    let url = discover_browser_ws_url(port).await.unwrap();
    assert_eq!(url, "ws://127.0.0.1:9222/devtools/browser/abc-def");
    server.await.unwrap();
}

#[tokio::test]
async fn test_discover_browser_ws_url_missing_field() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let server = tokio::spawn(serve_responses(
        listener,
        vec![r#"{"Browser":"Chrome/125.0"}"#.to_string()],
    ));

    let err = discover_browser_ws_url(port).await.unwrap_err();
    assert!(matches!(err, CdpError::InvalidResponse(_)));
    server.await.unwrap();
}

#[test]
fn test_page_target_deserialization_tolerates_missing_optionals() {
    let target: PageTarget =
        serde_json::from_str(r#"{"id":"X","type":"page"}"#).unwrap();
    assert_eq!(target.id, "X");
    assert!(target.title.is_empty());
    assert!(target.web_socket_debugger_url.is_none());
}
