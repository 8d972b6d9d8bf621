//! WebSocket client handshake.
//!
//! Sends the HTTP/1.1 upgrade request and accepts any response whose
//! status line reports 101. The `Sec-WebSocket-Accept` header is not
//! validated: the peer is a Chromium we launched on localhost, and the
//! key exchange guards against misrouted proxies, not against the
//! debugger we are already trusting with input injection.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace};

use crate::error::CdpError;
use crate::ws::url::WsUrl;

/// Upper bound on the upgrade response we are willing to buffer.
const MAX_RESPONSE_LEN: usize = 8 * 1024;

/// Generate the random 16-byte `Sec-WebSocket-Key` value.
pub fn generate_key() -> String {
    BASE64.encode(uuid::Uuid::new_v4().as_bytes())
}

/// Perform the client upgrade on a connected stream.
///
/// On success the stream is positioned at the first WebSocket frame byte;
/// Chromium does not pipeline frames behind the upgrade response, so no
/// read-ahead spill needs to be preserved.
pub async fn upgrade(stream: &mut TcpStream, url: &WsUrl) -> Result<(), CdpError> {
    let key = generate_key();
    let request = format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {authority}\r\n\
         Upgrade: websocket\r\n\
         Connection: Upgrade\r\n\
         Sec-WebSocket-Key: {key}\r\n\
         Sec-WebSocket-Version: 13\r\n\
         \r\n",
        path = url.path,
        authority = url.authority(),
    );
    trace!(path = %url.path, "Sending WebSocket upgrade request");
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::with_capacity(512);
    let mut byte = [0u8; 1];
    loop {
        let n = stream.read(&mut byte).await?;
        if n == 0 {
            return Err(CdpError::HandshakeFailed(
                "connection closed during upgrade".to_string(),
            ));
        }
        response.push(byte[0]);
        if response.ends_with(b"\r\n\r\n") {
            break;
        }
        if response.len() > MAX_RESPONSE_LEN {
            return Err(CdpError::HandshakeFailed(
                "oversized upgrade response".to_string(),
            ));
        }
    }

    let head = String::from_utf8_lossy(&response);
    let status_line = head.lines().next().unwrap_or_default();
    if !status_line.contains("101") {
        return Err(CdpError::HandshakeFailed(format!(
            "unexpected status line: {status_line}"
        )));
    }

    debug!(status = %status_line, "WebSocket upgrade accepted");
    Ok(())
}
