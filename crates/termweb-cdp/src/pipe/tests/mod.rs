use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;

use super::*;
use crate::error::CdpError;
use crate::framepool::FramePool;

/// The Chromium side of a pipe pair: reads our commands, writes messages.
struct MockChromium {
    commands: pipe::Receiver,
    messages: pipe::Sender,
    buf: Vec<u8>,
}

impl MockChromium {
    async fn read_message(&mut self) -> Vec<u8> {
        loop {
            if let Some(nul) = self.buf.iter().position(|&b| b == 0) {
                let message = self.buf[..nul].to_vec();
                self.buf.drain(..=nul);
                return message;
            }
            let n = self.commands.read_buf(&mut self.buf).await.unwrap();
            assert!(n > 0, "transport closed the command pipe");
        }
    }

    async fn send_message(&mut self, message: &[u8]) {
        self.messages.write_all(message).await.unwrap();
        self.messages.write_all(&[0]).await.unwrap();
    }
}

fn transport_pair(options: PipeTransportOptions) -> (PipeTransport, MockChromium) {
    let (cmd_tx, cmd_rx) = pipe::pipe().unwrap();
    let (msg_tx, msg_rx) = pipe::pipe().unwrap();
    let transport = PipeTransport::new(msg_rx, cmd_tx, options);
    let chromium = MockChromium {
        commands: cmd_rx,
        messages: msg_tx,
        buf: Vec::new(),
    };
    (transport, chromium)
}

fn screencast_frame(frame_sid: i64, image: &[u8]) -> Vec<u8> {
    let data = BASE64.encode(image);
    format!(
        r#"{{"method":"Page.screencastFrame","params":{{"data":"{data}","metadata":{{"offsetTop":0,"pageScaleFactor":1,"deviceWidth":1280,"deviceHeight":720,"scrollOffsetX":0,"scrollOffsetY":0}},"sessionId":{frame_sid}}},"sessionId":"PIPE-SESSION"}}"#
    )
    .into_bytes()
}

async fn wait_until(mut probe: impl FnMut() -> bool) {
    for _ in 0..500 {
        if probe() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 5s");
}

#[tokio::test]
async fn test_command_response_round_trip() {
    let (transport, mut chromium) = transport_pair(PipeTransportOptions::default());
    transport.start_reader();

    let chromium_task = tokio::spawn(async move {
        let request = chromium.read_message().await;
        let text = String::from_utf8(request.clone()).unwrap();
        assert!(text.contains(r#""method":"Page.enable""#));
        assert!(text.contains(r#""sessionId":"SESS1""#));
        let id = crate::scan::response_id(&request).unwrap();
        chromium
            .send_message(format!(r#"{{"id":{id},"result":{{"ok":true}}}}"#).as_bytes())
            .await;
        chromium
    });

    let response = transport
        .send_command("Page.enable", None, Some("SESS1"))
        .await
        .unwrap();
    assert!(std::str::from_utf8(&response).unwrap().contains("ok"));
    let _chromium = chromium_task.await.unwrap();
}

#[tokio::test]
async fn test_messages_split_across_reads() {
    let (transport, mut chromium) = transport_pair(PipeTransportOptions::default());
    transport.start_reader();

    let chromium_task = tokio::spawn(async move {
        let request = chromium.read_message().await;
        let id = crate::scan::response_id(&request).unwrap();
        // Dribble the response byte by byte; the reader must reassemble
        // across reads and only act on the NUL terminator.
        let response = format!(r#"{{"id":{id},"result":{{"value":"split"}}}}"#);
        for byte in response.as_bytes() {
            chromium.messages.write_all(&[*byte]).await.unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        chromium.messages.write_all(&[0]).await.unwrap();
        chromium
    });

    let response = transport.send_command("Runtime.enable", None, None).await.unwrap();
    assert!(std::str::from_utf8(&response).unwrap().contains("split"));
    let _chromium = chromium_task.await.unwrap();
}

#[tokio::test]
async fn test_protocol_error_surfaced() {
    let (transport, mut chromium) = transport_pair(PipeTransportOptions::default());
    transport.start_reader();

    let chromium_task = tokio::spawn(async move {
        let request = chromium.read_message().await;
        let id = crate::scan::response_id(&request).unwrap();
        chromium
            .send_message(
                format!(r#"{{"id":{id},"error":{{"code":-32000,"message":"No target"}}}}"#)
                    .as_bytes(),
            )
            .await;
        chromium
    });

    let err = transport
        .send_command("Target.attachToTarget", None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CdpError::Protocol { message } if message == "No target"));
    let _chromium = chromium_task.await.unwrap();
}

/// Flow control under consumer-pull: ten frames arrive while the consumer acquires only
/// generations 3 and 8; exactly two acks flow back, carrying the session
/// ids of frames 3 and 8.
#[tokio::test]
async fn test_consumer_pull_ack_flow_control() {
    let (pool, writer) = FramePool::new();
    let options = PipeTransportOptions::default().frame_writer(writer);
    let (transport, mut chromium) = transport_pair(options);
    transport.start_reader();

    for sid in 1..=3i64 {
        chromium
            .send_message(&screencast_frame(sid, format!("frame-{sid}").as_bytes()))
            .await;
    }
    wait_until(|| pool.generation() == 3).await;

    // The renderer acquires; the consumer-pull ack fires for frame 3.
    {
        let frame = pool.acquire_latest_frame().unwrap();
        assert_eq!(frame.payload(), b"frame-3");
        assert_eq!(frame.meta().frame_session_id, 3);
    }
    transport.ack_pending_frame().await;

    let ack = chromium.read_message().await;
    let text = String::from_utf8(ack).unwrap();
    assert!(text.contains("Page.screencastFrameAck"));
    assert!(text.contains(r#""sessionId":3"#));
    assert!(text.contains(r#""sessionId":"PIPE-SESSION""#));

    for sid in 4..=8i64 {
        chromium
            .send_message(&screencast_frame(sid, format!("frame-{sid}").as_bytes()))
            .await;
    }
    wait_until(|| pool.generation() == 8).await;

    {
        let frame = pool.acquire_latest_frame().unwrap();
        assert_eq!(frame.meta().frame_session_id, 8);
    }
    transport.ack_pending_frame().await;

    let ack = chromium.read_message().await;
    let text = String::from_utf8(ack).unwrap();
    assert!(text.contains(r#""sessionId":8"#));

    // Unacquired frames produce no acks: acking again with nothing pending
    // writes nothing to the pipe.
    transport.ack_pending_frame().await;
    chromium
        .send_message(&screencast_frame(9, b"frame-9"))
        .await;
    chromium
        .send_message(&screencast_frame(10, b"frame-10"))
        .await;
    wait_until(|| pool.generation() == 10).await;

    let extra = tokio::time::timeout(Duration::from_millis(150), chromium.read_message()).await;
    assert!(extra.is_err(), "exactly two acks for two acquisitions");
}

#[tokio::test]
async fn test_pipe_ignores_foreign_events_but_flags_navigation() {
    let (pool, writer) = FramePool::new();
    let options = PipeTransportOptions::default().frame_writer(writer);
    let (transport, mut chromium) = transport_pair(options);
    transport.start_reader();

    assert!(!transport.take_navigation_flag());

    // Events the navigation WebSocket would carry are dropped here.
    chromium
        .send_message(br#"{"method":"Runtime.consoleAPICalled","params":{"type":"log"}}"#)
        .await;
    chromium
        .send_message(br#"{"method":"Browser.downloadWillBegin","params":{}}"#)
        .await;
    chromium
        .send_message(br#"{"method":"Page.frameNavigated","params":{"frame":{"id":"MAIN"}}}"#)
        .await;
    chromium.send_message(&screencast_frame(1, b"pixels")).await;

    wait_until(|| pool.generation() == 1).await;
    assert!(transport.take_navigation_flag());
    assert!(!transport.take_navigation_flag(), "flag is take-once");
    assert_eq!(pool.generation(), 1, "only the screencast frame reached the pool");
}

#[tokio::test]
async fn test_reader_survives_peer_close() {
    let (transport, chromium) = transport_pair(PipeTransportOptions::default());
    transport.start_reader();
    assert!(transport.is_running());
    drop(chromium);
    wait_until(|| !transport.is_running()).await;
}

#[tokio::test]
async fn test_close_silences_async_sends() {
    let (transport, _chromium) = transport_pair(PipeTransportOptions::default());
    transport.start_reader();
    transport.close().await;
    transport.close().await;

    transport
        .send_command_async("Page.screencastFrameAck", None, None)
        .await;
    let err = transport.send_command("Page.enable", None, None).await.unwrap_err();
    assert!(matches!(err, CdpError::ConnectionClosed));
}
