//! WebSocket CDP transport.
//!
//! One WebSocket connection to a Chromium debugger endpoint: upgrade
//! handshake, RFC 6455 client framing, a reader task that correlates
//! responses and queues events, ping/pong keepalive, and optional local
//! handling of screencast frames into a [`FramePool`].
//!
//! The client opens several of these at once (mouse, keyboard, navigation,
//! browser, optionally screencast) so that a large frame or a slow
//! evaluation can never delay a mouse click.

pub mod frame;
pub mod handshake;
pub mod url;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::CdpError;
use crate::framepool::{FrameMeta, FramePool, FrameWriter};
use crate::message::{CdpRequest, PendingResponse, TransportEvent};
use crate::queue::{BoundedQueue, EVENT_QUEUE_CAPACITY, RESPONSE_QUEUE_CAPACITY};
use crate::scan;

pub use frame::{OpCode, WsFrame};
pub use url::WsUrl;

/// Default timeout for a blocking command round-trip.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15);

/// Default idle interval before a keepalive ping is sent.
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Events forwarded to the event queue. Everything else Chromium pushes on
/// this socket is noise for a terminal browser and is dropped at the
/// reader.
const EVENTS_OF_INTEREST: [&str; 9] = [
    "Runtime.consoleAPICalled",
    "Page.javascriptDialogOpening",
    "Page.fileChooserOpened",
    "Browser.downloadWillBegin",
    "Browser.downloadProgress",
    "Page.frameNavigated",
    "Page.navigatedWithinDocument",
    "Target.targetCreated",
    "Target.targetInfoChanged",
];

/// Random mask key for one client frame.
fn mask_key() -> [u8; 4] {
    let bytes = uuid::Uuid::new_v4();
    let bytes = bytes.as_bytes();
    [bytes[0], bytes[1], bytes[2], bytes[3]]
}

/// Options for a WebSocket transport.
#[derive(Debug)]
pub struct WsTransportOptions {
    /// Timeout for blocking command round-trips.
    pub command_timeout: Duration,
    /// Idle interval before a keepalive ping.
    pub keepalive_interval: Duration,
    /// Attach a frame pool writer: this transport then handles
    /// `Page.screencastFrame` locally and acknowledges each frame.
    pub frame_writer: Option<FrameWriter>,
}

impl Default for WsTransportOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            frame_writer: None,
        }
    }
}

impl WsTransportOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the blocking command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the keepalive idle interval.
    #[must_use]
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Attach a frame pool writer for screencast handling.
    #[must_use]
    pub fn frame_writer(mut self, writer: FrameWriter) -> Self {
        self.frame_writer = Some(writer);
        self
    }
}

/// Serialized write access to the socket. Outbound bytes go through one
/// mutex so partial frames never interleave.
#[derive(Debug)]
struct SocketWriter {
    stream: tokio::sync::Mutex<OwnedWriteHalf>,
    closed: AtomicBool,
}

impl SocketWriter {
    /// Send a frame, waiting for the write mutex.
    async fn send_frame(&self, frame: &WsFrame) -> Result<(), CdpError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CdpError::ConnectionClosed);
        }
        let bytes = frame.encode();
        let mut stream = self.stream.lock().await;
        stream.write_all(&bytes).await?;
        Ok(())
    }

    /// Send a frame on the fast path: try-lock with bounded exponential
    /// backoff (10 µs doubling, capped at 160 µs, 10 attempts) before
    /// falling back to a blocking acquire. Input commands use this so they
    /// are not priority-inverted behind a large frame already in flight.
    async fn send_frame_priority(&self, frame: &WsFrame) -> Result<(), CdpError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CdpError::ConnectionClosed);
        }
        let bytes = frame.encode();
        for attempt in 0u32..10 {
            if let Ok(mut stream) = self.stream.try_lock() {
                stream.write_all(&bytes).await?;
                return Ok(());
            }
            tokio::time::sleep(Duration::from_micros(10 << attempt.min(4))).await;
        }
        let mut stream = self.stream.lock().await;
        stream.write_all(&bytes).await?;
        Ok(())
    }

    /// Best-effort close frame followed by a socket shutdown. All errors
    /// are swallowed; this is the teardown path.
    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let mut stream = self.stream.lock().await;
        let _ = stream.write_all(&WsFrame::close(mask_key()).encode()).await;
        let _ = stream.shutdown().await;
    }
}

#[derive(Debug)]
enum ReaderState {
    /// Connected; reader not yet started.
    Idle {
        read: OwnedReadHalf,
        frame_writer: Option<FrameWriter>,
    },
    /// Reader task running.
    Running(tokio::task::JoinHandle<()>),
    /// Torn down.
    Closed,
}

/// A single WebSocket CDP connection.
#[derive(Debug)]
pub struct WsTransport {
    url: WsUrl,
    writer: Arc<SocketWriter>,
    responses: Arc<BoundedQueue<PendingResponse>>,
    events: Arc<BoundedQueue<TransportEvent>>,
    pool: Option<Arc<FramePool>>,
    next_id: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    reader: parking_lot::Mutex<ReaderState>,
    command_timeout: Duration,
    keepalive_interval: Duration,
}

impl WsTransport {
    /// Connect and perform the WebSocket upgrade. The reader task is not
    /// started yet; call [`start_reader`](Self::start_reader) next.
    #[instrument(level = "info", skip(options), fields(url = %url))]
    pub async fn connect(url: &str, options: WsTransportOptions) -> Result<Self, CdpError> {
        let url = WsUrl::parse(url)?;
        let mut stream = TcpStream::connect(url.authority())
            .await
            .map_err(|e| CdpError::ConnectionFailed(format!("{}: {e}", url.authority())))?;
        // Input commands are single small frames; never batch them.
        let _ = stream.set_nodelay(true);

        handshake::upgrade(&mut stream, &url).await?;
        info!("WebSocket transport connected");

        let (read, write) = stream.into_split();
        let pool = options.frame_writer.as_ref().map(|w| w.pool().clone());

        Ok(Self {
            url,
            writer: Arc::new(SocketWriter {
                stream: tokio::sync::Mutex::new(write),
                closed: AtomicBool::new(false),
            }),
            responses: Arc::new(BoundedQueue::new(RESPONSE_QUEUE_CAPACITY)),
            events: Arc::new(BoundedQueue::new(EVENT_QUEUE_CAPACITY)),
            pool,
            next_id: Arc::new(AtomicU32::new(1)),
            running: Arc::new(AtomicBool::new(false)),
            reader: parking_lot::Mutex::new(ReaderState::Idle {
                read,
                frame_writer: options.frame_writer,
            }),
            command_timeout: options.command_timeout,
            keepalive_interval: options.keepalive_interval,
        })
    }

    /// Spawn the reader task. Idempotent after the first call.
    pub fn start_reader(&self) {
        let mut state = self.reader.lock();
        let ReaderState::Idle { .. } = &*state else {
            return;
        };
        let ReaderState::Idle { read, frame_writer } =
            std::mem::replace(&mut *state, ReaderState::Closed)
        else {
            unreachable!()
        };

        self.running.store(true, Ordering::Release);
        let task = ReaderTask {
            writer: self.writer.clone(),
            responses: self.responses.clone(),
            events: self.events.clone(),
            next_id: self.next_id.clone(),
            running: self.running.clone(),
            keepalive_interval: self.keepalive_interval,
            frame_writer,
        };
        *state = ReaderState::Running(tokio::spawn(task.run(read)));
        debug!(url = %self.url, "WebSocket reader task started");
    }

    /// Send a command and wait for its correlated response payload.
    #[instrument(level = "debug", skip(self, params), fields(method = %method))]
    pub async fn send_command(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Bytes, CdpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = CdpRequest::encode(id, method, params, session_id)?;
        trace!(id, len = payload.len(), "Sending CDP command");
        self.writer
            .send_frame(&WsFrame::text(payload, mask_key()))
            .await?;

        let response = self
            .responses
            .take_where_timeout(self.command_timeout, |r| r.id == id)
            .await
            .ok_or_else(|| {
                warn!(id, method, "CDP command timed out");
                CdpError::Timeout(self.command_timeout)
            })?;

        if scan::is_error_response(&response.payload) {
            return Err(protocol_error(&response.payload));
        }
        Ok(response.payload)
    }

    /// Fire-and-forget send on the high-priority path. Errors are
    /// swallowed; this is safe to call during shutdown.
    #[instrument(level = "trace", skip(self, params), fields(method = %method))]
    pub async fn send_command_async(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let Ok(payload) = CdpRequest::encode(id, method, params, session_id) else {
            return;
        };
        let _ = self
            .writer
            .send_frame_priority(&WsFrame::text(payload, mask_key()))
            .await;
    }

    /// Pop the next queued event, if any.
    pub fn next_event(&self) -> Option<TransportEvent> {
        self.events.try_pop()
    }

    /// Acquire the latest screencast frame, when this transport owns a
    /// frame pool.
    pub fn latest_frame(&self) -> Option<crate::framepool::FrameRef<'_>> {
        self.pool.as_ref()?.acquire_latest_frame()
    }

    /// The frame pool attached to this transport, if any.
    pub fn frame_pool(&self) -> Option<&Arc<FramePool>> {
        self.pool.as_ref()
    }

    /// Whether the reader task is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// The URL this transport is connected to.
    pub fn url(&self) -> &WsUrl {
        &self.url
    }

    /// Tear the transport down: stop the reader, close the socket, drop
    /// queued messages. All teardown errors are swallowed.
    pub async fn close(&self) {
        self.running.store(false, Ordering::Release);
        self.writer.close().await;
        let state = std::mem::replace(&mut *self.reader.lock(), ReaderState::Closed);
        if let ReaderState::Running(handle) = state {
            handle.abort();
        }
        self.responses.clear();
        self.events.clear();
        debug!(url = %self.url, "WebSocket transport closed");
    }
}

/// Surface a CDP error payload as [`CdpError::Protocol`].
pub(crate) fn protocol_error(payload: &[u8]) -> CdpError {
    match crate::message::CdpResponse::from_payload(payload) {
        Ok(response) => match response.error {
            Some(error) => CdpError::Protocol {
                message: error.message,
            },
            None => CdpError::InvalidResponse("error probe without error object".to_string()),
        },
        Err(e) => e,
    }
}

/// State owned by the reader task.
struct ReaderTask {
    writer: Arc<SocketWriter>,
    responses: Arc<BoundedQueue<PendingResponse>>,
    events: Arc<BoundedQueue<TransportEvent>>,
    next_id: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    keepalive_interval: Duration,
    frame_writer: Option<FrameWriter>,
}

impl ReaderTask {
    async fn run(mut self, mut read: OwnedReadHalf) {
        debug!("WebSocket reader loop started");
        let mut buf: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut scratch: Vec<u8> = Vec::new();
        let mut last_rx = tokio::time::Instant::now();

        'outer: while self.running.load(Ordering::Acquire) {
            // Drain every complete frame already buffered.
            loop {
                match frame::decode(&buf) {
                    Ok(Some((ws_frame, consumed))) => {
                        buf.drain(..consumed);
                        last_rx = tokio::time::Instant::now();
                        match ws_frame.opcode {
                            OpCode::Text => self.handle_text(&ws_frame.payload, &mut scratch).await,
                            OpCode::Ping => {
                                let _ = self
                                    .writer
                                    .send_frame(&WsFrame::pong(ws_frame.payload, mask_key()))
                                    .await;
                            }
                            OpCode::Close => {
                                info!("WebSocket closed by remote");
                                break 'outer;
                            }
                            OpCode::Pong | OpCode::Binary => {}
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "Invalid WebSocket frame, ending read loop");
                        break 'outer;
                    }
                }
            }

            tokio::select! {
                result = read.read_buf(&mut buf) => match result {
                    Ok(0) => break 'outer,
                    Ok(_) => {}
                    Err(e) => {
                        // Resets and broken pipes are the normal shutdown
                        // shape, not failures.
                        let err = CdpError::from(e);
                        if !err.is_disconnect() {
                            warn!(error = %err, "WebSocket read error");
                        }
                        break 'outer;
                    }
                },
                () = tokio::time::sleep_until(last_rx + self.keepalive_interval) => {
                    trace!("Sending keepalive ping");
                    let _ = self
                        .writer
                        .send_frame(&WsFrame::ping(b"keepalive".to_vec(), mask_key()))
                        .await;
                    last_rx = tokio::time::Instant::now();
                }
            }
        }

        self.running.store(false, Ordering::Release);
        debug!("WebSocket reader loop ended");
    }

    async fn handle_text(&mut self, payload: &[u8], scratch: &mut Vec<u8>) {
        match scan::classify(payload) {
            scan::RawMessageKind::Response { id } => {
                trace!(id, len = payload.len(), "Queueing CDP response");
                self.responses.push(PendingResponse {
                    id,
                    payload: Bytes::copy_from_slice(payload),
                });
            }
            scan::RawMessageKind::Event { method } => {
                let method = &payload[method];
                match method {
                    b"Page.screencastFrame" if self.frame_writer.is_some() => {
                        self.handle_screencast(payload, scratch).await;
                    }
                    m if EVENTS_OF_INTEREST.iter().any(|e| e.as_bytes() == m) => {
                        let method = String::from_utf8_lossy(m).into_owned();
                        trace!(method = %method, "Queueing CDP event");
                        self.events.push(TransportEvent {
                            method,
                            payload: Bytes::copy_from_slice(payload),
                        });
                    }
                    _ => {}
                }
            }
            scan::RawMessageKind::Other => {}
        }
    }

    /// Decode a screencast frame into the pool and acknowledge it.
    ///
    /// The payload is scanned, never JSON-parsed: at tens of frames per
    /// second and hundreds of kilobytes per frame this is the hot path.
    async fn handle_screencast(&mut self, payload: &[u8], scratch: &mut Vec<u8>) {
        let Some(frame_writer) = self.frame_writer.as_mut() else {
            return;
        };
        let Some(range) = scan::data_range(payload) else {
            warn!("Screencast frame without data field");
            return;
        };
        let frame_sid = scan::frame_session_id(payload).unwrap_or(0);
        let routing = scan::routing_session_id(payload);
        let (width, height) = scan::metadata_device_dimensions(payload).unwrap_or((0, 0));

        let data = &payload[range];
        scratch.clear();
        scratch.resize(data.len() / 4 * 3 + 4, 0);
        let decoded = match BASE64.decode_slice(data, scratch) {
            Ok(n) => &scratch[..n],
            Err(e) => {
                warn!(error = %e, "Screencast frame with undecodable data");
                return;
            }
        };

        let outcome = frame_writer.write_frame(
            decoded,
            FrameMeta {
                frame_session_id: frame_sid,
                routing_session_id: routing.map(Arc::from),
                width,
                height,
            },
        );
        trace!(?outcome, frame_sid, width, height, "Screencast frame handled");

        // Ack immediately so Chromium releases the next frame; the pool
        // absorbs any renderer lag.
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(ack) = CdpRequest::encode(
            id,
            "Page.screencastFrameAck",
            Some(serde_json::json!({ "sessionId": frame_sid })),
            routing,
        ) {
            let _ = self.writer.send_frame(&WsFrame::text(ack, mask_key())).await;
        }
    }
}
