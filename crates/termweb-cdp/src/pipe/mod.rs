//! Pipe CDP transport.
//!
//! Chromium launched with `--remote-debugging-pipe` exchanges CDP messages
//! as NUL-delimited UTF-8 JSON over two file descriptors (conventionally
//! fd 3 for commands into Chromium, fd 4 for messages out). Command,
//! response, and correlation semantics match the WebSocket transport; the
//! framing is just a `\0` terminator with no masking and no mutex
//! pressure.
//!
//! On platforms where WebSockets choke on screencast bandwidth the pipe is
//! dedicated to frames: the reader forwards only `Page.screencastFrame`
//! (plus main-frame navigation flags) to internal state and ignores every
//! other event, which is expected to arrive on the navigation WebSocket
//! instead.
//!
//! ## Acknowledgement policy: consumer-pull
//!
//! Chromium sends the next screencast frame only after the previous one is
//! acknowledged. This transport caches the newest
//! `{routing session, frame number}` pair and emits the ack when the
//! consumer acquires a frame ([`PipeTransport::ack_pending_frame`], called
//! by the client's acquire path). Chromium is thereby throttled to exactly
//! the renderer's pace with no queueing anywhere.

use std::os::fd::OwnedFd;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use bytes::Bytes;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::pipe;
use tracing::{debug, instrument, trace, warn};

use crate::error::CdpError;
use crate::framepool::{FrameMeta, FramePool, FrameWriter};
use crate::message::{CdpRequest, PendingResponse};
use crate::queue::{BoundedQueue, RESPONSE_QUEUE_CAPACITY};
use crate::scan;
use crate::ws::DEFAULT_COMMAND_TIMEOUT;

/// Options for a pipe transport.
#[derive(Debug)]
pub struct PipeTransportOptions {
    /// Timeout for blocking command round-trips.
    pub command_timeout: Duration,
    /// Frame pool writer; screencast frames land here.
    pub frame_writer: Option<FrameWriter>,
}

impl Default for PipeTransportOptions {
    fn default() -> Self {
        Self {
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            frame_writer: None,
        }
    }
}

impl PipeTransportOptions {
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

    /// Attach a frame pool writer for screencast handling.
    #[must_use]
    pub fn frame_writer(mut self, writer: FrameWriter) -> Self {
        self.frame_writer = Some(writer);
        self
    }
}

/// The cached acknowledgement for the newest frame Chromium sent us.
#[derive(Debug, Clone)]
struct PendingAck {
    frame_session_id: i64,
    routing_session_id: Option<Arc<str>>,
}

#[derive(Debug)]
struct PipeWriter {
    tx: tokio::sync::Mutex<pipe::Sender>,
    closed: AtomicBool,
}

impl PipeWriter {
    async fn send(&self, mut payload: Vec<u8>) -> Result<(), CdpError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CdpError::ConnectionClosed);
        }
        payload.push(0);
        let mut tx = self.tx.lock().await;
        tx.write_all(&payload).await?;
        Ok(())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

#[derive(Debug)]
enum ReaderState {
    Idle {
        rx: pipe::Receiver,
        frame_writer: Option<FrameWriter>,
    },
    Running(tokio::task::JoinHandle<()>),
    Closed,
}

/// Full-duplex CDP over Chromium's remote-debugging pipe.
#[derive(Debug)]
pub struct PipeTransport {
    writer: Arc<PipeWriter>,
    responses: Arc<BoundedQueue<PendingResponse>>,
    next_id: Arc<AtomicU32>,
    running: Arc<AtomicBool>,
    reader: parking_lot::Mutex<ReaderState>,
    pending_ack: Arc<parking_lot::Mutex<Option<PendingAck>>>,
    navigated: Arc<AtomicBool>,
    pool: Option<Arc<FramePool>>,
    command_timeout: Duration,
}

impl PipeTransport {
    /// Build a transport over an already-opened pipe pair.
    pub fn new(rx: pipe::Receiver, tx: pipe::Sender, options: PipeTransportOptions) -> Self {
        let pool = options.frame_writer.as_ref().map(|w| w.pool().clone());
        Self {
            writer: Arc::new(PipeWriter {
                tx: tokio::sync::Mutex::new(tx),
                closed: AtomicBool::new(false),
            }),
            responses: Arc::new(BoundedQueue::new(RESPONSE_QUEUE_CAPACITY)),
            next_id: Arc::new(AtomicU32::new(1)),
            running: Arc::new(AtomicBool::new(false)),
            reader: parking_lot::Mutex::new(ReaderState::Idle {
                rx,
                frame_writer: options.frame_writer,
            }),
            pending_ack: Arc::new(parking_lot::Mutex::new(None)),
            navigated: Arc::new(AtomicBool::new(false)),
            pool,
            command_timeout: options.command_timeout,
        }
    }

    /// Build a transport from the file descriptors inherited around a
    /// spawned Chromium (`read_fd` carries Chromium's output, `write_fd`
    /// our commands). Ownership of both fds transfers here; the per-fd
    /// close guard lives in [`OwnedFd`] itself.
    pub fn from_fds(
        read_fd: OwnedFd,
        write_fd: OwnedFd,
        options: PipeTransportOptions,
    ) -> Result<Self, CdpError> {
        let rx = pipe::Receiver::from_owned_fd(read_fd)?;
        let tx = pipe::Sender::from_owned_fd(write_fd)?;
        Ok(Self::new(rx, tx, options))
    }

    /// Spawn the reader task. Idempotent after the first call.
    pub fn start_reader(&self) {
        let mut state = self.reader.lock();
        let ReaderState::Idle { .. } = &*state else {
            return;
        };
        let ReaderState::Idle { rx, frame_writer } =
            std::mem::replace(&mut *state, ReaderState::Closed)
        else {
            unreachable!()
        };

        self.running.store(true, Ordering::Release);
        let task = ReaderTask {
            responses: self.responses.clone(),
            running: self.running.clone(),
            pending_ack: self.pending_ack.clone(),
            navigated: self.navigated.clone(),
            frame_writer,
        };
        *state = ReaderState::Running(tokio::spawn(task.run(rx)));
        debug!("Pipe reader task started");
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
        trace!(id, len = payload.len(), "Sending CDP command on pipe");
        self.writer.send(payload).await?;

        let response = self
            .responses
            .take_where_timeout(self.command_timeout, |r| r.id == id)
            .await
            .ok_or_else(|| {
                warn!(id, method, "Pipe command timed out");
                CdpError::Timeout(self.command_timeout)
            })?;

        if scan::is_error_response(&response.payload) {
            return Err(crate::ws::protocol_error(&response.payload));
        }
        Ok(response.payload)
    }

    /// Fire-and-forget send; errors are swallowed (safe during shutdown).
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
        let _ = self.writer.send(payload).await;
    }

    /// Emit the acknowledgement for the newest cached frame, if one is
    /// pending. Called by the client when the renderer acquires a frame;
    /// this is what lets Chromium send the next one.
    pub async fn ack_pending_frame(&self) {
        let pending = self.pending_ack.lock().take();
        let Some(ack) = pending else { return };
        trace!(frame_sid = ack.frame_session_id, "Acking screencast frame");
        self.send_command_async(
            "Page.screencastFrameAck",
            Some(serde_json::json!({ "sessionId": ack.frame_session_id })),
            ack.routing_session_id.as_deref(),
        )
        .await;
    }

    /// Whether a main-frame navigation was observed since the last call.
    pub fn take_navigation_flag(&self) -> bool {
        self.navigated.swap(false, Ordering::AcqRel)
    }

    /// The frame pool attached to this transport, if any.
    pub fn frame_pool(&self) -> Option<&Arc<FramePool>> {
        self.pool.as_ref()
    }

    /// Whether the reader task is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Tear the transport down. All teardown errors are swallowed.
    pub async fn close(&self) {
        self.running.store(false, Ordering::Release);
        self.writer.close().await;
        let state = std::mem::replace(&mut *self.reader.lock(), ReaderState::Closed);
        if let ReaderState::Running(handle) = state {
            handle.abort();
        }
        self.responses.clear();
        self.pending_ack.lock().take();
        debug!("Pipe transport closed");
    }
}

struct ReaderTask {
    responses: Arc<BoundedQueue<PendingResponse>>,
    running: Arc<AtomicBool>,
    pending_ack: Arc<parking_lot::Mutex<Option<PendingAck>>>,
    navigated: Arc<AtomicBool>,
    frame_writer: Option<FrameWriter>,
}

impl ReaderTask {
    async fn run(mut self, mut rx: pipe::Receiver) {
        debug!("Pipe reader loop started");
        // The buffer grows to hold whatever single message Chromium emits;
        // screencast frames routinely exceed half a megabyte.
        let mut buf: Vec<u8> = Vec::with_capacity(64 * 1024);
        let mut scratch: Vec<u8> = Vec::new();

        while self.running.load(Ordering::Acquire) {
            while let Some(nul) = buf.iter().position(|&b| b == 0) {
                {
                    let message = &buf[..nul];
                    if !message.is_empty() {
                        self.handle_message(message, &mut scratch);
                    }
                }
                buf.drain(..=nul);
            }

            match rx.read_buf(&mut buf).await {
                Ok(0) => break,
                Ok(_) => {}
                Err(e) => {
                    let err = CdpError::from(e);
                    if !err.is_disconnect() {
                        warn!(error = %err, "Pipe read error");
                    }
                    break;
                }
            }
        }

        self.running.store(false, Ordering::Release);
        debug!("Pipe reader loop ended");
    }

    fn handle_message(&mut self, message: &[u8], scratch: &mut Vec<u8>) {
        match scan::classify(message) {
            scan::RawMessageKind::Response { id } => {
                trace!(id, len = message.len(), "Queueing pipe response");
                self.responses.push(PendingResponse {
                    id,
                    payload: Bytes::copy_from_slice(message),
                });
            }
            scan::RawMessageKind::Event { method } => match &message[method] {
                b"Page.screencastFrame" => self.handle_screencast(message, scratch),
                b"Page.frameNavigated" | b"Page.navigatedWithinDocument" => {
                    self.navigated.store(true, Ordering::Release);
                }
                // The pipe is dedicated to screencast; everything else is
                // expected on the navigation WebSocket.
                _ => {}
            },
            scan::RawMessageKind::Other => {}
        }
    }

    fn handle_screencast(&mut self, message: &[u8], scratch: &mut Vec<u8>) {
        let Some(frame_writer) = self.frame_writer.as_mut() else {
            return;
        };
        let Some(range) = scan::data_range(message) else {
            warn!("Screencast frame without data field");
            return;
        };
        let frame_sid = scan::frame_session_id(message).unwrap_or(0);
        let routing: Option<Arc<str>> = scan::routing_session_id(message).map(Arc::from);
        let (width, height) = scan::metadata_device_dimensions(message).unwrap_or((0, 0));

        let data = &message[range];
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
                routing_session_id: routing.clone(),
                width,
                height,
            },
        );
        trace!(?outcome, frame_sid, "Screencast frame cached for consumer-pull ack");

        // Single-slot cache: a newer frame supersedes any unacked older
        // one, so the ack the consumer eventually triggers always names
        // the newest frame Chromium sent.
        *self.pending_ack.lock() = Some(PendingAck {
            frame_session_id: frame_sid,
            routing_session_id: routing,
        });
    }
}

#[cfg(test)]
mod tests;
