//! # Termweb CDP - Chrome DevTools Protocol transports
//!
//! Low-level Chrome DevTools Protocol (CDP) transport layer for the termweb
//! terminal browser. The browser core drives a headless Chromium instance
//! over two kinds of transport at once:
//!
//! - a NUL-delimited byte pipe ([`pipe::PipeTransport`]) dedicated to
//!   high-bandwidth screencast frames, and
//! - a set of WebSocket connections ([`ws::WsTransport`]) carrying
//!   low-latency input and navigation traffic.
//!
//! This crate handles:
//! - WebSocket handshake and RFC 6455 client framing (only what CDP needs)
//! - NUL-framed pipe CDP exchange over two file descriptors
//! - Request/response correlation by message id across independent channels
//! - The triple-buffered screencast [`FramePool`] shared with the renderer
//! - Endpoint discovery via Chromium's `/json/list` and `/json/version`
//! - The [`CdpClient`] facade multiplexing the pipe and up to five sockets
//!
//! ## Quick Start
//!
//! ```no_run
//! use termweb_cdp::{Channel, CdpClient, ClientOptions};
//!
//! # async fn example() -> Result<(), termweb_cdp::CdpError> {
//! // Connect to a Chromium started with --remote-debugging-port.
//! let client = CdpClient::init_from_port(9222, ClientOptions::default()).await?;
//!
//! // Navigate on the dedicated navigation socket.
//! client.navigate("https://example.com").await?;
//!
//! // Input commands ride their own sockets and never queue behind frames.
//! client
//!     .send_on_async(
//!         Channel::Mouse,
//!         "Input.dispatchMouseEvent",
//!         serde_json::json!({"type": "mouseMoved", "x": 10, "y": 10}),
//!     )
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Screencast flow control
//!
//! Chromium withholds the next screencast frame until the previous one is
//! acknowledged. In pipe mode the acknowledgement is *consumer-pull*: it is
//! sent when the renderer acquires the frame, so the frame rate adapts to
//! whatever the terminal can actually draw.
//!
//! ```no_run
//! # async fn example(client: &termweb_cdp::CdpClient) {
//! if let Some(frame) = client.acquire_latest_frame().await {
//!     // frame.payload() is the decoded image; generation detects skips.
//!     let _ = (frame.payload(), frame.generation());
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`client`] - the multiplexing facade and channel routing
//! - [`ws`] - WebSocket CDP transport (handshake, framing, keepalive)
//! - [`pipe`] - pipe CDP transport and screencast acknowledgement
//! - [`framepool`] - triple-buffered screencast frame arena
//! - [`message`] - CDP wire message types
//! - [`scan`] - hot-path byte scanning for large screencast payloads
//! - [`queue`] - bounded response/event queues
//! - [`discovery`] - HTTP target discovery
//! - [`protocol`] - typed CDP domain params and results
//! - [`error`] - error types

pub mod client;
pub mod discovery;
pub mod error;
pub mod framepool;
pub mod message;
pub mod pipe;
pub mod protocol;
pub mod queue;
pub mod scan;
pub mod ws;

pub use client::{CdpClient, Channel, ClientOptions};
pub use discovery::{discover_browser_ws_url, discover_page_target, PageTarget};
pub use error::CdpError;
pub use framepool::{FrameMeta, FramePool, FrameRef, FrameWriter, WriteOutcome};
pub use message::{CdpEvent, CdpRequest, CdpResponse, TransportEvent};
pub use pipe::{PipeTransport, PipeTransportOptions};
pub use queue::BoundedQueue;
pub use ws::{WsTransport, WsTransportOptions, WsUrl};
