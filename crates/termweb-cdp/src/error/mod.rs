//! CDP error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during CDP communication.
#[derive(Error, Debug)]
pub enum CdpError {
    /// TCP or pipe connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The WebSocket upgrade was rejected or malformed.
    #[error("WebSocket handshake failed: {0}")]
    HandshakeFailed(String),

    /// A WebSocket frame violated the subset of RFC 6455 that CDP uses.
    #[error("invalid WebSocket frame: {0}")]
    InvalidFrame(String),

    /// The connection was closed during operation.
    #[error("connection closed")]
    ConnectionClosed,

    /// CDP returned an `"error"` object instead of a result.
    #[error("CDP protocol error: {message}")]
    Protocol {
        /// Error payload reported by the browser.
        message: String,
    },

    /// Malformed JSON or a missing field in an otherwise valid response.
    #[error("invalid CDP response: {0}")]
    InvalidResponse(String),

    /// No response with the expected id arrived in time.
    #[error("timed out waiting for response after {0:?}")]
    Timeout(Duration),

    /// Target discovery found no page target.
    #[error("no page target found")]
    NoPageTarget,

    /// Failed to parse a WebSocket URL.
    #[error("invalid WebSocket URL: {0}")]
    InvalidUrl(String),

    /// Operation requires a transport mode that is not active (tab
    /// switching is a pipe-mode capability).
    #[error("unsupported in this transport mode: {0}")]
    Unsupported(&'static str),

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CdpError {
    /// Whether this error is an expected consequence of the peer (or our own
    /// shutdown path) closing the connection. Reader tasks exit cleanly on
    /// these instead of logging them as failures.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::NotConnected
            ),
            _ => false,
        }
    }
}
