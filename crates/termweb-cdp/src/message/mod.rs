//! CDP message transport types.
//!
//! Wire shapes shared by the pipe and WebSocket transports. Outbound
//! requests are serialized with serde; inbound payloads are first routed
//! with [`crate::scan`] and only parsed into [`CdpResponse`] when a caller
//! actually wants the typed result.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CdpError;

/// A CDP request message.
#[derive(Debug, Clone, Serialize)]
pub struct CdpRequest {
    /// Per-transport monotonic id for matching responses.
    pub id: u32,
    /// CDP method name (e.g., "Page.navigate").
    pub method: String,
    /// Method parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Session ID for target-specific commands (pipe mode).
    #[serde(rename = "sessionId", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl CdpRequest {
    /// Build a request and serialize it to its wire form.
    pub fn encode(
        id: u32,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Vec<u8>, CdpError> {
        let request = Self {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(ToString::to_string),
        };
        Ok(serde_json::to_vec(&request)?)
    }
}

/// A CDP response message.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponse {
    /// Message ID matching the request.
    pub id: u32,
    /// Result on success.
    pub result: Option<Value>,
    /// Error on failure.
    pub error: Option<CdpResponseError>,
    /// Session ID if this was a session-specific response.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

impl CdpResponse {
    /// Parse a raw response payload.
    pub fn from_payload(payload: &[u8]) -> Result<Self, CdpError> {
        serde_json::from_slice(payload)
            .map_err(|e| CdpError::InvalidResponse(format!("malformed response: {e}")))
    }

    /// Convert into the result value, surfacing a CDP error object as
    /// [`CdpError::Protocol`].
    pub fn into_result(self) -> Result<Value, CdpError> {
        if let Some(error) = self.error {
            return Err(CdpError::Protocol {
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Error details in a CDP response.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpResponseError {
    /// Error code.
    pub code: i64,
    /// Error message.
    pub message: String,
    /// Additional error data.
    pub data: Option<String>,
}

/// A CDP event message, fully parsed.
#[derive(Debug, Clone, Deserialize)]
pub struct CdpEvent {
    /// Event method name (e.g., "Page.frameNavigated").
    pub method: String,
    /// Event parameters.
    pub params: Option<Value>,
    /// Session ID if this event came from a specific session.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// An event as it sits on a transport's event queue: the method name plus
/// the unparsed payload. Consumers that need the params parse on demand.
#[derive(Debug, Clone)]
pub struct TransportEvent {
    /// Event method name.
    pub method: String,
    /// Full payload bytes of the event message.
    pub payload: Bytes,
}

impl TransportEvent {
    /// Parse the payload into a typed [`CdpEvent`].
    pub fn parse(&self) -> Result<CdpEvent, CdpError> {
        serde_json::from_slice(&self.payload)
            .map_err(|e| CdpError::InvalidResponse(format!("malformed event: {e}")))
    }
}

/// A correlated response waiting on a transport's response queue.
#[derive(Debug, Clone)]
pub struct PendingResponse {
    /// The correlation id scanned out of the payload.
    pub id: u32,
    /// Full payload bytes of the response message.
    pub payload: Bytes,
}
