//! WebSocket URL handling.
//!
//! Chromium's debugger URLs are always of the form
//! `ws://host:port/devtools/...`; this is the only shape the transport
//! accepts, and formatting a parsed URL reproduces the input exactly.

use std::fmt;
use std::str::FromStr;

use crate::error::CdpError;

/// A parsed `ws://host:port/path` URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WsUrl {
    /// Host name or address.
    pub host: String,
    /// TCP port.
    pub port: u16,
    /// Absolute path, leading slash included.
    pub path: String,
}

impl WsUrl {
    /// Parse a `ws://host:port/path` URL.
    pub fn parse(input: &str) -> Result<Self, CdpError> {
        let rest = input
            .strip_prefix("ws://")
            .ok_or_else(|| CdpError::InvalidUrl(format!("expected ws:// scheme: {input}")))?;

        let (authority, path) = match rest.find('/') {
            Some(slash) => (&rest[..slash], &rest[slash..]),
            None => (rest, "/"),
        };

        let (host, port) = authority
            .split_once(':')
            .ok_or_else(|| CdpError::InvalidUrl(format!("missing port: {input}")))?;
        if host.is_empty() {
            return Err(CdpError::InvalidUrl(format!("missing host: {input}")));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| CdpError::InvalidUrl(format!("invalid port: {input}")))?;

        Ok(Self {
            host: host.to_string(),
            port,
            path: path.to_string(),
        })
    }

    /// The `host:port` authority used for the TCP connect and Host header.
    pub fn authority(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for WsUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ws://{}:{}{}", self.host, self.port, self.path)
    }
}

impl FromStr for WsUrl {
    type Err = CdpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
