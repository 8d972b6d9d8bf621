//! CDP endpoint discovery via HTTP.
//!
//! Chromium exposes a JSON API next to the debugger port: `/json/list`
//! enumerates debuggable targets with their WebSocket URLs, and
//! `/json/version` reports the browser-level WebSocket URL. These are the
//! only payloads the core runs a full JSON parser over; everything on the
//! transports goes through [`crate::scan`].

use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::error::CdpError;

/// Interval between discovery retries while Chromium is still starting.
const RETRY_INTERVAL: Duration = Duration::from_millis(200);

/// Total time to keep retrying before giving up on the browser.
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(10);

/// One entry of the `/json/list` response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageTarget {
    /// Target identifier.
    pub id: String,
    /// Target type ("page", "iframe", "service_worker", ...).
    #[serde(rename = "type")]
    pub target_type: String,
    /// Target title.
    #[serde(default)]
    pub title: String,
    /// Target URL.
    #[serde(default)]
    pub url: String,
    /// The WebSocket URL for attaching to this target.
    #[serde(rename = "webSocketDebuggerUrl")]
    pub web_socket_debugger_url: Option<String>,
}

/// Response from the `/json/version` endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrowserVersion {
    /// The WebSocket URL for the browser-level CDP connection.
    #[serde(rename = "webSocketDebuggerUrl")]
    web_socket_debugger_url: Option<String>,
}

/// Discover the first page target on a debugging port.
///
/// Retries every 200 ms for up to 10 s: the browser process answers the
/// HTTP endpoint noticeably later than it binds the port.
#[instrument(level = "info")]
pub async fn discover_page_target(port: u16) -> Result<PageTarget, CdpError> {
    let endpoint = format!("http://127.0.0.1:{port}/json/list");
    let client = http_client()?;
    let deadline = tokio::time::Instant::now() + DISCOVERY_TIMEOUT;

    loop {
        match fetch_page_target(&client, &endpoint).await {
            Ok(Some(target)) => {
                info!(target_id = %target.id, url = %target.url, "Discovered page target");
                return Ok(target);
            }
            Ok(None) => debug!("No page target yet"),
            Err(e) => debug!(error = %e, "Discovery attempt failed"),
        }
        if tokio::time::Instant::now() + RETRY_INTERVAL > deadline {
            return Err(CdpError::NoPageTarget);
        }
        tokio::time::sleep(RETRY_INTERVAL).await;
    }
}

async fn fetch_page_target(
    client: &reqwest::Client,
    endpoint: &str,
) -> Result<Option<PageTarget>, CdpError> {
    let targets: Vec<PageTarget> = client
        .get(endpoint)
        .send()
        .await
        .map_err(|e| CdpError::ConnectionFailed(e.to_string()))?
        .json()
        .await
        .map_err(|e| CdpError::InvalidResponse(format!("malformed /json/list: {e}")))?;

    Ok(targets.into_iter().find(|t| t.target_type == "page"))
}

/// Discover the browser-level WebSocket URL from `/json/version`.
#[instrument(level = "info")]
pub async fn discover_browser_ws_url(port: u16) -> Result<String, CdpError> {
    let endpoint = format!("http://127.0.0.1:{port}/json/version");
    let client = http_client()?;

    let version: BrowserVersion = client
        .get(&endpoint)
        .send()
        .await
        .map_err(|e| CdpError::ConnectionFailed(e.to_string()))?
        .json()
        .await
        .map_err(|e| CdpError::InvalidResponse(format!("malformed /json/version: {e}")))?;

    let ws_url = version.web_socket_debugger_url.ok_or_else(|| {
        CdpError::InvalidResponse("/json/version missing webSocketDebuggerUrl".to_string())
    })?;

    // Chromium reports a well-formed URL here, but this one came over HTTP
    // from a port number the user typed; validate before dialing it.
    Url::parse(&ws_url).map_err(|e| CdpError::InvalidUrl(format!("{ws_url}: {e}")))?;

    info!(ws_url = %ws_url, "Discovered browser WebSocket URL");
    Ok(ws_url)
}

fn http_client() -> Result<reqwest::Client, CdpError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| CdpError::ConnectionFailed(e.to_string()))
}

#[cfg(test)]
mod tests;
