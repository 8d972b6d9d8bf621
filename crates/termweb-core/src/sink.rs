//! The seam between input dispatch and the transports.
//!
//! The bus and the key dispatcher format CDP commands; where those
//! commands go is behind this trait. Production wires it to
//! [`CdpClient`]; tests substitute a recording sink and assert on the
//! exact dispatch sequence.

use serde_json::Value;
use termweb_cdp::{CdpClient, Channel};

/// Fire-and-forget command output. Input dispatch never waits for
/// responses and never surfaces transport errors; a lost input event
/// during shutdown is not worth a user-visible failure.
pub trait CommandSink: Send + Sync {
    /// Send a command on the given channel, discarding errors.
    fn send_async(
        &self,
        channel: Channel,
        method: &str,
        params: Value,
    ) -> impl Future<Output = ()> + Send;
}

impl CommandSink for CdpClient {
    async fn send_async(&self, channel: Channel, method: &str, params: Value) {
        CdpClient::send_on_async(self, channel, method, params).await;
    }
}

impl<T: CommandSink + Sync> CommandSink for &T {
    async fn send_async(&self, channel: Channel, method: &str, params: Value) {
        (**self).send_async(channel, method, params).await;
    }
}

impl<T: CommandSink + Sync> CommandSink for std::sync::Arc<T> {
    async fn send_async(&self, channel: Channel, method: &str, params: Value) {
        (**self).send_async(channel, method, params).await;
    }
}
