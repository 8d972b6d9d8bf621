//! Shared test support: a sink that records every dispatched command.

use parking_lot::Mutex;
use serde_json::Value;
use termweb_cdp::Channel;

use crate::sink::CommandSink;

/// One recorded dispatch.
#[derive(Debug, Clone)]
pub(crate) struct RecordedCommand {
    pub channel: Channel,
    pub method: String,
    pub params: Value,
}

/// A [`CommandSink`] that appends every dispatch to a list.
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    commands: Mutex<Vec<RecordedCommand>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All dispatches so far, in order.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        self.commands.lock().clone()
    }

    /// Drain the recorded dispatches.
    pub fn take(&self) -> Vec<RecordedCommand> {
        std::mem::take(&mut *self.commands.lock())
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }
}

impl CommandSink for RecordingSink {
    async fn send_async(&self, channel: Channel, method: &str, params: Value) {
        self.commands.lock().push(RecordedCommand {
            channel,
            method: method.to_string(),
            params,
        });
    }
}
