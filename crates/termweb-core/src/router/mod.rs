//! CDP event demultiplexing.
//!
//! The transports deliver a single interleaved stream of whitelisted
//! events; their consumers are separate (the status line wants downloads,
//! the dialog overlay wants dialogs, the tab bar wants targets). The
//! router fans the stream out into per-category bounded queues that each
//! consumer polls at its own cadence.
//!
//! Per-source FIFO order survives the fan-out; ordering across categories
//! or across transports is not defined, and consumers must tolerate
//! interleaving.

use termweb_cdp::message::TransportEvent;
use termweb_cdp::queue::{BoundedQueue, EVENT_QUEUE_CAPACITY};
use termweb_cdp::CdpClient;
use tracing::trace;

/// Consumer-facing event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    /// Frame navigations, same-document navigations.
    Navigation,
    /// Download lifecycle.
    Download,
    /// Console output.
    Console,
    /// JavaScript dialogs.
    Dialog,
    /// Intercepted file choosers.
    FileChooser,
    /// Target creation and changes (tabs).
    Target,
}

/// Classify an event method into its category.
pub fn categorize(method: &str) -> Option<EventCategory> {
    Some(match method {
        "Page.frameNavigated" | "Page.navigatedWithinDocument" => EventCategory::Navigation,
        "Browser.downloadWillBegin" | "Browser.downloadProgress" => EventCategory::Download,
        "Runtime.consoleAPICalled" => EventCategory::Console,
        "Page.javascriptDialogOpening" => EventCategory::Dialog,
        "Page.fileChooserOpened" => EventCategory::FileChooser,
        "Target.targetCreated" | "Target.targetInfoChanged" => EventCategory::Target,
        _ => return None,
    })
}

/// Demultiplexes the client's event stream into per-category queues.
#[derive(Debug)]
pub struct EventRouter {
    navigation: BoundedQueue<TransportEvent>,
    download: BoundedQueue<TransportEvent>,
    console: BoundedQueue<TransportEvent>,
    dialog: BoundedQueue<TransportEvent>,
    file_chooser: BoundedQueue<TransportEvent>,
    target: BoundedQueue<TransportEvent>,
}

impl Default for EventRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl EventRouter {
    /// Create a router with empty queues.
    pub fn new() -> Self {
        Self {
            navigation: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
            download: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
            console: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
            dialog: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
            file_chooser: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
            target: BoundedQueue::new(EVENT_QUEUE_CAPACITY),
        }
    }

    /// Route one event to its category queue. Unknown methods are
    /// dropped; the transports already whitelist, so this only happens
    /// when the whitelist and the router disagree.
    pub fn route(&self, event: TransportEvent) -> bool {
        let Some(category) = categorize(&event.method) else {
            trace!(method = %event.method, "Dropping uncategorised event");
            return false;
        };
        self.queue(category).push(event);
        true
    }

    /// Drain every queued event from the client into the category queues.
    /// Called from the renderer loop alongside frame acquisition.
    pub fn pump(&self, client: &CdpClient) -> usize {
        let mut routed = 0;
        while let Some(event) = client.next_event() {
            if self.route(event) {
                routed += 1;
            }
        }
        routed
    }

    /// Pop the oldest event of a category.
    pub fn poll(&self, category: EventCategory) -> Option<TransportEvent> {
        self.queue(category).try_pop()
    }

    /// Number of events waiting in a category.
    pub fn pending(&self, category: EventCategory) -> usize {
        self.queue(category).len()
    }

    fn queue(&self, category: EventCategory) -> &BoundedQueue<TransportEvent> {
        match category {
            EventCategory::Navigation => &self.navigation,
            EventCategory::Download => &self.download,
            EventCategory::Console => &self.console,
            EventCategory::Dialog => &self.dialog,
            EventCategory::FileChooser => &self.file_chooser,
            EventCategory::Target => &self.target,
        }
    }
}
