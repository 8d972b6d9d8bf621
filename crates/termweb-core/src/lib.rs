//! # Termweb Core - input dispatch and event routing
//!
//! The layer between the terminal and the CDP transports: translates
//! terminal mouse/keyboard events into CDP command sequences under a
//! fixed-rate scheduling discipline, and demultiplexes the CDP event
//! stream to its consumers.
//!
//! - [`coords`] - pure terminal-to-viewport coordinate mapping
//! - [`event`] - the terminal input event taxonomy
//! - [`bus`] - the priority-aware mouse event bus (clicks immediate,
//!   wheel and movement coalesced per ~66 ms tick, double-click detection)
//! - [`keys`] - platform-normalised key events and the key registry
//! - [`dispatch`] - stateless formatters for `Input.*` commands
//! - [`router`] - per-category event queues fed from the client
//! - [`sink`] - the [`CommandSink`] seam between input dispatch and the
//!   transports
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use termweb_core::bus::{MouseBusConfig, MouseEventBus};
//! use termweb_core::coords::{CoordinateMapper, MapperConfig};
//! use termweb_core::event::{ClickEvent, MouseButton, TermInputEvent};
//!
//! # async fn example(client: Arc<termweb_cdp::CdpClient>) {
//! let mapper = CoordinateMapper::new(MapperConfig {
//!     term_px: (1280, 480),
//!     term_cells: (80, 24),
//!     toolbar_px: 20,
//!     pixel_mode: true,
//!     frame: (1280, 460),
//!     viewport: (1280, 720),
//! });
//! let mut bus = MouseEventBus::new(client, mapper, MouseBusConfig::default());
//!
//! // A press dispatches immediately, preceded by its arming move.
//! let press = TermInputEvent::Click(ClickEvent {
//!     button: MouseButton::Left,
//!     is_press: true,
//!     buttons_state: 1,
//! });
//! bus.record(press, 640.0, 260.0, 1280.0, 720.0).await;
//!
//! // The renderer loop calls this often; movement flushes on the tick.
//! bus.maybe_tick().await;
//! # }
//! ```

pub mod bus;
pub mod coords;
pub mod dispatch;
pub mod event;
pub mod keys;
pub mod router;
pub mod sink;

pub use bus::{MouseBusConfig, MouseEventBus};
pub use coords::{CoordinateMapper, MapperConfig};
pub use event::{ClickEvent, MoveEvent, ScrollAmount, TermInputEvent, WheelEvent};
pub use keys::{BaseKey, NormalizedKeyEvent, Platform, RawKeyInput};
pub use router::{EventCategory, EventRouter};
pub use sink::CommandSink;

#[cfg(test)]
pub(crate) mod testing;
