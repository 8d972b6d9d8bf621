//! Terminal input event taxonomy.
//!
//! What the terminal input reader hands to the bus: button transitions,
//! wheel ticks, and movement, all in terminal coordinates. Key events
//! live in [`crate::keys`]; they bypass the bus entirely.

pub use termweb_cdp::protocol::MouseButton;

/// A button press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickEvent {
    /// The button that changed state.
    pub button: MouseButton,
    /// True for press, false for release.
    pub is_press: bool,
    /// Bitmask of buttons held after this event (left=1, right=2,
    /// middle=4).
    pub buttons_state: u32,
}

/// How far one wheel tick scrolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAmount {
    /// A line-sized step.
    Line,
    /// A viewport-sized step (shift-wheel, page up/down emulation).
    Page,
}

/// A wheel tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WheelEvent {
    /// True when the content should move toward the top of the document.
    pub up: bool,
    /// Step size.
    pub amount: ScrollAmount,
}

/// A movement or drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveEvent {
    /// Bitmask of buttons held during the move.
    pub buttons_state: u32,
}

/// Any terminal mouse event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermInputEvent {
    /// Press or release.
    Click(ClickEvent),
    /// Wheel tick.
    Wheel(WheelEvent),
    /// Movement or drag.
    Move(MoveEvent),
}
