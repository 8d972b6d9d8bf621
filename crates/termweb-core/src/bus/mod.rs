//! The mouse event bus.
//!
//! Single-threaded with respect to the renderer's event loop: the input
//! reader calls [`MouseEventBus::record`], the render loop calls
//! [`MouseEventBus::maybe_tick`] frequently, and an internal
//! monotonic-clock gate fires the actual tick at ~66 ms - the screencast
//! cadence, so coalesced events land at most one frame late.
//!
//! Priority policy:
//!
//! 1. presses and releases dispatch immediately inside `record`, never
//!    queued - a click the user felt must not wait for a tick;
//! 2. wheel ticks overwrite a single pending slot, flushed on the tick;
//! 3. moves and drags overwrite a single pending slot, flushed on the
//!    tick, and a move to the pixel already dispatched is skipped.
//!
//! Every press is preceded by a `mouseMoved` with `buttons=0` at the same
//! coordinates. Complex SPA frameworks arm their CSS `:hover` and JS
//! `mouseenter` handlers from that move; without it the subsequent click
//! hits an element that never saw the pointer arrive.

use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

use crate::coords::CoordinateMapper;
use crate::dispatch;
use crate::event::{MouseButton, ScrollAmount, TermInputEvent, WheelEvent};
use crate::sink::CommandSink;

/// Wheel delta for a line-sized scroll step, in CSS pixels.
const LINE_SCROLL_DELTA: f64 = 20.0;

/// Margin kept when scrolling a whole page, so context lines survive.
const PAGE_SCROLL_MARGIN: f64 = 40.0;

/// Configuration for the bus.
#[derive(Debug, Clone, Copy)]
pub struct MouseBusConfig {
    /// Invert wheel direction (macOS-style natural scrolling).
    pub natural_scroll: bool,
    /// Minimum interval between coalesced flushes.
    pub tick_interval: Duration,
    /// Maximum gap between presses of a multi-click.
    pub double_click_window: Duration,
    /// Maximum distance between presses of a multi-click, in pixels.
    pub double_click_radius: f64,
}

impl Default for MouseBusConfig {
    fn default() -> Self {
        Self {
            natural_scroll: false,
            tick_interval: Duration::from_millis(66),
            double_click_window: Duration::from_millis(1000),
            double_click_radius: 15.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingWheel {
    x: f64,
    y: f64,
    delta_y: f64,
}

#[derive(Debug, Clone, Copy)]
struct PendingMove {
    x: f64,
    y: f64,
    buttons: u32,
}

/// Multi-click state: consecutive presses of the same button within the
/// time window and pixel radius escalate the count (capped at triple).
#[derive(Debug)]
struct ClickTracker {
    last_press: Option<Instant>,
    x: f64,
    y: f64,
    button: MouseButton,
    count: u32,
}

impl ClickTracker {
    fn new() -> Self {
        Self {
            last_press: None,
            x: 0.0,
            y: 0.0,
            button: MouseButton::None,
            count: 1,
        }
    }

    fn press(
        &mut self,
        now: Instant,
        x: f64,
        y: f64,
        button: MouseButton,
        window: Duration,
        radius: f64,
    ) -> u32 {
        let chained = self.last_press.is_some_and(|t| {
            now.duration_since(t) <= window
                && button == self.button
                && (x - self.x).hypot(y - self.y) <= radius
        });
        self.count = if chained { (self.count + 1).min(3) } else { 1 };
        self.last_press = Some(now);
        self.x = x;
        self.y = y;
        self.button = button;
        self.count
    }

    /// The release carries the count its press established.
    fn release_count(&self) -> u32 {
        self.count
    }
}

/// Priority-aware tick-scheduled mouse dispatcher.
#[derive(Debug)]
pub struct MouseEventBus<S> {
    sink: S,
    mapper: CoordinateMapper,
    config: MouseBusConfig,
    pending_wheel: Option<PendingWheel>,
    pending_move: Option<PendingMove>,
    last_dispatched_move: Option<(f64, f64)>,
    clicks: ClickTracker,
    last_tick: Option<Instant>,
}

impl<S: CommandSink> MouseEventBus<S> {
    /// Create a bus dispatching into `sink` with the given geometry.
    pub fn new(sink: S, mapper: CoordinateMapper, config: MouseBusConfig) -> Self {
        Self {
            sink,
            mapper,
            config,
            pending_wheel: None,
            pending_move: None,
            last_dispatched_move: None,
            clicks: ClickTracker::new(),
            last_tick: None,
        }
    }

    /// Replace the coordinate mapper after a resize.
    pub fn set_mapper(&mut self, mapper: CoordinateMapper) {
        self.mapper = mapper;
        // The dispatched-pixel dedup is meaningless across a resize.
        self.last_dispatched_move = None;
    }

    /// Record a terminal mouse event. Presses and releases dispatch
    /// before this returns; wheel and movement wait for the next tick.
    pub async fn record(
        &mut self,
        event: TermInputEvent,
        term_x: f64,
        term_y: f64,
        viewport_w: f64,
        viewport_h: f64,
    ) {
        match event {
            TermInputEvent::Click(click) => {
                let Some((x, y)) = self.mapper.terminal_to_browser(term_x, term_y) else {
                    return;
                };
                if click.is_press {
                    self.dispatch_press(x, y, click.button, click.buttons_state).await;
                } else {
                    self.dispatch_release(x, y, click.button, click.buttons_state).await;
                }
            }
            TermInputEvent::Wheel(wheel) => {
                self.pending_wheel = Some(PendingWheel {
                    x: viewport_w / 2.0,
                    y: viewport_h / 2.0,
                    delta_y: self.wheel_delta(wheel, viewport_h),
                });
            }
            TermInputEvent::Move(movement) => {
                let Some((x, y)) = self.mapper.terminal_to_browser(term_x, term_y) else {
                    return;
                };
                self.pending_move = Some(PendingMove {
                    x,
                    y,
                    buttons: movement.buttons_state,
                });
            }
        }
    }

    /// Fire the tick when the gate interval has elapsed. Call this from
    /// the render loop; it returns immediately when there is nothing to
    /// do.
    pub async fn maybe_tick(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last_tick {
            if now.duration_since(last) < self.config.tick_interval {
                return;
            }
        }
        self.last_tick = Some(now);
        self.tick().await;
    }

    async fn tick(&mut self) {
        if let Some(wheel) = self.pending_wheel.take() {
            trace!(delta_y = wheel.delta_y, "Flushing coalesced wheel");
            dispatch::mouse_wheel(&self.sink, wheel.x, wheel.y, wheel.delta_y).await;
        }
        if let Some(movement) = self.pending_move.take() {
            self.dispatch_move(movement).await;
        }
    }

    async fn dispatch_press(&mut self, x: f64, y: f64, button: MouseButton, buttons: u32) {
        let count = self.clicks.press(
            Instant::now(),
            x,
            y,
            button,
            self.config.double_click_window,
            self.config.double_click_radius,
        );
        trace!(x, y, ?button, count, "Dispatching press");

        // Arm hover/mouseenter handlers, then report the pointer with the
        // button already held, then press.
        dispatch::mouse_move(&self.sink, x, y, 0).await;
        dispatch::mouse_move(&self.sink, x, y, buttons).await;
        dispatch::mouse_down(&self.sink, x, y, button, buttons, count).await;
        self.last_dispatched_move = Some((x, y));
        self.pending_move = None;
    }

    async fn dispatch_release(&mut self, x: f64, y: f64, button: MouseButton, buttons: u32) {
        let count = self.clicks.release_count();
        trace!(x, y, ?button, count, "Dispatching release");
        dispatch::mouse_up(&self.sink, x, y, button, buttons, count).await;
    }

    async fn dispatch_move(&mut self, movement: PendingMove) {
        // A move to the already-reported pixel carries no information.
        if self.last_dispatched_move == Some((movement.x, movement.y)) {
            return;
        }
        dispatch::mouse_move(&self.sink, movement.x, movement.y, movement.buttons).await;
        self.last_dispatched_move = Some((movement.x, movement.y));
    }

    fn wheel_delta(&self, wheel: WheelEvent, viewport_h: f64) -> f64 {
        let magnitude = match wheel.amount {
            ScrollAmount::Line => LINE_SCROLL_DELTA,
            ScrollAmount::Page => (viewport_h - PAGE_SCROLL_MARGIN).max(LINE_SCROLL_DELTA),
        };
        // Scrolling up means negative deltaY; natural scrolling inverts.
        let mut delta = if wheel.up { -magnitude } else { magnitude };
        if self.config.natural_scroll {
            delta = -delta;
        }
        delta
    }
}
