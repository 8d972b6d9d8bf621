//! Stateless mouse command formatters.
//!
//! Thin wrappers that turn already-mapped viewport coordinates into
//! `Input.dispatchMouseEvent` dispatches on the mouse channel. The bus
//! decides *when* to send; these decide *what* the wire JSON looks like.

use serde_json::Value;
use termweb_cdp::Channel;
use termweb_cdp::protocol::{DispatchMouseEventParams, MouseButton};

use crate::sink::CommandSink;

fn to_params(params: &DispatchMouseEventParams) -> Value {
    serde_json::to_value(params).unwrap_or(Value::Null)
}

/// Dispatch a `mouseMoved` with the given held-buttons bitmask.
pub async fn mouse_move<S: CommandSink>(sink: &S, x: f64, y: f64, buttons: u32) {
    let params = DispatchMouseEventParams::mouse_move(x, y, buttons);
    sink.send_async(Channel::Mouse, "Input.dispatchMouseEvent", to_params(&params))
        .await;
}

/// Dispatch a `mousePressed`.
pub async fn mouse_down<S: CommandSink>(
    sink: &S,
    x: f64,
    y: f64,
    button: MouseButton,
    buttons: u32,
    click_count: u32,
) {
    let params = DispatchMouseEventParams::mouse_down(x, y, button, buttons, click_count);
    sink.send_async(Channel::Mouse, "Input.dispatchMouseEvent", to_params(&params))
        .await;
}

/// Dispatch a `mouseReleased`.
pub async fn mouse_up<S: CommandSink>(
    sink: &S,
    x: f64,
    y: f64,
    button: MouseButton,
    buttons: u32,
    click_count: u32,
) {
    let params = DispatchMouseEventParams::mouse_up(x, y, button, buttons, click_count);
    sink.send_async(Channel::Mouse, "Input.dispatchMouseEvent", to_params(&params))
        .await;
}

/// Dispatch a `mouseWheel` around the given point.
pub async fn mouse_wheel<S: CommandSink>(sink: &S, x: f64, y: f64, delta_y: f64) {
    let params = DispatchMouseEventParams::mouse_wheel(x, y, 0.0, delta_y);
    sink.send_async(Channel::Mouse, "Input.dispatchMouseEvent", to_params(&params))
        .await;
}

#[cfg(test)]
mod tests;
