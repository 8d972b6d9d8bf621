//! Input domain types.
//!
//! Mouse and key event dispatch. Termweb never simulates touch; the
//! terminal only produces mouse and keyboard input.

use serde::Serialize;

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    /// No button (plain movement).
    #[default]
    None,
    /// Left button.
    Left,
    /// Middle button.
    Middle,
    /// Right button.
    Right,
}

impl MouseButton {
    /// Bit in the CDP `buttons` bitmask: left=1, right=2, middle=4.
    pub fn bit(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 4,
        }
    }
}

/// Mouse event type for Input.dispatchMouseEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseEventType {
    /// Button press.
    MousePressed,
    /// Button release.
    MouseReleased,
    /// Movement or drag.
    MouseMoved,
    /// Wheel scroll.
    MouseWheel,
}

/// Parameters for Input.dispatchMouseEvent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMouseEventParams {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: MouseEventType,
    /// X coordinate in CSS pixels relative to the viewport.
    pub x: f64,
    /// Y coordinate in CSS pixels relative to the viewport.
    pub y: f64,
    /// Button that changed state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<MouseButton>,
    /// Bitmask of buttons currently held (left=1, right=2, middle=4).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<u32>,
    /// Click count for press/release (1 click, 2 double, 3 triple).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub click_count: Option<u32>,
    /// Horizontal wheel delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_x: Option<f64>,
    /// Vertical wheel delta.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_y: Option<f64>,
    /// Modifier bitmask (Alt=1, Ctrl=2, Meta=4, Shift=8).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
}

impl DispatchMouseEventParams {
    /// A movement event carrying the current button bitmask.
    pub fn mouse_move(x: f64, y: f64, buttons: u32) -> Self {
        Self {
            event_type: MouseEventType::MouseMoved,
            x,
            y,
            button: None,
            buttons: Some(buttons),
            click_count: None,
            delta_x: None,
            delta_y: None,
            modifiers: None,
        }
    }

    /// A button press.
    pub fn mouse_down(x: f64, y: f64, button: MouseButton, buttons: u32, click_count: u32) -> Self {
        Self {
            event_type: MouseEventType::MousePressed,
            x,
            y,
            button: Some(button),
            buttons: Some(buttons),
            click_count: Some(click_count),
            delta_x: None,
            delta_y: None,
            modifiers: None,
        }
    }

    /// A button release.
    pub fn mouse_up(x: f64, y: f64, button: MouseButton, buttons: u32, click_count: u32) -> Self {
        Self {
            event_type: MouseEventType::MouseReleased,
            x,
            y,
            button: Some(button),
            buttons: Some(buttons),
            click_count: Some(click_count),
            delta_x: None,
            delta_y: None,
            modifiers: None,
        }
    }

    /// A wheel event around the given point.
    pub fn mouse_wheel(x: f64, y: f64, delta_x: f64, delta_y: f64) -> Self {
        Self {
            event_type: MouseEventType::MouseWheel,
            x,
            y,
            button: None,
            buttons: None,
            click_count: None,
            delta_x: Some(delta_x),
            delta_y: Some(delta_y),
            modifiers: None,
        }
    }
}

/// Key event type for Input.dispatchKeyEvent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyEventType {
    /// Key press.
    KeyDown,
    /// Key release.
    KeyUp,
    /// Character generation without a physical key transition.
    Char,
}

/// Parameters for Input.dispatchKeyEvent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchKeyEventParams {
    /// Event type.
    #[serde(rename = "type")]
    pub event_type: KeyEventType,
    /// Modifier bitmask (Alt=1, Ctrl=2, Meta=4, Shift=8).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modifiers: Option<u32>,
    /// Generated text. Omitted for shortcut dispatch so the browser treats
    /// the event as a command, not input.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Text without modifiers applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unmodified_text: Option<String>,
    /// DOM key value (e.g., "a", "Enter", "ArrowLeft").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Physical key code (e.g., "KeyA", "Enter").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Windows virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub windows_virtual_key_code: Option<u32>,
    /// Native virtual key code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub native_virtual_key_code: Option<u32>,
}

/// Parameters for Input.insertText.
#[derive(Debug, Clone, Serialize)]
pub struct InsertTextParams {
    /// Text inserted at the current caret position.
    pub text: String,
}
