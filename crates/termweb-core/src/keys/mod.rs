//! Key normalisation and dispatch.
//!
//! Terminal key input arrives with TTY quirks (macOS delivers Cmd+X as a
//! control character) and leaves as one of four CDP shapes:
//!
//! - plain printable characters become `Input.insertText` - a single
//!   round-trip that sidesteps virtual-key mapping in text editors,
//! - printables with the shortcut modifier become keyDown/keyUp pairs
//!   *without* a text field, so the browser treats them as commands,
//! - named keys (arrows, Escape, Enter, ...) become keyDown/keyUp by
//!   name, with a `char` event in between when the key generates text,
//! - multi-line pastes become a synthetic DOM `ClipboardEvent` so code
//!   editors do not auto-indent every pasted line.

pub mod registry;

use serde_json::Value;
use termweb_cdp::Channel;
use termweb_cdp::protocol::{DispatchKeyEventParams, InsertTextParams, KeyEventType};
use tracing::debug;

use crate::sink::CommandSink;

pub use registry::{KeyDefinition, named_key};

/// The key a terminal event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseKey {
    /// A printable character.
    Char(char),
    /// A named key ("Enter", "ArrowLeft", "F5", ...).
    Named(&'static str),
}

/// A key event as the terminal reader decodes it, before platform
/// normalisation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawKeyInput {
    /// The base key.
    pub key: BaseKey,
    /// Shift held.
    pub shift: bool,
    /// Control held (or synthesised by the TTY for Cmd on macOS).
    pub ctrl: bool,
    /// Alt/Option held.
    pub alt: bool,
    /// Meta/Cmd held, when the terminal reports it directly.
    pub meta: bool,
}

/// Host platform, which decides what the shortcut modifier is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// Shortcuts use Cmd; the TTY folds Cmd into control characters.
    MacOs,
    /// Shortcuts use Ctrl.
    Linux,
}

impl Platform {
    /// The platform this process runs on.
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

/// A platform-normalised key event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedKeyEvent {
    /// The base key.
    pub key: BaseKey,
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub ctrl: bool,
    /// Alt/Option held.
    pub alt: bool,
    /// Meta/Cmd held.
    pub meta: bool,
    /// The OS-conventional application shortcut modifier is held (Cmd on
    /// macOS, Ctrl elsewhere).
    pub shortcut: bool,
}

impl NormalizedKeyEvent {
    /// CDP modifier bitmask: Alt=1, Ctrl=2, Meta=4, Shift=8.
    pub fn cdp_modifiers(&self) -> u32 {
        let mut modifiers = 0;
        if self.alt {
            modifiers |= 1;
        }
        if self.ctrl {
            modifiers |= 2;
        }
        if self.meta {
            modifiers |= 4;
        }
        if self.shift {
            modifiers |= 8;
        }
        modifiers
    }
}

/// Normalise a raw terminal key event for the host platform.
///
/// On macOS the TTY has no way to report Cmd, so Cmd+X arrives as the
/// control character for X; it is re-synthesised here as Meta so the
/// browser receives the shortcut the user actually typed.
pub fn normalize(raw: RawKeyInput, platform: Platform) -> NormalizedKeyEvent {
    match platform {
        Platform::MacOs => {
            if raw.ctrl && matches!(raw.key, BaseKey::Char(_)) {
                return NormalizedKeyEvent {
                    key: raw.key,
                    shift: raw.shift,
                    ctrl: false,
                    alt: raw.alt,
                    meta: true,
                    shortcut: true,
                };
            }
            NormalizedKeyEvent {
                shortcut: raw.meta,
                key: raw.key,
                shift: raw.shift,
                ctrl: raw.ctrl,
                alt: raw.alt,
                meta: raw.meta,
            }
        }
        Platform::Linux => NormalizedKeyEvent {
            shortcut: raw.ctrl,
            key: raw.key,
            shift: raw.shift,
            ctrl: raw.ctrl,
            alt: raw.alt,
            meta: raw.meta,
        },
    }
}

/// Dispatch one normalised key event to the browser.
///
/// Only the OS-normalised shortcut flag selects the no-text keyDown/keyUp
/// path. Alt and Meta compose characters (Option dead keys on macOS,
/// AltGr on Linux); a printable that arrives with them still held is
/// input, and routing it as a shortcut would drop it.
pub async fn dispatch_key<S: CommandSink>(sink: &S, event: &NormalizedKeyEvent) {
    match &event.key {
        BaseKey::Char(c) => {
            if event.shortcut {
                dispatch_char_shortcut(sink, *c, event).await;
            } else {
                insert_text(sink, &c.to_string()).await;
            }
        }
        BaseKey::Named(name) => dispatch_named(sink, name, event).await,
    }
}

/// Insert text at the caret without synthesising key events.
pub async fn insert_text<S: CommandSink>(sink: &S, text: &str) {
    let params = InsertTextParams {
        text: text.to_string(),
    };
    sink.send_async(
        Channel::Keyboard,
        "Input.insertText",
        serde_json::to_value(params).unwrap_or(Value::Null),
    )
    .await;
}

/// Paste text. Multi-line content goes through a synthetic DOM
/// `ClipboardEvent` so editors treat it as a paste instead of a stream of
/// auto-indented keystrokes; single lines take the cheap insertText path.
pub async fn dispatch_paste<S: CommandSink>(sink: &S, text: &str) {
    if !text.contains('\n') {
        insert_text(sink, text).await;
        return;
    }
    // serde_json::to_string produces a valid JS string literal for the
    // payload, escaping quotes and newlines.
    let Ok(literal) = serde_json::to_string(text) else {
        return;
    };
    let expression = format!(
        "(() => {{ const dt = new DataTransfer(); dt.setData('text/plain', {literal}); \
         const ev = new ClipboardEvent('paste', {{clipboardData: dt, bubbles: true, cancelable: true}}); \
         (document.activeElement || document.body).dispatchEvent(ev); }})()"
    );
    sink.send_async(
        Channel::Nav,
        "Runtime.evaluate",
        serde_json::json!({ "expression": expression }),
    )
    .await;
}

/// Shortcut dispatch: keyDown/keyUp with key identity but no text, so the
/// browser runs the command instead of inserting a character.
async fn dispatch_char_shortcut<S: CommandSink>(sink: &S, c: char, event: &NormalizedKeyEvent) {
    let modifiers = event.cdp_modifiers();
    let key = c.to_string();
    let code = registry::char_code(c).map(ToString::to_string);
    let key_code = registry::char_key_code(c);

    let down = DispatchKeyEventParams {
        event_type: KeyEventType::KeyDown,
        modifiers: Some(modifiers),
        text: None,
        unmodified_text: None,
        key: Some(key.clone()),
        code: code.clone(),
        windows_virtual_key_code: key_code,
        native_virtual_key_code: key_code,
    };
    send_key_event(sink, &down).await;

    let up = DispatchKeyEventParams {
        event_type: KeyEventType::KeyUp,
        modifiers: Some(modifiers),
        text: None,
        unmodified_text: None,
        key: Some(key),
        code,
        windows_virtual_key_code: key_code,
        native_virtual_key_code: key_code,
    };
    send_key_event(sink, &up).await;
}

/// Named key dispatch: keyDown/keyUp by name, with a separate `char`
/// event when the key generates text (Enter's "\r" is what editors and
/// form submission listen for).
async fn dispatch_named<S: CommandSink>(sink: &S, name: &str, event: &NormalizedKeyEvent) {
    let Some(def) = registry::named_key(name) else {
        debug!(key = name, "No definition for named key, dropping");
        return;
    };
    let modifiers = event.cdp_modifiers();

    let down = DispatchKeyEventParams {
        event_type: KeyEventType::KeyDown,
        modifiers: Some(modifiers),
        text: None,
        unmodified_text: None,
        key: Some(def.key.to_string()),
        code: Some(def.code.to_string()),
        windows_virtual_key_code: Some(def.key_code),
        native_virtual_key_code: Some(def.key_code),
    };
    send_key_event(sink, &down).await;

    if let Some(text) = def.text {
        let char_event = DispatchKeyEventParams {
            event_type: KeyEventType::Char,
            modifiers: Some(modifiers),
            text: Some(text.to_string()),
            unmodified_text: Some(text.to_string()),
            key: Some(def.key.to_string()),
            code: Some(def.code.to_string()),
            windows_virtual_key_code: Some(def.key_code),
            native_virtual_key_code: Some(def.key_code),
        };
        send_key_event(sink, &char_event).await;
    }

    let up = DispatchKeyEventParams {
        event_type: KeyEventType::KeyUp,
        modifiers: Some(modifiers),
        text: None,
        unmodified_text: None,
        key: Some(def.key.to_string()),
        code: Some(def.code.to_string()),
        windows_virtual_key_code: Some(def.key_code),
        native_virtual_key_code: Some(def.key_code),
    };
    send_key_event(sink, &up).await;
}

async fn send_key_event<S: CommandSink>(sink: &S, params: &DispatchKeyEventParams) {
    sink.send_async(
        Channel::Keyboard,
        "Input.dispatchKeyEvent",
        serde_json::to_value(params).unwrap_or(Value::Null),
    )
    .await;
}
