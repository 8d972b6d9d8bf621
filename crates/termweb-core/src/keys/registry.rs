//! Key definitions for keyboard dispatch.
//!
//! Maps key names to their CDP properties (DOM code, windows virtual key
//! code, generated text). Only the keys a terminal can actually deliver
//! are listed.

/// CDP properties of a named key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDefinition {
    /// DOM key value.
    pub key: &'static str,
    /// Physical code.
    pub code: &'static str,
    /// Windows virtual key code.
    pub key_code: u32,
    /// Text generated by the key, if any.
    pub text: Option<&'static str>,
}

/// Get the definition for a named (non-character) key.
pub fn named_key(name: &str) -> Option<KeyDefinition> {
    navigation_key(name)
        .or_else(|| editing_key(name))
        .or_else(|| function_key(name))
        .or_else(|| other_key(name))
}

fn navigation_key(name: &str) -> Option<KeyDefinition> {
    Some(match name {
        "ArrowDown" => KeyDefinition { key: "ArrowDown", code: "ArrowDown", key_code: 40, text: None },
        "ArrowLeft" => KeyDefinition { key: "ArrowLeft", code: "ArrowLeft", key_code: 37, text: None },
        "ArrowRight" => KeyDefinition { key: "ArrowRight", code: "ArrowRight", key_code: 39, text: None },
        "ArrowUp" => KeyDefinition { key: "ArrowUp", code: "ArrowUp", key_code: 38, text: None },
        "End" => KeyDefinition { key: "End", code: "End", key_code: 35, text: None },
        "Home" => KeyDefinition { key: "Home", code: "Home", key_code: 36, text: None },
        "PageDown" => KeyDefinition { key: "PageDown", code: "PageDown", key_code: 34, text: None },
        "PageUp" => KeyDefinition { key: "PageUp", code: "PageUp", key_code: 33, text: None },
        _ => return None,
    })
}

fn editing_key(name: &str) -> Option<KeyDefinition> {
    Some(match name {
        "Backspace" => KeyDefinition { key: "Backspace", code: "Backspace", key_code: 8, text: None },
        "Delete" => KeyDefinition { key: "Delete", code: "Delete", key_code: 46, text: None },
        "Enter" => KeyDefinition { key: "Enter", code: "Enter", key_code: 13, text: Some("\r") },
        "Insert" => KeyDefinition { key: "Insert", code: "Insert", key_code: 45, text: None },
        "Tab" => KeyDefinition { key: "Tab", code: "Tab", key_code: 9, text: None },
        _ => return None,
    })
}

fn function_key(name: &str) -> Option<KeyDefinition> {
    Some(match name {
        "F1" => KeyDefinition { key: "F1", code: "F1", key_code: 112, text: None },
        "F2" => KeyDefinition { key: "F2", code: "F2", key_code: 113, text: None },
        "F3" => KeyDefinition { key: "F3", code: "F3", key_code: 114, text: None },
        "F4" => KeyDefinition { key: "F4", code: "F4", key_code: 115, text: None },
        "F5" => KeyDefinition { key: "F5", code: "F5", key_code: 116, text: None },
        "F6" => KeyDefinition { key: "F6", code: "F6", key_code: 117, text: None },
        "F7" => KeyDefinition { key: "F7", code: "F7", key_code: 118, text: None },
        "F8" => KeyDefinition { key: "F8", code: "F8", key_code: 119, text: None },
        "F9" => KeyDefinition { key: "F9", code: "F9", key_code: 120, text: None },
        "F10" => KeyDefinition { key: "F10", code: "F10", key_code: 121, text: None },
        "F11" => KeyDefinition { key: "F11", code: "F11", key_code: 122, text: None },
        "F12" => KeyDefinition { key: "F12", code: "F12", key_code: 123, text: None },
        _ => return None,
    })
}

fn other_key(name: &str) -> Option<KeyDefinition> {
    Some(match name {
        "Escape" => KeyDefinition { key: "Escape", code: "Escape", key_code: 27, text: None },
        "Space" => KeyDefinition { key: " ", code: "Space", key_code: 32, text: Some(" ") },
        _ => return None,
    })
}

/// The DOM code for a character key, when one exists ("KeyA", "Digit5").
pub fn char_code(c: char) -> Option<&'static str> {
    Some(match c.to_ascii_uppercase() {
        'A' => "KeyA", 'B' => "KeyB", 'C' => "KeyC", 'D' => "KeyD", 'E' => "KeyE",
        'F' => "KeyF", 'G' => "KeyG", 'H' => "KeyH", 'I' => "KeyI", 'J' => "KeyJ",
        'K' => "KeyK", 'L' => "KeyL", 'M' => "KeyM", 'N' => "KeyN", 'O' => "KeyO",
        'P' => "KeyP", 'Q' => "KeyQ", 'R' => "KeyR", 'S' => "KeyS", 'T' => "KeyT",
        'U' => "KeyU", 'V' => "KeyV", 'W' => "KeyW", 'X' => "KeyX", 'Y' => "KeyY",
        'Z' => "KeyZ",
        '0' => "Digit0", '1' => "Digit1", '2' => "Digit2", '3' => "Digit3", '4' => "Digit4",
        '5' => "Digit5", '6' => "Digit6", '7' => "Digit7", '8' => "Digit8", '9' => "Digit9",
        ' ' => "Space",
        _ => return None,
    })
}

/// The windows virtual key code for a character key.
pub fn char_key_code(c: char) -> Option<u32> {
    let upper = c.to_ascii_uppercase();
    match upper {
        'A'..='Z' | '0'..='9' => Some(upper as u32),
        ' ' => Some(32),
        _ => None,
    }
}
