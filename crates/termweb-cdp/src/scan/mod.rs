//! Byte-range scanning for CDP message routing.
//!
//! Screencast frames are hundreds of kilobytes of base64; running a full
//! JSON parser over every one of them would dominate the reader task. The
//! routing decisions only need a handful of fields, all of which can be
//! located with a single forward scan:
//!
//! - `"id":N` - response correlation
//! - `"method":"..."` - event dispatch
//! - `"sessionId":"..."` / `"sessionId":N` - routing vs frame session id
//! - `"data":"..."` - the base64 image range
//! - `"metadata":{"deviceWidth":N,"deviceHeight":N}` - frame dimensions
//!
//! The scanner assumes CDP's actual output grammar: keys are unescaped,
//! session ids and base64 payloads contain no `\"` sequences, and numbers
//! are plain decimal. Full JSON parsing is reserved for the discovery
//! endpoints and small command responses.

use std::ops::Range;

/// Find the first occurrence of `needle` in `haystack`.
///
/// Plain forward scan with a first-byte filter; on screencast-sized
/// payloads the needle almost always sits in the first few hundred bytes,
/// so the scan terminates long before touching the image data.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let first = needle[0];
    let last = haystack.len() - needle.len();
    let mut i = 0;
    while i <= last {
        if haystack[i] == first && &haystack[i..i + needle.len()] == needle {
            return Some(i);
        }
        i += 1;
    }
    None
}

/// Classification of a raw wire payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawMessageKind {
    /// Has an `"id"` key: a response to a command we sent.
    Response {
        /// The correlation id.
        id: u32,
    },
    /// Has a `"method"` key: an event pushed by the browser.
    Event {
        /// Byte range of the method name within the payload.
        method: Range<usize>,
    },
    /// Neither key found; not a CDP message we route.
    Other,
}

/// Classify a payload as response or event without parsing it.
///
/// When both keys appear (an event params object can embed an `"id"`),
/// whichever key occurs first in the byte stream wins; CDP always puts the
/// discriminating key first at the top level.
pub fn classify(payload: &[u8]) -> RawMessageKind {
    let id_pos = find(payload, b"\"id\":");
    let method_pos = find(payload, b"\"method\":");
    match (id_pos, method_pos) {
        (Some(i), Some(m)) if i < m => response_kind(payload, i),
        (Some(i), None) => response_kind(payload, i),
        (_, Some(_)) => match method_range(payload) {
            Some(method) => RawMessageKind::Event { method },
            None => RawMessageKind::Other,
        },
        (None, None) => RawMessageKind::Other,
    }
}

fn response_kind(payload: &[u8], id_pos: usize) -> RawMessageKind {
    match parse_digits(&payload[id_pos + b"\"id\":".len()..]) {
        Some(id) => RawMessageKind::Response { id: id as u32 },
        None => RawMessageKind::Other,
    }
}

/// Extract the correlation id of a response payload.
pub fn response_id(payload: &[u8]) -> Option<u32> {
    let pos = find(payload, b"\"id\":")?;
    parse_digits(&payload[pos + b"\"id\":".len()..]).map(|n| n as u32)
}

/// Byte range of the `"method"` value.
pub fn method_range(payload: &[u8]) -> Option<Range<usize>> {
    string_value_range(payload, find(payload, b"\"method\":")? + b"\"method\":".len())
}

/// The `"method"` value as a string slice.
pub fn method(payload: &[u8]) -> Option<&str> {
    let range = method_range(payload)?;
    std::str::from_utf8(&payload[range]).ok()
}

/// The string-valued `"sessionId"` (the CDP routing session).
///
/// A screencast frame carries two session ids: the routing session (string,
/// assigned by `Target.attachToTarget`) and the frame number (integer,
/// echoed back in the acknowledgement). This returns the string one.
pub fn routing_session_id(payload: &[u8]) -> Option<&str> {
    let mut from = 0;
    while let Some(rel) = find(&payload[from..], b"\"sessionId\":") {
        let value_start = from + rel + b"\"sessionId\":".len();
        let rest = skip_spaces(payload, value_start);
        if payload.get(rest) == Some(&b'"') {
            let range = string_value_range(payload, value_start)?;
            return std::str::from_utf8(&payload[range]).ok();
        }
        from = value_start;
    }
    None
}

/// The integer-valued `"sessionId"` (the screencast frame number).
pub fn frame_session_id(payload: &[u8]) -> Option<i64> {
    let mut from = 0;
    while let Some(rel) = find(&payload[from..], b"\"sessionId\":") {
        let value_start = from + rel + b"\"sessionId\":".len();
        let rest = skip_spaces(payload, value_start);
        if payload.get(rest).is_some_and(u8::is_ascii_digit) {
            return parse_digits(&payload[rest..]).map(|n| n as i64);
        }
        from = value_start;
    }
    None
}

/// Byte range of the base64 `"data"` value of a screencast frame.
pub fn data_range(payload: &[u8]) -> Option<Range<usize>> {
    string_value_range(payload, find(payload, b"\"data\":")? + b"\"data\":".len())
}

/// Device dimensions from the `"metadata"` object of a screencast frame.
///
/// CDP reports them as DIP floats; the fractional part is irrelevant for
/// slot metadata and is truncated.
pub fn metadata_device_dimensions(payload: &[u8]) -> Option<(u32, u32)> {
    let meta = find(payload, b"\"metadata\":")?;
    let tail = &payload[meta..];
    let width = integer_field(tail, b"\"deviceWidth\":")?;
    let height = integer_field(tail, b"\"deviceHeight\":")?;
    Some((width as u32, height as u32))
}

/// Whether a response payload carries a CDP `"error"` object.
///
/// Error responses put the error key right after the id, so the key sits
/// within the first 20 bytes; an `"error"` string appearing deeper in a
/// result payload is data, not a protocol failure.
pub fn is_error_response(payload: &[u8]) -> bool {
    matches!(find(payload, b"\"error\":"), Some(pos) if pos < 20)
}

/// Parse a decimal integer field appearing after `key`.
fn integer_field(payload: &[u8], key: &[u8]) -> Option<u64> {
    let pos = find(payload, key)? + key.len();
    let start = skip_spaces(payload, pos);
    parse_digits(&payload[start..])
}

fn skip_spaces(payload: &[u8], mut i: usize) -> usize {
    while payload.get(i) == Some(&b' ') {
        i += 1;
    }
    i
}

fn parse_digits(bytes: &[u8]) -> Option<u64> {
    let bytes = &bytes[skip_spaces(bytes, 0)..];
    let mut value: u64 = 0;
    let mut seen = false;
    for &b in bytes {
        if b.is_ascii_digit() {
            value = value.checked_mul(10)?.checked_add(u64::from(b - b'0'))?;
            seen = true;
        } else {
            break;
        }
    }
    seen.then_some(value)
}

/// Range of a JSON string value whose opening quote starts at or after
/// `value_start` (skipping spaces). Values are assumed unescaped, which
/// holds for every field this scanner is used on.
fn string_value_range(payload: &[u8], value_start: usize) -> Option<Range<usize>> {
    let open = skip_spaces(payload, value_start);
    if payload.get(open) != Some(&b'"') {
        return None;
    }
    let content = open + 1;
    let rel = find(&payload[content..], b"\"")?;
    Some(content..content + rel)
}

#[cfg(test)]
mod tests;
