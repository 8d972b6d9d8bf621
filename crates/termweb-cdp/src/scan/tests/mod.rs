use super::*;

const FRAME_EVENT: &[u8] = br#"{"method":"Page.screencastFrame","params":{"data":"aGVsbG8gd29ybGQ=","metadata":{"offsetTop":0,"pageScaleFactor":1,"deviceWidth":1280,"deviceHeight":720,"scrollOffsetX":0,"scrollOffsetY":0,"timestamp":1721351.5},"sessionId":7},"sessionId":"8A193B50C2"}"#;

#[test]
fn test_find_basics() {
    assert_eq!(find(b"hello world", b"world"), Some(6));
    assert_eq!(find(b"hello", b"hello"), Some(0));
    assert_eq!(find(b"hello", b"x"), None);
    assert_eq!(find(b"ab", b"abc"), None);
    assert_eq!(find(b"abc", b""), None);
}

#[test]
fn test_find_repeated_first_byte() {
    assert_eq!(find(b"aaab", b"aab"), Some(1));
    assert_eq!(find(b"\"\"\"id\":", b"\"id\":"), Some(2));
}

#[test]
fn test_classify_response() {
    let kind = classify(br#"{"id":42,"result":{"value":2}}"#);
    assert_eq!(kind, RawMessageKind::Response { id: 42 });
}

#[test]
fn test_classify_event() {
    let kind = classify(br#"{"method":"Page.frameNavigated","params":{}}"#);
    match kind {
        RawMessageKind::Event { method } => {
            assert_eq!(
                &br#"{"method":"Page.frameNavigated","params":{}}"#[method],
                b"Page.frameNavigated"
            );
        }
        other => panic!("expected event, got {other:?}"),
    }
}

#[test]
fn test_classify_event_with_embedded_id() {
    // Events whose params carry an "id" key must still route as events.
    let kind = classify(br#"{"method":"Target.targetCreated","params":{"targetInfo":{"id":"x"}}}"#);
    assert!(matches!(kind, RawMessageKind::Event { .. }));
}

#[test]
fn test_classify_response_with_embedded_method() {
    // Responses whose result embeds a "method" string must still route as
    // responses; the top-level id comes first on the wire.
    let kind = classify(br#"{"id":9,"result":{"entries":[{"method":"typed"}]}}"#);
    assert_eq!(kind, RawMessageKind::Response { id: 9 });
}

#[test]
fn test_classify_other() {
    assert_eq!(classify(b"{}"), RawMessageKind::Other);
    assert_eq!(classify(b""), RawMessageKind::Other);
}

#[test]
fn test_response_id() {
    assert_eq!(response_id(br#"{"id":1,"result":{}}"#), Some(1));
    assert_eq!(response_id(br#"{"id":4294967295,"result":{}}"#), Some(u32::MAX));
    assert_eq!(response_id(br#"{"result":{}}"#), None);
}

#[test]
fn test_method_extraction() {
    assert_eq!(method(FRAME_EVENT), Some("Page.screencastFrame"));
    assert_eq!(method(br#"{"id":1,"result":{}}"#), None);
}

#[test]
fn test_session_ids_on_frame_event() {
    // The frame event carries both forms; each accessor must pick its own.
    assert_eq!(routing_session_id(FRAME_EVENT), Some("8A193B50C2"));
    assert_eq!(frame_session_id(FRAME_EVENT), Some(7));
}

#[test]
fn test_session_id_only_string() {
    let payload = br#"{"method":"Page.frameNavigated","params":{},"sessionId":"AB12"}"#;
    assert_eq!(routing_session_id(payload), Some("AB12"));
    assert_eq!(frame_session_id(payload), None);
}

#[test]
fn test_data_range() {
    let range = data_range(FRAME_EVENT).unwrap();
    assert_eq!(&FRAME_EVENT[range], b"aGVsbG8gd29ybGQ=");
}

#[test]
fn test_metadata_dimensions() {
    assert_eq!(metadata_device_dimensions(FRAME_EVENT), Some((1280, 720)));
    assert_eq!(
        metadata_device_dimensions(br#"{"method":"Page.screencastFrame","params":{}}"#),
        None
    );
}

#[test]
fn test_error_response_probe() {
    assert!(is_error_response(
        br#"{"id":3,"error":{"code":-32601,"message":"Method not found"}}"#
    ));
    // An "error" string buried in a result payload is data, not a failure.
    assert!(!is_error_response(
        br#"{"id":3,"result":{"value":"this contains \"error\": somewhere deep"}}"#
    ));
}

#[test]
fn test_integer_parsing_stops_at_fraction() {
    let payload = br#"{"metadata":{"deviceWidth":1280.5,"deviceHeight":719.5}}"#;
    assert_eq!(metadata_device_dimensions(payload), Some((1280, 719)));
}

#[test]
fn test_large_payload_field_extraction() {
    // Fields must come out of a payload the size of a real screencast frame.
    let data = "QUJD".repeat(100_000);
    let payload = format!(
        r#"{{"method":"Page.screencastFrame","params":{{"data":"{data}","metadata":{{"deviceWidth":800,"deviceHeight":600}},"sessionId":3}},"sessionId":"S1"}}"#
    );
    let bytes = payload.as_bytes();
    assert_eq!(method(bytes), Some("Page.screencastFrame"));
    let range = data_range(bytes).unwrap();
    assert_eq!(range.len(), data.len());
    assert_eq!(metadata_device_dimensions(bytes), Some((800, 600)));
    assert_eq!(frame_session_id(bytes), Some(3));
}
