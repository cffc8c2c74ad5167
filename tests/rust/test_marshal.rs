use super::*;

#[test]
fn test_to_native_copies_text() {
    let native = to_native("digraph { a }");
    assert_eq!(native.as_str(), "digraph { a }");
    assert_eq!(native.as_c_str().to_bytes(), b"digraph { a }");
}

#[test]
fn test_to_native_empty() {
    let native = to_native("");
    assert_eq!(native.as_str(), "");
    assert_eq!(native.as_c_str().to_bytes_with_nul(), b"\0");
}

#[test]
fn test_to_native_stops_at_interior_nul() {
    let native = to_native(b"ab\0cd");
    assert_eq!(native.as_str(), "ab");
}

#[test]
fn test_to_native_replaces_invalid_utf8() {
    let native = to_native([b'a', 0xff, b'b']);
    assert_eq!(native.as_str(), "a\u{fffd}b");
}

#[test]
fn test_from_native() {
    let native = to_native("héllo");
    assert_eq!(from_native(Some(native.as_c_str())), "héllo");
    assert_eq!(from_native(None), "");
}

#[test]
fn test_from_native_bytes_keeps_nul() {
    let bytes = [b'x', 0, b'y'];
    assert_eq!(from_native_bytes(Some(&bytes[..])), vec![b'x', 0, b'y']);
    assert!(from_native_bytes(None).is_empty());
}
