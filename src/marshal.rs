//! String marshaling between boundary buffers and engine strings.
//!
//! Boundary strings are length-prefixed byte buffers (`&[u8]`, `&str`,
//! `String`); engine strings are NUL-terminated. Both directions copy, and
//! every buffer handed back is owned by the receiver.

use std::ffi::{CStr, CString};

/// A NUL-terminated copy of a boundary string, owned by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeString(CString);

impl NativeString {
    pub fn as_c_str(&self) -> &CStr {
        &self.0
    }

    pub fn as_str(&self) -> &str {
        // Built from valid UTF-8 in `to_native`.
        self.0.to_str().unwrap_or_default()
    }
}

/// Copy `bytes` into a fresh NUL-terminated buffer.
///
/// An interior NUL ends the string there, as it would for any C reader.
/// Invalid UTF-8 is replaced with U+FFFD.
pub fn to_native(bytes: impl AsRef<[u8]>) -> NativeString {
    let bytes = bytes.as_ref();
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = String::from_utf8_lossy(&bytes[..end]).into_owned();
    // No NUL remains after the cut above.
    NativeString(CString::new(text).unwrap_or_default())
}

/// Copy a NUL-terminated engine string (or nothing) into a boundary string.
pub fn from_native(native: Option<&CStr>) -> String {
    native
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Copy an explicit-length engine buffer into boundary-owned bytes.
pub fn from_native_bytes(native: Option<&[u8]>) -> Vec<u8> {
    native.map(<[u8]>::to_vec).unwrap_or_default()
}

#[cfg(test)]
#[path = "../tests/rust/test_marshal.rs"]
mod tests;
