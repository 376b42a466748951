//! Exchange buffer
//!
//! Borrowed view used to hand key/value bytes to the engine.

use std::fmt;

/// A borrowed byte buffer passed across the engine boundary.
///
/// The engine never takes ownership: the view lives no longer than the
/// bytes it points at, and the engine copies whatever it needs to keep.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Datum<'a> {
    bytes: &'a [u8],
}

impl<'a> Datum<'a> {
    /// View `bytes` without copying
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// The viewed bytes
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Number of viewed bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// True for a zero-length view
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl<'a> From<&'a [u8]> for Datum<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self::new(bytes)
    }
}

/// Keys are passed as their UTF-8 bytes, without a terminator.
impl<'a> From<&'a str> for Datum<'a> {
    fn from(s: &'a str) -> Self {
        Self::new(s.as_bytes())
    }
}

impl fmt::Debug for Datum<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(self.bytes) {
            Ok(s) => write!(f, "Datum({s:?})"),
            Err(_) => write!(f, "Datum({:?})", self.bytes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_str_datum_has_no_terminator() {
        let d = Datum::from("abc");
        assert_eq!(d.as_bytes(), b"abc");
        assert_eq!(d.len(), 3);
    }

    #[test]
    fn test_multibyte_key_length_is_byte_length() {
        let d = Datum::from("日本");
        assert_eq!(d.len(), 6);
    }

    #[test]
    fn test_debug_formats_text_and_binary() {
        assert_eq!(format!("{:?}", Datum::from("k")), "Datum(\"k\")");
        assert_eq!(format!("{:?}", Datum::new(&[0xff])), "Datum([255])");
    }
}
