//! Name parsing for the enums that configuration and track layers address by string.

use core::fmt;

/// Error returned when a string does not name any variant of an enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseEnumError {
    /// Human-readable kind of value that was being parsed (e.g. `"waveform"`).
    pub kind: &'static str,
}

impl ParseEnumError {
    /// Create an error for the given kind of value.
    pub const fn new(kind: &'static str) -> Self {
        Self { kind }
    }
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised {} name", self.kind)
    }
}

impl core::error::Error for ParseEnumError {}
