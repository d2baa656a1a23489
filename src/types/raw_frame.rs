use std::fmt;

/// The payload of one event frame, before it is decoded.
///
/// The `data:` prefixes have been stripped, the data lines joined with `\n`,
/// and the final terminator removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawFrame(String);

impl RawFrame {
    /// Wraps an already-assembled payload.
    pub fn new(data: impl Into<String>) -> Self {
        Self(data.into())
    }

    /// The payload as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the frame, returning the payload.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for RawFrame {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
