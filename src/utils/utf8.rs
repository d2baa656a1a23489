//! Incremental UTF-8 decoding.

/// Decodes a byte stream into text one chunk at a time.
///
/// A multi-byte character split across chunks is held back until its
/// remaining bytes arrive.  Invalid sequences decode to U+FFFD, as does an
/// incomplete sequence left over when the input ends.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Creates a decoder with nothing buffered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `bytes`, returning every character that is now complete.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let mut out = String::with_capacity(self.pending.len());
        let mut rest: &[u8] = &self.pending;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    out.push_str(valid);
                    rest = &[];
                    break;
                }
                Err(err) => {
                    let (valid, after) = rest.split_at(err.valid_up_to());
                    // `valid_up_to` always ends on a character boundary.
                    out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match err.error_len() {
                        Some(len) => {
                            out.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            rest = after;
                            break;
                        }
                    }
                }
            }
        }
        let keep = rest.len();
        let consumed = self.pending.len() - keep;
        self.pending.drain(..consumed);
        out
    }

    /// Flushes the decoder at end of input.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            char::REPLACEMENT_CHARACTER.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"hello"), "hello");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn split_multibyte_character() {
        let bytes = "héllo 🌍".as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = Utf8Decoder::new();
            let mut text = decoder.decode(&bytes[..split]);
            text.push_str(&decoder.decode(&bytes[split..]));
            text.push_str(&decoder.finish());
            assert_eq!(text, "héllo 🌍", "split at {split}");
        }
    }

    #[test]
    fn byte_at_a_time() {
        let bytes = "日本語".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut text = String::new();
        for byte in bytes {
            text.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        assert_eq!(text, "日本語");
    }

    #[test]
    fn invalid_bytes_are_replaced() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{fffd}b");
    }

    #[test]
    fn truncated_tail_is_replaced_on_finish() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[b'x', 0xe6, 0x97]), "x");
        assert_eq!(decoder.finish(), "\u{fffd}");
        assert_eq!(decoder.finish(), "");
    }
}
