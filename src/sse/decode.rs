//! Stateful UTF-8 decoding for byte streams.
//!
//! Network chunks can end in the middle of a multi-byte sequence, so a
//! plain `from_utf8` per chunk would either fail or corrupt characters.
//! [`Utf8Decoder`] holds the incomplete tail (at most 3 bytes) between
//! calls and substitutes U+FFFD for bytes that can never form a valid
//! character.

/// Incremental UTF-8 decoder.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Trailing bytes of an incomplete sequence from the previous chunk
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, prepending any bytes held over from the last call.
    ///
    /// Invalid sequences become U+FFFD; an incomplete trailing sequence
    /// is buffered for the next call and produces no output yet.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut decoded = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    decoded.push_str(valid);
                    break;
                }
                Err(error) => {
                    let (valid, after) = rest.split_at(error.valid_up_to());
                    if let Ok(prefix) = std::str::from_utf8(valid) {
                        decoded.push_str(prefix);
                    }
                    match error.error_len() {
                        Some(bad_len) => {
                            decoded.push('\u{FFFD}');
                            rest = &after[bad_len..];
                        }
                        None => {
                            // Incomplete sequence at the end, carry it over
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        decoded
    }

    /// Finish the stream. A dangling incomplete sequence becomes a single
    /// U+FFFD; otherwise the result is empty.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            "\u{FFFD}".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passthrough() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"event: ping\n"), "event: ping\n");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        // "é" is 0xC3 0xA9
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0x63, 0x61, 0x66, 0xC3]), "caf");
        assert_eq!(decoder.decode(&[0xA9]), "é");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_four_byte_sequence_split_three_ways() {
        // U+1F4F7 camera emoji: F0 9F 93 B7
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0xF0]), "");
        assert_eq!(decoder.decode(&[0x9F, 0x93]), "");
        assert_eq!(decoder.decode(&[0xB7]), "\u{1F4F7}");
    }

    #[test]
    fn test_invalid_byte_becomes_replacement() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0x61, 0xFF, 0x62]), "a\u{FFFD}b");
    }

    #[test]
    fn test_truncated_sequence_followed_by_ascii() {
        // 0xE2 starts a three byte sequence; 'x' cannot continue it
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0xE2]), "");
        assert_eq!(decoder.decode(b"x"), "\u{FFFD}x");
    }

    #[test]
    fn test_finish_with_dangling_partial() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&[0xE2, 0x82]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        // finish resets the carry
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_mixed_content_byte_at_a_time() {
        let input = "état: café \u{1F4F7}".as_bytes();
        let mut decoder = Utf8Decoder::new();
        let mut output = String::new();
        for byte in input {
            output.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        output.push_str(&decoder.finish());
        assert_eq!(output, "état: café \u{1F4F7}");
    }
}
