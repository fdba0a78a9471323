//! Incremental parser for the server-sent events text framing.
//!
//! The backend delivers photo events as `text/event-stream` data. Frames
//! arrive as groups of `field: value` lines terminated by a blank line,
//! but the network hands us arbitrary chunks that can split a frame, a
//! line, or even a field name anywhere. [`FrameParser`] buffers the
//! incomplete tail across [`FrameParser::feed`] calls so the frames it
//! yields are identical no matter how the input was chunked.

/// A complete event frame dispatched by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SseFrame {
    /// Event name from the last `event:` line, if any
    pub event: Option<String>,
    /// Event id from the last `id:` line, if any
    pub id: Option<String>,
    /// All `data:` lines joined with `\n`
    pub data: String,
}

impl SseFrame {
    /// Event name, defaulting to `message` when the frame had no
    /// `event:` line.
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or("message")
    }
}

/// Streaming parser for SSE frames.
///
/// Feed decoded text in with [`feed`](Self::feed) as it arrives and
/// collect the completed frames from the return value. Call
/// [`flush`](Self::flush) once the stream ends to recover a final frame
/// that was never terminated by a blank line.
///
/// Field handling:
/// - `event:` and `id:` set the pending frame's name and id; repeats
///   overwrite, and an empty value clears the field
/// - `data:` appends a line; multiple lines join with `\n` at dispatch
/// - lines starting with `:` are comments (heartbeats) and are dropped
/// - a line with no colon is treated as a field name with an empty value
/// - unknown field names are ignored
///
/// A blank line dispatches the pending frame unless nothing was set, so
/// back-to-back blank lines and comment-only keepalives produce no
/// frames. Ids do not carry over: a frame without an `id:` line has
/// `id: None` even if an earlier frame set one.
#[derive(Debug, Default)]
pub struct FrameParser {
    /// Incomplete line carried over from the previous chunk
    buffer: String,
    event: Option<String>,
    id: Option<String>,
    data: Vec<String>,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume a chunk of decoded text and return the frames it completed.
    ///
    /// Any trailing partial line is held until the next call.
    pub fn feed(&mut self, chunk: &str) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        self.buffer.push_str(chunk);

        while let Some(newline_pos) = self.buffer.find('\n') {
            let line: String = self.buffer.drain(..=newline_pos).collect();
            let line = line.strip_suffix('\n').unwrap_or(&line);
            let line = line.strip_suffix('\r').unwrap_or(line);
            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }

        frames
    }

    /// Signal end of stream and recover a final unterminated frame.
    ///
    /// A trailing partial line is processed as if it had been newline
    /// terminated, then the pending frame is dispatched if it has any
    /// content. Returns `None` when there was nothing pending.
    pub fn flush(&mut self) -> Option<SseFrame> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if let Some(frame) = self.process_line(line) {
                return Some(frame);
            }
        }
        self.take_frame()
    }

    /// Handle one complete line. Returns a frame when the line was a
    /// separator and a non-empty frame was pending.
    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.take_frame();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.find(':') {
            Some(colon_pos) => (&line[..colon_pos], &line[colon_pos + 1..]),
            None => (line, ""),
        };
        // At most one leading space belongs to the separator, the rest is data
        let value = value.strip_prefix(' ').unwrap_or(value);

        match field {
            "event" => {
                self.event = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "id" => {
                self.id = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                };
            }
            "data" => self.data.push(value.to_string()),
            _ => {}
        }

        None
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.event.is_none() && self.id.is_none() && self.data.is_empty() {
            return None;
        }
        Some(SseFrame {
            event: self.event.take(),
            id: self.id.take(),
            data: std::mem::take(&mut self.data).join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(input: &str) -> Vec<SseFrame> {
        let mut parser = FrameParser::new();
        let mut frames = parser.feed(input);
        if let Some(last) = parser.flush() {
            frames.push(last);
        }
        frames
    }

    #[test]
    fn test_single_frame() {
        let frames = parse_all("event: photo.state\nid: evt_1\ndata: {\"x\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("photo.state"));
        assert_eq!(frames[0].id.as_deref(), Some("evt_1"));
        assert_eq!(frames[0].data, "{\"x\":1}");
    }

    #[test]
    fn test_multiple_frames_in_one_chunk() {
        let frames = parse_all("data: one\n\ndata: two\n\ndata: three\n\n");
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].data, "one");
        assert_eq!(frames[1].data, "two");
        assert_eq!(frames[2].data, "three");
    }

    #[test]
    fn test_multi_line_data_joined_with_newline() {
        let frames = parse_all("data: line one\ndata: line two\ndata: line three\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "line one\nline two\nline three");
    }

    #[test]
    fn test_comment_lines_are_dropped() {
        let frames = parse_all(": heartbeat\n\n: another\ndata: real\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "real");
    }

    #[test]
    fn test_blank_line_without_pending_frame_dispatches_nothing() {
        assert!(parse_all("\n\n\n").is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let frames = parse_all("event: ping\r\ndata: {}\r\n\r\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("ping"));
        assert_eq!(frames[0].data, "{}");
    }

    #[test]
    fn test_strips_at_most_one_leading_space() {
        let frames = parse_all("data:  two spaces\n\n");
        assert_eq!(frames[0].data, " two spaces");

        let frames = parse_all("data:no space\n\n");
        assert_eq!(frames[0].data, "no space");
    }

    #[test]
    fn test_line_without_colon_is_field_with_empty_value() {
        // "data" alone contributes an empty data line
        let frames = parse_all("data\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "\nx");
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let frames = parse_all("retry: 3000\nvendor: stuff\ndata: kept\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "kept");
        assert!(frames[0].event.is_none());
    }

    #[test]
    fn test_empty_event_value_clears_field() {
        let frames = parse_all("event: photo.state\nevent:\ndata: x\n\n");
        assert_eq!(frames.len(), 1);
        assert!(frames[0].event.is_none());
        assert_eq!(frames[0].event_type(), "message");
    }

    #[test]
    fn test_repeated_event_field_overwrites() {
        let frames = parse_all("event: first\nevent: second\ndata: x\n\n");
        assert_eq!(frames[0].event.as_deref(), Some("second"));
    }

    #[test]
    fn test_id_does_not_carry_across_frames() {
        let frames = parse_all("id: evt_1\ndata: a\n\ndata: b\n\n");
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id.as_deref(), Some("evt_1"));
        assert!(frames[1].id.is_none());
    }

    #[test]
    fn test_frame_with_only_id_dispatches() {
        let frames = parse_all("id: evt_5\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].id.as_deref(), Some("evt_5"));
        assert_eq!(frames[0].data, "");
    }

    #[test]
    fn test_split_across_chunks_mid_line() {
        let mut parser = FrameParser::new();
        assert!(parser.feed("event: photo.proc").is_empty());
        let frames = parser.feed("essing\ndata: {\"p\":1}\n\n");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event.as_deref(), Some("photo.processing"));
        assert_eq!(frames[0].data, "{\"p\":1}");
    }

    #[test]
    fn test_chunking_is_invisible() {
        let input = "event: photo.updated\nid: evt_2\ndata: {\"a\":1}\ndata: {\"b\":2}\n\n: keepalive\n\nevent: ping\ndata: {}\n\n";
        let whole = parse_all(input);

        // Byte-at-a-time
        let mut parser = FrameParser::new();
        let mut one_by_one = Vec::new();
        for ch in input.chars() {
            one_by_one.extend(parser.feed(&ch.to_string()));
        }
        if let Some(last) = parser.flush() {
            one_by_one.push(last);
        }
        assert_eq!(whole, one_by_one);

        // A few awkward split points
        for split in [1, 7, 20, input.len() - 2] {
            let mut parser = FrameParser::new();
            let mut frames = parser.feed(&input[..split]);
            frames.extend(parser.feed(&input[split..]));
            if let Some(last) = parser.flush() {
                frames.push(last);
            }
            assert_eq!(whole, frames, "split at {} changed the result", split);
        }
    }

    #[test]
    fn test_flush_recovers_unterminated_frame() {
        let mut parser = FrameParser::new();
        assert!(parser.feed("event: photo.removed\ndata: {\"id\":\"p9\"}").is_empty());
        let frame = parser.flush().unwrap();
        assert_eq!(frame.event.as_deref(), Some("photo.removed"));
        assert_eq!(frame.data, "{\"id\":\"p9\"}");
    }

    #[test]
    fn test_flush_with_nothing_pending() {
        let mut parser = FrameParser::new();
        parser.feed("data: done\n\n");
        assert!(parser.flush().is_none());
    }

    #[test]
    fn test_flush_after_partial_comment() {
        let mut parser = FrameParser::new();
        parser.feed(": trailing heartbeat without newline");
        assert!(parser.flush().is_none());
    }

    #[test]
    fn test_data_value_containing_colons() {
        let frames = parse_all("data: http://example.com/a:b\n\n");
        assert_eq!(frames[0].data, "http://example.com/a:b");
    }

    #[test]
    fn test_empty_data_line_preserved_in_join() {
        let frames = parse_all("data: a\ndata:\ndata: b\n\n");
        assert_eq!(frames[0].data, "a\n\nb");
    }
}
