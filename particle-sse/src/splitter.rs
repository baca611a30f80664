//! SSE frame splitter
//!
//! Cuts a Server-Sent Events byte stream into frames:
//! - Lines end with `\n` or `\r\n`
//! - An empty line terminates the current frame
//! - Lines starting with `:` are comments (used for keepalive) and are dropped,
//!   unless a `data:` line has already opened the frame's payload
//! - All other lines are kept verbatim and joined with `\n`

/// Streaming splitter that accumulates bytes and yields complete frames
#[derive(Debug, Default)]
pub struct FrameSplitter {
    /// Bytes received after the last complete line
    buffer: Vec<u8>,
    /// Lines of the frame being built
    current: Vec<String>,
}

impl FrameSplitter {
    /// Create a new splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the splitter and return any complete frames
    ///
    /// Chunks may end anywhere, including in the middle of a multi-byte
    /// UTF-8 sequence; only complete lines are decoded.
    ///
    /// Once a frame has a `data:` line, every following line up to the blank
    /// line belongs to its payload and is kept verbatim, even one that starts
    /// with `:`.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer.extend_from_slice(bytes);

        let mut frames = Vec::new();

        while let Some(newline_pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=newline_pos).collect();
            let raw = &raw[..raw.len() - 1];
            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);

            let Ok(line) = std::str::from_utf8(raw) else {
                tracing::warn!(len = raw.len(), "Received invalid UTF-8 line in SSE stream");
                continue;
            };

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
            } else if line.starts_with(':') && !self.in_payload() {
                // Comment line (keepalive), ignore
            } else {
                self.current.push(line.to_string());
            }
        }

        frames
    }

    /// Flush whatever is pending when the stream ends
    ///
    /// Servers are not required to terminate the last message with a blank
    /// line, so the trailing frame (including an unterminated final line) is
    /// returned here instead of being lost.
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.buffer);
        if !tail.is_empty() {
            match String::from_utf8(tail) {
                Ok(line) => {
                    let line = line.trim_end_matches('\r');
                    if !line.is_empty() && (!line.starts_with(':') || self.in_payload()) {
                        self.current.push(line.to_string());
                    }
                }
                Err(_) => tracing::warn!("Discarding invalid UTF-8 at end of SSE stream"),
            }
        }
        self.take_frame()
    }

    /// Reset the splitter state (e.g., on reconnect)
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.current.clear();
    }

    fn in_payload(&self) -> bool {
        self.current.iter().any(|line| line.starts_with("data:"))
    }

    fn take_frame(&mut self) -> Option<String> {
        if self.current.is_empty() {
            return None;
        }
        let frame = self.current.join("\n");
        self.current.clear();
        Some(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_simple_frame() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: temperature\ndata: {\"data\":\"25\"}\n\n");

        assert_eq!(frames, vec!["event: temperature\ndata: {\"data\":\"25\"}"]);
    }

    #[test]
    fn test_split_multiple_frames() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: first\ndata: 1\n\nevent: second\ndata: 2\n\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0], "event: first\ndata: 1");
        assert_eq!(frames[1], "event: second\ndata: 2");
    }

    #[test]
    fn test_split_chunked_input() {
        let mut splitter = FrameSplitter::new();

        // First chunk - incomplete
        assert!(splitter.feed(b"event: test\nda").is_empty());

        // Second chunk - completes the frame
        let frames = splitter.feed(b"ta: hello\n\n");
        assert_eq!(frames, vec!["event: test\ndata: hello"]);
    }

    #[test]
    fn test_split_utf8_across_chunks() {
        let mut splitter = FrameSplitter::new();
        let bytes = "data: caf\u{e9}\n\n".as_bytes();
        // Split inside the two-byte encoding of 'é'
        let cut = bytes.len() - 3;

        assert!(splitter.feed(&bytes[..cut]).is_empty());
        let frames = splitter.feed(&bytes[cut..]);
        assert_eq!(frames, vec!["data: caf\u{e9}"]);
    }

    #[test]
    fn test_split_crlf_line_endings() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: test\r\ndata: hello\r\n\r\n");

        assert_eq!(frames, vec!["event: test\ndata: hello"]);
    }

    #[test]
    fn test_comment_lines_dropped() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b":ok\n\n: heartbeat\nevent: test\ndata: hello\n\n");

        assert_eq!(frames, vec!["event: test\ndata: hello"]);
    }

    #[test]
    fn test_colon_line_inside_payload_is_kept() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: test\ndata: {\"data\"\n:\"x\"}\n\n");

        assert_eq!(frames, vec!["event: test\ndata: {\"data\"\n:\"x\"}"]);
    }

    #[test]
    fn test_colon_line_before_payload_is_comment() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: test\n: heartbeat\ndata: 1\n\n");

        assert_eq!(frames, vec!["event: test\ndata: 1"]);
    }

    #[test]
    fn test_finish_keeps_colon_line_inside_payload() {
        let mut splitter = FrameSplitter::new();
        splitter.feed(b"data: {\"a\"\n:1}");

        assert_eq!(splitter.finish().as_deref(), Some("data: {\"a\"\n:1}"));
    }

    #[test]
    fn test_repeated_blank_lines_yield_nothing() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.feed(b"\n\n\r\n\n").is_empty());
    }

    #[test]
    fn test_invalid_utf8_line_skipped() {
        let mut splitter = FrameSplitter::new();
        let frames = splitter.feed(b"event: test\ndata: \xff\xfe\ndata: ok\n\n");

        assert_eq!(frames, vec!["event: test\ndata: ok"]);
    }

    #[test]
    fn test_finish_flushes_unterminated_frame() {
        let mut splitter = FrameSplitter::new();
        assert!(splitter.feed(b"event: test\ndata: {\"a\":1}").is_empty());

        assert_eq!(splitter.finish().as_deref(), Some("event: test\ndata: {\"a\":1}"));
        assert_eq!(splitter.finish(), None);
    }

    #[test]
    fn test_reset() {
        let mut splitter = FrameSplitter::new();
        splitter.feed(b"event: test\ndata: partial");

        splitter.reset();

        let frames = splitter.feed(b"event: new\ndata: fresh\n\n");
        assert_eq!(frames, vec!["event: new\ndata: fresh"]);
    }
}
