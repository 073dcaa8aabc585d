//! RFC-conformant Server-Sent-Events line parser: `:`
//! lines are comments, lines without a colon are field-only with an empty
//! value, `data:` lines accumulate newline-joined, a blank line delimits an
//! event, `retry:` is accepted and ignored, and a partial event still
//! pending at EOF is returned rather than dropped.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SseEvent {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

impl SseEvent {
    fn is_empty(&self) -> bool {
        self.event.is_none() && self.data.is_empty() && self.id.is_none()
    }
}

/// Incremental line-oriented SSE parser. Feed it raw bytes as they arrive
/// (`push`, newline-tolerant for both `\n` and `\r\n`); it yields complete
/// events as they close on a blank line, and `finish` returns a trailing
/// partial event if one is in progress.
#[derive(Debug, Default)]
pub struct SseParser {
    line_buf: String,
    current: SseEvent,
    has_data: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of bytes, returning any events completed by this push.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        let text = String::from_utf8_lossy(chunk);
        self.line_buf.push_str(&text);

        let mut events = Vec::new();
        loop {
            let Some(idx) = self.line_buf.find('\n') else {
                break;
            };
            let mut line: String = self.line_buf.drain(..=idx).collect();
            line.pop(); // trailing \n
            if line.ends_with('\r') {
                line.pop();
            }
            if let Some(event) = self.feed_line(&line) {
                events.push(event);
            }
        }
        events
    }

    /// Flush any trailing partial event (EOF with no closing blank line).
    pub fn finish(mut self) -> Option<SseEvent> {
        if !self.line_buf.is_empty() {
            let line = std::mem::take(&mut self.line_buf);
            self.feed_line(&line);
        }
        if self.has_data || self.current.event.is_some() || self.current.id.is_some() {
            Some(self.current)
        } else {
            None
        }
    }

    fn feed_line(&mut self, line: &str) -> Option<SseEvent> {
        if line.is_empty() {
            if self.has_data || !self.current.is_empty() {
                let event = std::mem::take(&mut self.current);
                self.has_data = false;
                return Some(event);
            }
            return None;
        }

        if let Some(rest) = line.strip_prefix(':') {
            let _ = rest; // comment line, ignored
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
            None => (line, ""),
        };

        match field {
            "event" => self.current.event = Some(value.to_string()),
            "data" => {
                if self.has_data {
                    self.current.data.push('\n');
                }
                self.current.data.push_str(value);
                self.has_data = true;
            }
            "id" => self.current.id = Some(value.to_string()),
            "retry" => {} // accepted, ignored
            _ => {}
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_data_event() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: hello\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hello");
    }

    #[test]
    fn comment_lines_are_ignored() {
        let mut parser = SseParser::new();
        let events = parser.push(b": keep-alive\ndata: hi\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn field_only_lines_set_empty_value() {
        let mut parser = SseParser::new();
        let events = parser.push(b"event\ndata: x\n\n");
        assert_eq!(events[0].event, Some(String::new()));
    }

    #[test]
    fn multiple_data_lines_are_newline_joined() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: line1\ndata: line2\n\n");
        assert_eq!(events[0].data, "line1\nline2");
    }

    #[test]
    fn retry_field_is_accepted_and_ignored() {
        let mut parser = SseParser::new();
        let events = parser.push(b"retry: 3000\ndata: hi\n\n");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn crlf_line_endings_are_tolerated() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: hi\r\n\r\n");
        assert_eq!(events[0].data, "hi");
    }

    #[test]
    fn partial_event_at_eof_is_returned_by_finish() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: partial\n");
        assert!(events.is_empty());
        let trailing = parser.finish();
        assert_eq!(trailing.unwrap().data, "partial");
    }

    #[test]
    fn finish_returns_none_when_nothing_pending() {
        let mut parser = SseParser::new();
        let events = parser.push(b"data: hi\n\n");
        assert_eq!(events.len(), 1);
        assert!(parser.finish().is_none());
    }

    #[test]
    fn event_split_across_pushes_still_parses() {
        let mut parser = SseParser::new();
        assert!(parser.push(b"data: he").is_empty());
        let events = parser.push(b"llo\n\n");
        assert_eq!(events[0].data, "hello");
    }
}
