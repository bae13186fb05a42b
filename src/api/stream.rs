use super::logging::emit_malformed_event;
use crate::error::ChatError;
use crate::types::WireEvent;

pub const DEFAULT_MAX_LINE_BYTES: usize = 1024 * 1024;
const MALFORMED_LINE_PREVIEW: usize = 256;

/// Events decoded from the complete lines of one text fragment.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LineBatch {
    pub events: Vec<WireEvent>,
    /// Complete lines dropped because an earlier line in the batch carried an error.
    pub discarded_lines: usize,
}

impl LineBatch {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Splits decoded text into newline-delimited JSON records.
///
/// A trailing segment without its newline is carried into the next `push`, so
/// a record cut in half by the transport is parsed once it is whole.
pub struct LineEventParser {
    buffer: String,
    max_line_bytes: usize,
    discarding_overlong_line: bool,
    malformed_count: usize,
}

impl Default for LineEventParser {
    fn default() -> Self {
        Self::with_max_line_bytes(DEFAULT_MAX_LINE_BYTES)
    }
}

impl LineEventParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line_bytes(max_line_bytes: usize) -> Self {
        Self {
            buffer: String::new(),
            max_line_bytes: max_line_bytes.max(1),
            discarding_overlong_line: false,
            malformed_count: 0,
        }
    }

    pub fn push(&mut self, fragment: &str) -> LineBatch {
        let mut fragment = fragment;
        if self.discarding_overlong_line {
            match fragment.find('\n') {
                Some(newline) => {
                    fragment = &fragment[newline + 1..];
                    self.discarding_overlong_line = false;
                }
                None => return LineBatch::default(),
            }
        }

        let mut pending = std::mem::take(&mut self.buffer);
        pending.push_str(fragment);

        let mut batch = LineBatch::default();
        let mut halted = false;
        let mut start = 0;
        while let Some(offset) = pending[start..].find('\n') {
            let end = start + offset;
            let line = &pending[start..end];
            start = end + 1;

            if halted {
                if !line.trim().is_empty() {
                    batch.discarded_lines += 1;
                }
                continue;
            }
            halted = self.parse_line(line, &mut batch.events);
        }
        pending.drain(..start);

        if pending.len() > self.max_line_bytes {
            self.record_malformed(&pending, "line exceeds the buffer limit");
            pending.clear();
            self.discarding_overlong_line = true;
        }
        self.buffer = pending;

        if batch.discarded_lines > 0 {
            tracing::debug!(
                discarded = batch.discarded_lines,
                "stream error event ended the line batch"
            );
        }
        batch
    }

    /// Parse a final record that arrived without a terminating newline.
    pub fn finish(&mut self) -> LineBatch {
        let pending = std::mem::take(&mut self.buffer);
        let mut batch = LineBatch::default();
        if !self.discarding_overlong_line {
            self.parse_line(&pending, &mut batch.events);
        }
        self.discarding_overlong_line = false;
        batch
    }

    pub fn malformed_count(&self) -> usize {
        self.malformed_count
    }

    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true when the line carried an error event.
    fn parse_line(&mut self, line: &str, events: &mut Vec<WireEvent>) -> bool {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() {
            return false;
        }

        match WireEvent::decode_line(line) {
            Ok(decoded) => {
                for event in decoded {
                    match event {
                        WireEvent::Unrecognized => {
                            tracing::trace!(line, "ignoring unrecognized stream record");
                        }
                        WireEvent::Error(_) => {
                            events.push(event);
                            return true;
                        }
                        WireEvent::Content(_) => events.push(event),
                    }
                }
                false
            }
            Err(error) => {
                self.record_malformed(line, &error.to_string());
                false
            }
        }
    }

    fn record_malformed(&mut self, line: &str, reason: &str) {
        self.malformed_count += 1;
        let preview: String = line.chars().take(MALFORMED_LINE_PREVIEW).collect();
        emit_malformed_event(&ChatError::MalformedEvent {
            line: preview,
            reason: reason.to_string(),
        });
    }
}
