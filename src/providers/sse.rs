//! Server-Sent Events framing for streaming completions.

/// One complete SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseFrame {
    /// Payload of a `data:` frame (usually JSON).
    Data(String),
    /// The `[DONE]` end-of-stream marker.
    Done,
}

/// Incremental SSE parser.
///
/// Feed raw bytes as they arrive; complete frames come back, partial ones
/// stay buffered for the next call. Frames are separated by a blank line;
/// multiple `data:` lines within one frame are joined with newlines.
#[derive(Debug, Default)]
pub struct SseParser {
    buffer: String,
}

impl SseParser {
    /// Create an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes into the parser and return any complete frames.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<SseFrame> {
        self.buffer.push_str(&String::from_utf8_lossy(bytes));

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let raw: String = self.buffer.drain(..pos + 2).collect();
            if let Some(frame) = Self::parse_frame(&raw) {
                frames.push(frame);
            }
        }
        frames
    }

    fn parse_frame(raw: &str) -> Option<SseFrame> {
        let mut data_lines = Vec::new();
        for line in raw.lines() {
            if let Some(value) = line
                .strip_prefix("data: ")
                .or_else(|| line.strip_prefix("data:"))
            {
                data_lines.push(value);
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        let data = data_lines.join("\n");
        if data.trim() == "[DONE]" {
            return Some(SseFrame::Done);
        }
        Some(SseFrame::Data(data))
    }

    /// Whether an incomplete frame is still buffered.
    pub fn has_buffered_data(&self) -> bool {
        !self.buffer.is_empty()
    }
}
