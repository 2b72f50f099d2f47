use console_types::{parse_chat_fragment, ChatFragment, PayloadError};

const DATA_PREFIX: &str = "data:";
const DONE_MARKER: &str = "[DONE]";

/// Splits a chunked chat body into `data:` lines.
///
/// Chunks can end anywhere, including inside a line or a UTF-8 sequence;
/// the unfinished tail is held until the next chunk completes it.
#[derive(Debug, Default)]
pub struct ChatStreamDecoder {
    pending: Vec<u8>,
    /// Prefix of `pending` already known to hold no newline.
    scanned: usize,
}

impl ChatStreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and return every fragment it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<ChatFragment, PayloadError>> {
        self.pending.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(offset) = self.pending[self.scanned..].iter().position(|b| *b == b'\n') {
            let pos = self.scanned + offset;
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            self.scanned = 0;
            if let Some(fragment) = decode_line(&line[..pos]) {
                fragments.push(fragment);
            }
        }
        self.scanned = self.pending.len();
        fragments
    }

    /// Decode whatever is left once the body has ended. A final line
    /// without a trailing newline still counts.
    pub fn finish(&mut self) -> Option<Result<ChatFragment, PayloadError>> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        decode_line(&rest)
    }

    pub fn has_partial(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn decode_line(line: &[u8]) -> Option<Result<ChatFragment, PayloadError>> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches('\r');

    // Blank separators, comments and other SSE fields carry nothing here.
    let data = line.strip_prefix(DATA_PREFIX)?;
    let data = data.strip_prefix(' ').unwrap_or(data).trim();
    if data.is_empty() {
        return None;
    }
    if data == DONE_MARKER {
        return Some(Ok(ChatFragment::Done));
    }
    Some(parse_chat_fragment(data))
}
