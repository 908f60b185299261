//! Incremental SSE decoding.
//!
//! Raw read chunks can split an event anywhere: between the two newlines of
//! the `\n\n` delimiter or in the middle of a multi-byte UTF-8 sequence. The
//! decoder carries both kinds of partial state between reads and only hands
//! back complete `data:` payloads.

/// Buffering decoder for a `data: <payload>\n\n` event stream.
#[derive(Debug, Default)]
pub struct SseDecoder {
    /// Bytes of an incomplete UTF-8 sequence from the previous chunk
    pending: Vec<u8>,
    /// Decoded text not yet terminated by the event delimiter
    buffer: String,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw chunk and return the `data:` payloads of every event
    /// completed by it, in arrival order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.decode(chunk);

        let mut payloads = Vec::new();
        while let Some(pos) = self.buffer.find("\n\n") {
            let block = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + 2);
            extract_data_lines(&block, &mut payloads);
        }
        payloads
    }

    /// Flush any trailing event that arrived without its `\n\n` terminator
    /// (stream cut mid-event). Call once after the byte stream ends.
    pub fn finish(&mut self) -> Vec<String> {
        self.pending.clear();
        let rest = std::mem::take(&mut self.buffer);

        let mut payloads = Vec::new();
        if !rest.trim().is_empty() {
            extract_data_lines(&rest, &mut payloads);
        }
        payloads
    }

    /// Decode as much of `pending + chunk` as forms valid UTF-8, retaining an
    /// incomplete trailing sequence for the next read.
    fn decode(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);

        let mut consumed = 0;
        loop {
            match std::str::from_utf8(&self.pending[consumed..]) {
                Ok(valid) => {
                    self.buffer.push_str(valid);
                    consumed = self.pending.len();
                    break;
                }
                Err(err) => {
                    let valid_up_to = err.valid_up_to();
                    if valid_up_to > 0 {
                        let valid = std::str::from_utf8(&self.pending[consumed..consumed + valid_up_to])
                            .expect("validated utf-8 prefix");
                        self.buffer.push_str(valid);
                        consumed += valid_up_to;
                    }
                    match err.error_len() {
                        // Sequence may complete in the next chunk
                        None => break,
                        Some(len) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            consumed += len;
                        }
                    }
                }
            }
        }
        self.pending.drain(..consumed);
    }
}

/// Collect the payloads of `data: `-prefixed lines; all other lines are
/// discarded per the wire framing.
fn extract_data_lines(block: &str, payloads: &mut Vec<String>) {
    for line in block.lines() {
        if let Some(data) = line.strip_prefix("data: ") {
            payloads.push(data.to_string());
        }
    }
}
