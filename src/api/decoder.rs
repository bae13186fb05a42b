//! Incremental UTF-8 decoding of the response body.
//!
//! Transport buffers are cut wherever the network happens to cut them, so a
//! multi-byte character can straddle two buffers. The decoder keeps the
//! incomplete tail of one buffer and prepends it to the next.

use bytes::{Buf, BytesMut};

#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: BytesMut,
    buffers_decoded: usize,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one transport buffer into a text fragment.
    ///
    /// Invalid sequences become U+FFFD. An incomplete sequence at the end of
    /// the buffer is held back and completed by the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.buffers_decoded += 1;
        self.pending.extend_from_slice(chunk);

        let mut fragment = String::with_capacity(self.pending.len());
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    fragment.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(error) => {
                    let valid = error.valid_up_to();
                    fragment.push_str(
                        std::str::from_utf8(&self.pending[..valid]).unwrap_or_default(),
                    );
                    match error.error_len() {
                        Some(invalid) => {
                            fragment.push(char::REPLACEMENT_CHARACTER);
                            self.pending.advance(valid + invalid);
                        }
                        None => {
                            self.pending.advance(valid);
                            break;
                        }
                    }
                }
            }
        }

        fragment
    }

    /// Flush at end of stream. A dangling partial character becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn buffers_decoded(&self) -> usize {
        self.buffers_decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through_one_fragment_per_buffer() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"{\"message\":"), "{\"message\":");
        assert_eq!(decoder.decode(b"\"Hi\"}\n"), "\"Hi\"}\n");
        assert_eq!(decoder.buffers_decoded(), 2);
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn two_byte_character_split_across_buffers() {
        let bytes = "café".as_bytes();
        let (head, tail) = bytes.split_at(bytes.len() - 1);

        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(head), "caf");
        assert_eq!(decoder.pending_len(), 1);
        assert_eq!(decoder.decode(tail), "é");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn four_byte_character_split_byte_by_byte() {
        let bytes = "a🙂b".as_bytes();
        let mut decoder = StreamDecoder::new();
        let mut out = String::new();
        for byte in bytes {
            out.push_str(&decoder.decode(std::slice::from_ref(byte)));
        }
        out.push_str(&decoder.finish());
        assert_eq!(out, "a🙂b");
    }

    #[test]
    fn every_split_point_reassembles_the_text() {
        let text = "héllo → wörld 🙂 <think>思考</think>";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = StreamDecoder::new();
            let mut out = decoder.decode(&bytes[..split]);
            out.push_str(&decoder.decode(&bytes[split..]));
            out.push_str(&decoder.finish());
            assert_eq!(out, text, "split at byte {split}");
        }
    }

    #[test]
    fn invalid_bytes_become_replacement_characters() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"ok\xFFok"), "ok\u{FFFD}ok");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn dangling_partial_character_is_replaced_on_finish() {
        let mut decoder = StreamDecoder::new();
        assert_eq!(decoder.decode(b"end\xE2\x82"), "end");
        assert_eq!(decoder.finish(), "\u{FFFD}");
        assert_eq!(decoder.finish(), "");
    }
}
