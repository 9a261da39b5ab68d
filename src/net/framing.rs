//! Wire protocol codec for peer-to-peer TCP links.
//!
//! Length-prefixed frames, symmetric in both directions:
//!
//! ```text
//! [u32 BE length] [payload: length bytes]
//! ```
//!
//! The payload is a UTF-8 JSON serialization of [`Message`]. A declared
//! length must satisfy `0 < length < 1_000_000`; violating frames are
//! protocol errors that terminate the connection.

use crate::constants::{FRAME_HEADER_SIZE, MAX_FRAME_LEN};
use crate::message::Message;

use super::error::FrameError;

/// Encode a message into a wire-format byte vector.
///
/// Returns `[u32 BE length][JSON payload]`. Never fails for well-formed
/// messages.
pub fn encode_message(message: &Message) -> Vec<u8> {
    let payload =
        serde_json::to_vec(message).expect("message JSON serialization cannot fail");
    let mut buf = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    buf.extend_from_slice(&payload);
    buf
}

/// Decode a frame payload (the bytes after the length header) into a message.
///
/// # Errors
///
/// Returns [`FrameError::Malformed`] when the bytes do not parse into a
/// valid [`Message`].
pub fn decode_payload(payload: &[u8]) -> Result<Message, FrameError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Incremental frame decoder that handles partial reads.
///
/// Feed bytes via [`FrameDecoder::feed`] and extract complete messages.
/// Handles TCP byte-stream reassembly: a header or payload split across
/// reads is buffered until complete.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    /// Create a decoder with an empty buffer.
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Feed bytes into the decoder and extract all complete messages.
    ///
    /// Incomplete data is buffered for the next call. The length bound is
    /// checked as soon as a header is available, before any payload bytes
    /// accumulate, so an oversized declaration never allocates its payload.
    ///
    /// # Errors
    ///
    /// Returns a [`FrameError`] on a zero or oversized length declaration
    /// or a payload that fails to parse. The caller must treat any error
    /// as fatal to the connection.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Message>, FrameError> {
        self.buf.extend_from_slice(bytes);
        let mut messages = Vec::new();

        loop {
            if self.buf.len() < FRAME_HEADER_SIZE {
                break;
            }

            let length =
                u32::from_be_bytes([self.buf[0], self.buf[1], self.buf[2], self.buf[3]]);
            if length == 0 {
                return Err(FrameError::Empty);
            }
            if length >= MAX_FRAME_LEN {
                return Err(FrameError::TooLarge { declared: length });
            }

            let total = FRAME_HEADER_SIZE + length as usize;
            if self.buf.len() < total {
                break; // Incomplete frame, wait for more data
            }

            let message = decode_payload(&self.buf[FRAME_HEADER_SIZE..total])?;
            messages.push(message);
            self.buf.drain(..total);
        }

        Ok(messages)
    }

    /// Returns true if the decoder holds buffered partial data.
    pub fn has_partial(&self) -> bool {
        !self.buf.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let msg = Message::new("alice", "hello");
        let encoded = encode_message(&msg);
        let mut decoder = FrameDecoder::new();
        let messages = decoder.feed(&encoded).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], msg);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn test_multiple_frames_in_single_feed() {
        let m1 = Message::new("alice", "first");
        let m2 = Message::new("bob", "second");
        let m3 = Message::new("alice", "third");

        let mut buf = Vec::new();
        buf.extend_from_slice(&encode_message(&m1));
        buf.extend_from_slice(&encode_message(&m2));
        buf.extend_from_slice(&encode_message(&m3));

        let mut decoder = FrameDecoder::new();
        let messages = decoder.feed(&buf).unwrap();
        assert_eq!(messages, vec![m1, m2, m3]);
    }

    #[test]
    fn test_partial_frame_reassembly() {
        let msg = Message::new("alice", "split across reads");
        let encoded = encode_message(&msg);

        let mut decoder = FrameDecoder::new();
        let mid = encoded.len() / 2;

        let messages = decoder.feed(&encoded[..mid]).unwrap();
        assert!(messages.is_empty());
        assert!(decoder.has_partial());

        let messages = decoder.feed(&encoded[mid..]).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0], msg);
        assert!(!decoder.has_partial());
    }

    #[test]
    fn test_byte_at_a_time() {
        let msg = Message::new("bob", "x");
        let encoded = encode_message(&msg);

        let mut decoder = FrameDecoder::new();
        for (i, byte) in encoded.iter().enumerate() {
            let messages = decoder.feed(&[*byte]).unwrap();
            if i < encoded.len() - 1 {
                assert!(messages.is_empty());
            } else {
                assert_eq!(messages.len(), 1);
                assert_eq!(messages[0], msg);
            }
        }
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut decoder = FrameDecoder::new();
        let err = decoder.feed(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, FrameError::Empty));
    }

    #[test]
    fn test_oversized_length_rejected_from_header_alone() {
        // 2,000,000 declared — only the 4 header bytes are fed, proving the
        // bound is enforced before any payload is buffered.
        let mut decoder = FrameDecoder::new();
        let header = 2_000_000u32.to_be_bytes();
        let err = decoder.feed(&header).unwrap_err();
        assert!(matches!(err, FrameError::TooLarge { declared: 2_000_000 }));
    }

    #[test]
    fn test_length_at_bound_rejected() {
        let mut decoder = FrameDecoder::new();
        let header = MAX_FRAME_LEN.to_be_bytes();
        assert!(decoder.feed(&header).is_err());
    }

    #[test]
    fn test_malformed_payload_rejected() {
        let payload = b"this is not json";
        let mut buf = Vec::new();
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);

        let mut decoder = FrameDecoder::new();
        let err = decoder.feed(&buf).unwrap_err();
        assert!(matches!(err, FrameError::Malformed(_)));
    }

    #[test]
    fn test_valid_json_missing_field_rejected() {
        let payload = br#"{"sender": "alice"}"#;
        let mut buf = Vec::new();
        buf.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        buf.extend_from_slice(payload);

        let mut decoder = FrameDecoder::new();
        assert!(decoder.feed(&buf).is_err());
    }

    #[test]
    fn test_header_is_big_endian() {
        let msg = Message::new("a", "b");
        let encoded = encode_message(&msg);
        let payload_len = (encoded.len() - FRAME_HEADER_SIZE) as u32;
        assert_eq!(&encoded[..4], &payload_len.to_be_bytes());
    }
}
