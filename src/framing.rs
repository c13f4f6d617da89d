//! Stream message-length framing.
//!
//! A frame is `[VLQ-Count total_length][1-byte message type][payload]`,
//! where `total_length` covers the type byte and payload but not the prefix
//! itself. This bound is deliberately distinct from and larger than
//! [`crate::limits::LIMIT_ENCODING_LENGTH`], which only bounds a single
//! cell's own encoding: a frame routinely carries a whole multi-cell message.

use crate::error::{CellError, Result};
use crate::limits::Limits;
use crate::vlq;

/// A single decoded stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub message_type: u8,
    pub payload: Vec<u8>,
}

/// Encodes `payload` as a frame of the given `message_type`.
///
/// Fails with [`CellError::FrameTooLarge`] if the framed message (type byte
/// plus payload) would exceed `limits.max_frame_length`.
pub fn encode_frame(message_type: u8, payload: &[u8], limits: &Limits) -> Result<Vec<u8>> {
    let body_len = 1 + payload.len();
    if body_len > limits.max_frame_length {
        return Err(CellError::FrameTooLarge(body_len, limits.max_frame_length));
    }
    let mut buf = Vec::with_capacity(vlq::count::encoded_len(body_len as u64) + body_len);
    vlq::count::write(&mut buf, body_len as u64);
    buf.push(message_type);
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Attempts to parse one frame from the front of `buf`.
///
/// Returns `Ok(None)` if `buf` does not yet hold a complete frame (the
/// caller should read more bytes from the stream and retry with the same
/// starting offset), `Ok(Some((frame, consumed)))` once a full frame is
/// available, and `Err` if the declared length is malformed or exceeds
/// `limits.max_frame_length`.
pub fn decode_frame(buf: &[u8], limits: &Limits) -> Result<Option<(Frame, usize)>> {
    let limit = limits.max_frame_length as u64;
    let (body_len, prefix_len) = match vlq::count::peek_length_prefix(buf, limit)? {
        None => return Ok(None),
        Some(pair) => pair,
    };
    let body_len = body_len as usize;
    if body_len == 0 {
        return Err(CellError::truncated("frame missing message type byte"));
    }
    let total_len = prefix_len + body_len;
    if buf.len() < total_len {
        return Ok(None);
    }
    let message_type = buf[prefix_len];
    let payload = buf[prefix_len + 1..total_len].to_vec();
    Ok(Some((
        Frame {
            message_type,
            payload,
        },
        total_len,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_frame_round_trips() {
        let limits = Limits::default();
        let encoded = encode_frame(0x01, b"hello", &limits).unwrap();
        let (frame, consumed) = decode_frame(&encoded, &limits).unwrap().unwrap();
        assert_eq!(consumed, encoded.len());
        assert_eq!(frame.message_type, 0x01);
        assert_eq!(frame.payload, b"hello");
    }

    #[test]
    fn partial_frame_reports_none() {
        let limits = Limits::default();
        let encoded = encode_frame(0x02, b"incomplete payload", &limits).unwrap();
        let truncated = &encoded[..encoded.len() - 3];
        assert_eq!(decode_frame(truncated, &limits), Ok(None));
    }

    #[test]
    fn partial_length_prefix_reports_none() {
        let limits = Limits::default();
        assert_eq!(decode_frame(&[0x81], &limits), Ok(None));
    }

    #[test]
    fn oversized_frame_is_rejected_at_encode_time() {
        let limits = Limits::light_client();
        let payload = vec![0u8; limits.max_frame_length + 1];
        assert!(matches!(
            encode_frame(0x03, &payload, &limits),
            Err(CellError::FrameTooLarge(_, _))
        ));
    }

    #[test]
    fn two_frames_back_to_back_decode_independently() {
        let limits = Limits::default();
        let mut stream = encode_frame(0x01, b"first", &limits).unwrap();
        stream.extend(encode_frame(0x02, b"second", &limits).unwrap());

        let (first, consumed) = decode_frame(&stream, &limits).unwrap().unwrap();
        assert_eq!(first.payload, b"first");
        let (second, _) = decode_frame(&stream[consumed..], &limits).unwrap().unwrap();
        assert_eq!(second.payload, b"second");
    }
}
