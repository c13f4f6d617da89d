//! `VLQ-Count`: minimum-length unsigned variable-length integer.
//!
//! Each byte contributes 7 payload bits, most-significant group first; the
//! high bit set means "more bytes follow". The first byte of a multi-byte
//! encoding must carry a non-zero payload, otherwise the leading group is
//! redundant and the encoding is rejected as non-minimal.

use crate::error::CellError;
use crate::vlq::MAX_VLQ_COUNT_LENGTH;

/// Number of bytes [`write`] would emit for `value`.
#[inline]
pub fn encoded_len(value: u64) -> usize {
    let mut len = 1;
    let mut remaining = value >> 7;
    while remaining != 0 {
        len += 1;
        remaining >>= 7;
    }
    len
}

/// Appends the minimum-length `VLQ-Count` encoding of `value` to `buf`.
pub fn write(buf: &mut Vec<u8>, value: u64) {
    let len = encoded_len(value);
    for i in (0..len).rev() {
        let byte = ((value >> (7 * i)) & 0x7f) as u8;
        buf.push(if i != 0 { byte | 0x80 } else { byte });
    }
}

/// Reads a `VLQ-Count` from the start of `buf`, returning the value and the
/// number of bytes consumed.
///
/// Fails with [`CellError::VlqUnderrun`] if `buf` ends before a terminating
/// byte is seen, [`CellError::VlqOverflow`] if the magnitude would not fit in
/// a `u64`, and [`CellError::NonMinimalVlq`] if the leading byte carries a
/// redundant zero payload.
pub fn read(buf: &[u8]) -> Result<(u64, usize), CellError> {
    let mut value: u128 = 0;
    let mut consumed = 0usize;
    loop {
        if consumed >= buf.len() {
            return Err(CellError::VlqUnderrun);
        }
        if consumed >= MAX_VLQ_COUNT_LENGTH {
            return Err(CellError::VlqOverflow);
        }
        let byte = buf[consumed];
        consumed += 1;
        value = (value << 7) | u128::from(byte & 0x7f);
        if value > u128::from(u64::MAX) {
            return Err(CellError::VlqOverflow);
        }
        if byte & 0x80 == 0 {
            break;
        }
    }
    if consumed > 1 && (buf[0] & 0x7f) == 0 {
        return Err(CellError::NonMinimalVlq);
    }
    Ok((value as u64, consumed))
}

/// Peeks a `VLQ-Count` length prefix without requiring the payload bytes to
/// be present yet.
///
/// Returns `Ok(None)` if `buf` does not yet contain a complete prefix,
/// `Ok(Some((value, prefix_len)))` once it does, and `Err` if the prefix is
/// malformed or the decoded value exceeds `limit`.
pub fn peek_length_prefix(buf: &[u8], limit: u64) -> Result<Option<(u64, usize)>, CellError> {
    match read(buf) {
        Ok((value, consumed)) => {
            if value > limit {
                return Err(CellError::FrameTooLarge(value as usize, limit as usize));
            }
            Ok(Some((value, consumed)))
        }
        Err(CellError::VlqUnderrun) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_0x80_takes_two_bytes() {
        let mut buf = Vec::new();
        write(&mut buf, 0x80);
        assert_eq!(buf, vec![0x81, 0x00]);
        assert_eq!(read(&buf).unwrap(), (0x80, 2));
    }

    #[test]
    fn boundary_0x7f_takes_one_byte() {
        let mut buf = Vec::new();
        write(&mut buf, 0x7f);
        assert_eq!(buf, vec![0x7f]);
    }

    #[test]
    fn one_gib_is_five_bytes() {
        let mut buf = Vec::new();
        write(&mut buf, 1_073_741_824);
        assert_eq!(buf, vec![0x84, 0x80, 0x80, 0x80, 0x00]);
        assert_eq!(read(&buf).unwrap(), (1_073_741_824, 5));
    }

    #[test]
    fn rejects_non_minimal_leading_zero_group() {
        let buf = [0x80u8, 0x00];
        assert_eq!(read(&buf), Err(CellError::NonMinimalVlq));
    }

    #[test]
    fn rejects_incomplete_buffer() {
        let buf = [0x81u8];
        assert_eq!(read(&buf), Err(CellError::VlqUnderrun));
    }

    #[test]
    fn zero_round_trips_as_single_byte() {
        let mut buf = Vec::new();
        write(&mut buf, 0);
        assert_eq!(buf, vec![0x00]);
        assert_eq!(read(&buf).unwrap(), (0, 1));
    }

    #[test]
    fn peek_length_prefix_waits_for_more_bytes() {
        let buf = [0x81u8];
        assert_eq!(peek_length_prefix(&buf, 1_000_000), Ok(None));
    }

    #[test]
    fn peek_length_prefix_rejects_over_limit() {
        let mut buf = Vec::new();
        write(&mut buf, 9_000);
        assert_eq!(
            peek_length_prefix(&buf, 100),
            Err(CellError::FrameTooLarge(9_000, 100))
        );
    }

    proptest::proptest! {
        #[test]
        fn round_trips_for_any_u63(v in 0u64..=(u64::MAX >> 1)) {
            let mut buf = Vec::new();
            write(&mut buf, v);
            let (decoded, consumed) = read(&buf).unwrap();
            proptest::prop_assert_eq!(decoded, v);
            proptest::prop_assert_eq!(consumed, buf.len());
            proptest::prop_assert_eq!(consumed, encoded_len(v));
        }
    }
}
