//! `VLQ-Long`: minimum-length signed variable-length integer.
//!
//! Same 7-bits-per-byte, most-significant-group-first shape as
//! [`crate::vlq::count`], but the payload is sign-extended from the top bit
//! of the final byte -- the rollover point is at +/-64, not +/-128. Redundant
//! sign-extension bytes (a leading group that contributes no information
//! beyond the sign already carried by the next group) are rejected.

use crate::error::CellError;
use crate::vlq::MAX_VLQ_LONG_LENGTH;

/// Number of bytes [`write`] would emit for `value`.
#[inline]
pub fn encoded_len(value: i64) -> usize {
    let mut len = 1;
    let mut cur = value;
    loop {
        let next = cur >> 7;
        let payload = (cur & 0x7f) as u8;
        let fits = (next == 0 && payload & 0x40 == 0) || (next == -1 && payload & 0x40 != 0);
        if fits {
            break;
        }
        cur = next;
        len += 1;
    }
    len
}

/// Appends the minimum-length `VLQ-Long` encoding of `value` to `buf`.
pub fn write(buf: &mut Vec<u8>, value: i64) {
    let len = encoded_len(value);
    for i in (0..len).rev() {
        let byte = ((value >> (7 * i)) & 0x7f) as u8;
        buf.push(if i != 0 { byte | 0x80 } else { byte });
    }
}

/// Reads a `VLQ-Long` from the start of `buf`, returning the value and the
/// number of bytes consumed.
pub fn read(buf: &[u8]) -> Result<(i64, usize), CellError> {
    // Accumulate in i128: up to MAX_VLQ_LONG_LENGTH * 7 = 70 raw bits can be
    // written before sign-extension trims them back down to 64, which would
    // silently truncate in a 64-bit accumulator.
    let mut value: i128 = 0;
    let mut consumed = 0usize;
    let mut bits = 0usize;
    loop {
        if consumed >= buf.len() {
            return Err(CellError::VlqUnderrun);
        }
        if consumed >= MAX_VLQ_LONG_LENGTH {
            return Err(CellError::VlqOverflow);
        }
        let byte = buf[consumed];
        consumed += 1;
        bits += 7;
        value = (value << 7) | i128::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            break;
        }
    }

    // Sign-extend from the top bit actually written (bit 6 of the last group).
    if bits < 128 {
        let shift = 128 - bits;
        value = (value << shift) >> shift;
    }

    if value < i64::MIN as i128 || value > i64::MAX as i128 {
        return Err(CellError::VlqOverflow);
    }

    if consumed > 1 {
        let first_payload = buf[0] & 0x7f;
        let next_sign_bit = buf[1] & 0x40 != 0;
        let redundant_zero = first_payload == 0 && !next_sign_bit;
        let redundant_ones = first_payload == 0x7f && next_sign_bit;
        if redundant_zero || redundant_ones {
            return Err(CellError::NonMinimalVlq);
        }
    }

    Ok((value as i64, consumed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_byte_range_is_minus_64_to_63() {
        for v in [-64i64, -1, 0, 1, 63] {
            let mut buf = Vec::new();
            write(&mut buf, v);
            assert_eq!(buf.len(), 1, "value {v} should fit in one byte");
            assert_eq!(read(&buf).unwrap(), (v, 1));
        }
    }

    #[test]
    fn sixty_four_needs_two_bytes() {
        let mut buf = Vec::new();
        write(&mut buf, 64);
        assert_eq!(buf.len(), 2);
        assert_eq!(read(&buf).unwrap(), (64, 2));
    }

    #[test]
    fn minus_sixty_five_needs_two_bytes() {
        let mut buf = Vec::new();
        write(&mut buf, -65);
        assert_eq!(buf.len(), 2);
        assert_eq!(read(&buf).unwrap(), (-65, 2));
    }

    #[test]
    fn rejects_redundant_leading_zero_group() {
        // 0x80, 0x01: leading zero group, next byte's sign bit clear -> redundant.
        let buf = [0x80u8, 0x01];
        assert_eq!(read(&buf), Err(CellError::NonMinimalVlq));
    }

    #[test]
    fn rejects_redundant_leading_ones_group() {
        // 0xff, 0x7f: leading all-ones group, next byte's sign bit set -> redundant.
        let buf = [0xffu8, 0x7f];
        assert_eq!(read(&buf), Err(CellError::NonMinimalVlq));
    }

    #[test]
    fn extremes_round_trip() {
        for v in [i64::MIN, i64::MAX, 0, -1, 1] {
            let mut buf = Vec::new();
            write(&mut buf, v);
            assert_eq!(read(&buf).unwrap(), (v, buf.len()));
        }
    }

    proptest::proptest! {
        #[test]
        fn round_trips_for_any_i64(v in proptest::prelude::any::<i64>()) {
            let mut buf = Vec::new();
            write(&mut buf, v);
            let (decoded, consumed) = read(&buf).unwrap();
            proptest::prop_assert_eq!(decoded, v);
            proptest::prop_assert_eq!(consumed, buf.len());
            proptest::prop_assert_eq!(consumed, encoded_len(v));
        }
    }
}
