//! Minimal two's-complement big-endian byte representation used by the
//! `BigInteger` cell kind -- values too large to fit the 8-byte `Long` form.

use std::sync::Arc;

/// Canonical minimal-length two's-complement bytes. Construction normalizes
/// away any redundant leading sign-extension byte, mirroring the rule
/// [`crate::vlq::long`] enforces at the bit level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BigInt(Arc<[u8]>);

impl BigInt {
    /// Builds a `BigInt` from already-minimal two's-complement bytes.
    /// `bytes` must be non-empty; callers that have an arbitrary (possibly
    /// redundant) byte string should go through [`BigInt::normalize`].
    pub fn from_minimal_bytes(bytes: Vec<u8>) -> Self {
        debug_assert!(!bytes.is_empty());
        debug_assert!(
            is_minimal(&bytes),
            "BigInt::from_minimal_bytes called with non-minimal bytes"
        );
        BigInt(bytes.into())
    }

    /// Strips redundant leading `0x00`/`0xFF` sign-extension bytes from an
    /// arbitrary two's-complement byte string.
    pub fn normalize(mut bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            bytes.push(0);
        }
        while bytes.len() > 1 {
            let (first, second) = (bytes[0], bytes[1]);
            let redundant_zero = first == 0x00 && second & 0x80 == 0;
            let redundant_ones = first == 0xFF && second & 0x80 != 0;
            if redundant_zero || redundant_ones {
                bytes.remove(0);
            } else {
                break;
            }
        }
        BigInt(bytes.into())
    }

    pub fn from_i128(value: i128) -> Self {
        let mut bytes = value.to_be_bytes().to_vec();
        BigInt::normalize_in_place(&mut bytes);
        BigInt(bytes.into())
    }

    fn normalize_in_place(bytes: &mut Vec<u8>) {
        while bytes.len() > 1 {
            let (first, second) = (bytes[0], bytes[1]);
            let redundant_zero = first == 0x00 && second & 0x80 == 0;
            let redundant_ones = first == 0xFF && second & 0x80 != 0;
            if redundant_zero || redundant_ones {
                bytes.remove(0);
            } else {
                break;
            }
        }
    }

    pub fn to_i128(&self) -> Option<i128> {
        if self.0.len() > 16 {
            return None;
        }
        let negative = self.0[0] & 0x80 != 0;
        let fill = if negative { 0xFFu8 } else { 0x00 };
        let mut buf = [fill; 16];
        let offset = 16 - self.0.len();
        buf[offset..].copy_from_slice(&self.0);
        Some(i128::from_be_bytes(buf))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_valid_minimal(bytes: &[u8]) -> bool {
        !bytes.is_empty() && is_minimal(bytes)
    }
}

pub(crate) fn is_minimal(bytes: &[u8]) -> bool {
    if bytes.len() <= 1 {
        return true;
    }
    let (first, second) = (bytes[0], bytes[1]);
    let redundant_zero = first == 0x00 && second & 0x80 == 0;
    let redundant_ones = first == 0xFF && second & 0x80 != 0;
    !(redundant_zero || redundant_ones)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_redundant_leading_zero() {
        let big = BigInt::normalize(vec![0x00, 0x01]);
        assert_eq!(big.as_bytes(), &[0x01]);
    }

    #[test]
    fn normalizes_redundant_leading_ones() {
        let big = BigInt::normalize(vec![0xFF, 0x80]);
        assert_eq!(big.as_bytes(), &[0x80]);
    }

    #[test]
    fn keeps_necessary_sign_byte() {
        // 0x00 0xFF is NOT redundant: dropping it would flip the sign.
        let big = BigInt::normalize(vec![0x00, 0xFF]);
        assert_eq!(big.as_bytes(), &[0x00, 0xFF]);
    }

    #[test]
    fn round_trips_through_i128() {
        for v in [0i128, -1, 1, i128::MIN, i128::MAX, 1 << 70, -(1 << 70)] {
            let big = BigInt::from_i128(v);
            assert_eq!(big.to_i128(), Some(v));
        }
    }
}
