//! Variable-length quantity codecs.
//!
//! Two flavors, both minimum-length (non-canonical/redundant encodings are
//! rejected on read):
//!
//! - [`count`]: unsigned `VLQ-Count`, used for lengths, counts, and other
//!   non-negative magnitudes throughout the cell format.
//! - [`long`]: signed `VLQ-Long`, a reusable signed variable-length primitive
//!   sign-extended from the top bit of its last byte.
//!
//! Both codecs group 7 payload bits per byte, most-significant group first,
//! with the high bit of each byte acting as a "more bytes follow" flag.

pub mod count;
pub mod long;

/// Worst-case byte length for [`count::write`] (covers `0..=2^63-1`).
pub const MAX_VLQ_COUNT_LENGTH: usize = 10;

/// Worst-case byte length for [`long::write`] (covers `-2^63..=2^63-1`).
pub const MAX_VLQ_LONG_LENGTH: usize = 10;
