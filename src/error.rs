// src/error.rs
use core::fmt;

use crate::hash::Hash;

/// Every failure mode the canonical encoder/decoder can raise.
///
/// All variants correspond to a canonicality invariant in the wire format:
/// an unknown tag, a malformed payload, or a violation of the embedded/
/// indirect discipline. Missing data (a hash absent from the in-message
/// dictionary and the store) is deliberately *not* part of this enum -- see
/// [`MissingData`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CellError {
    /// Leading tag byte does not match any registered cell kind.
    #[error("unknown tag byte 0x{0:02x}")]
    UnknownTag(u8),

    /// Payload ended before the grammar for this kind was satisfied.
    #[error("truncated payload: {0}")]
    Truncated(&'static str),

    /// Top-level read left bytes unconsumed.
    #[error("trailing data: {0} byte(s) left after parse")]
    TrailingData(usize),

    /// A VLQ-Count or VLQ-Long used more bytes than its minimum-length form requires.
    #[error("non-minimal VLQ encoding")]
    NonMinimalVlq,

    /// A VLQ decoded to a magnitude that does not fit in 64 bits.
    #[error("VLQ overflow past 64 bits")]
    VlqOverflow,

    /// A buffer ran out of bytes while a VLQ continuation bit was still set.
    #[error("VLQ buffer underrun")]
    VlqUnderrun,

    /// A non-embeddable (or oversized) child was spliced inline instead of referenced.
    #[error("non-embeddable child inlined instead of referenced (length {0})")]
    ShouldBeIndirect(usize),

    /// A single cell's canonical encoding exceeded `LIMIT_ENCODING_LENGTH`.
    #[error("encoding too large: {0} bytes (limit {1})")]
    EncodingTooLarge(usize, usize),

    /// Nested decode recursion exceeded `MAX_DECODE_DEPTH`.
    #[error("nested cell depth {0} exceeds limit {1}")]
    DepthExceeded(usize, usize),

    /// String payload was not valid UTF-8.
    #[error("invalid UTF-8 in string payload")]
    InvalidUtf8,

    /// Two distinct encodings in a multi-cell message hashed to the same value.
    #[error("duplicate hash with differing content: {0}")]
    DuplicateHash(Hash),

    /// A length-prefixed child in a multi-cell message decoded to a different
    /// length than its declared prefix claimed.
    #[error("child length mismatch: declared {declared}, actual {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// A descendant in a multi-cell message was embeddable and should never
    /// have been written as a length-prefixed entry (encoder redundancy).
    #[error("embeddable cell present as a multi-cell dictionary entry")]
    RedundantDictionaryEntry,

    /// A VLQ-Count length prefix (stream framing) would exceed the per-frame limit.
    #[error("frame length {0} exceeds limit {1}")]
    FrameTooLarge(usize, usize),
}

impl CellError {
    pub(crate) fn truncated(what: &'static str) -> Self {
        CellError::Truncated(what)
    }
}

/// Raised when a [`crate::refs::Ref::Indirect`] is dereferenced but its hash
/// is absent from both the in-message dictionary and the
/// [`crate::store::Store`].
///
/// Deliberately not a [`CellError`] variant: missing data is an expected,
/// recoverable condition -- the caller typically responds by issuing a data
/// request -- not malformed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingData(pub Hash);

impl fmt::Display for MissingData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing data for hash {}", self.0)
    }
}

impl std::error::Error for MissingData {}

pub type Result<T> = core::result::Result<T, CellError>;
