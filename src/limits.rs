//! Tunable limits and their canonical defaults.
//!
//! The `pub const` values are the normative defaults the wire-format
//! invariants in the crate-level docs are phrased against -- they are what
//! every encoder in this crate uses unless a caller explicitly threads a
//! narrower [`Limits`] through the stream framer. There is no environment
//! variable, CLI flag, or on-disk config file for any of this; embedders
//! that need a stricter bound (e.g. a light-client transport) construct a
//! [`Limits`] value directly.

/// A child whose canonical encoding is no longer than this is embedded
/// inline wherever it is referenced (if its kind is also embeddable).
pub const MAX_EMBEDDED_LENGTH: usize = 140;

/// Hard cap on a single cell's canonical encoding.
pub const LIMIT_ENCODING_LENGTH: usize = 8192;

/// Blob/string leaves up to this many bytes encode directly; larger values
/// must be represented as a tree of leaves.
pub const CHUNK_LENGTH: usize = 4096;

/// Branching factor for vector/map/string trees.
pub const TREE_ARITY: usize = 16;

/// Maximum number of entries in a map leaf before it must become a tree.
pub const MAP_LEAF_MAX_ENTRIES: usize = 8;

/// Maximum nested decode recursion depth. Chosen well above any tree this
/// crate can itself produce (`log16` of cell count), per the DoS posture
/// the format calls for.
pub const MAX_DECODE_DEPTH: usize = 64;

/// Upper bound on a whole stream frame (header + payload), distinct from and
/// larger than [`LIMIT_ENCODING_LENGTH`], which bounds a single cell only.
pub const MAX_FRAME_LENGTH: usize = (1 << 31) - 1;

/// A narrower set of limits an embedder can thread through the stream framer
/// (see [`crate::framing`]) without touching the canonical per-cell bounds
/// above, which the decoder always enforces regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_embedded_length: usize,
    pub limit_encoding_length: usize,
    pub chunk_length: usize,
    pub max_decode_depth: usize,
    pub max_frame_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_embedded_length: MAX_EMBEDDED_LENGTH,
            limit_encoding_length: LIMIT_ENCODING_LENGTH,
            chunk_length: CHUNK_LENGTH,
            max_decode_depth: MAX_DECODE_DEPTH,
            max_frame_length: MAX_FRAME_LENGTH,
        }
    }
}

impl Limits {
    /// A stricter profile suitable for a light-client transport: caps a
    /// whole stream frame at one per-cell encoding limit's worth of bytes.
    pub fn light_client() -> Self {
        Limits {
            max_frame_length: LIMIT_ENCODING_LENGTH * 4,
            ..Limits::default()
        }
    }
}
