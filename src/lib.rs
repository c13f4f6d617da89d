//! Canonical binary encoding, content addressing and delta broadcast for
//! Convex lattice cells.
//!
//! A cell is the sole representable unit of the data model: an immutable
//! value with exactly one canonical byte encoding and, derived from that
//! encoding, a single 32-byte content hash. This crate implements:
//!
//! - [`vlq`]: the two variable-length integer codecs the wire format builds
//!   on (`VLQ-Count` unsigned, `VLQ-Long` signed).
//! - [`cell`]: the cell data model itself, its canonical encoder and
//!   decoder, and the tag byte registry.
//! - [`hash`]: content addressing.
//! - [`refs`]: child references and the per-hash status side table that
//!   tracks a cell's relationship to a peer or a store.
//! - [`multicell`]: whole-graph message framing with dictionary-based
//!   resolution of indirect descendants.
//! - [`announce`]: delta/novelty broadcast and durable persistence.
//! - [`framing`]: stream message-length framing.
//! - [`store`]: the storage interface cells are persisted through.
//! - [`limits`]: the canonical size and depth bounds every encoder and
//!   decoder in this crate enforces.

pub mod announce;
pub mod cell;
pub mod error;
pub mod framing;
pub mod hash;
pub mod limits;
pub mod multicell;
pub mod refs;
pub mod store;
pub mod vlq;

pub use cell::{BigInt, Cell, CellData};
pub use error::{CellError, MissingData};
pub use hash::Hash;
pub use refs::{Ref, ResolveCache, Status, StatusTable};

/// Parses a single top-level cell, requiring every byte of `bytes` to be
/// consumed. A thin convenience wrapper over [`Cell::read`] for callers that
/// would otherwise need to import [`cell`] just to reach it.
pub fn decode(bytes: &[u8]) -> error::Result<Cell> {
    Cell::read(bytes)
}

/// Encodes `cell` to its canonical byte form.
pub fn encode(cell: &Cell) -> &[u8] {
    cell.encoding()
}
