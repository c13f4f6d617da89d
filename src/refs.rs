//! Child references and the per-hash status side table.
//!
//! A `Ref` is the runtime handle a parent cell holds for each child slot: it
//! is either [`Ref::Embedded`] (the child's full value is always at hand) or
//! [`Ref::Indirect`] (only the child's hash is known for certain; the value
//! may or may not be resident). Status -- whether a cell has been announced
//! to a peer or persisted to the store -- is deliberately *not* a field on
//! [`crate::cell::Cell`] or `Ref`: it is per-peer, mutable, and orthogonal to
//! the cell's own immutable identity, so it lives in a side table keyed by
//! hash instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use crate::cell::Cell;
use crate::error::MissingData;
use crate::hash::Hash;
use crate::store::Store;

/// A child reference: the encoder's embedded/indirect decision, preserved at
/// runtime so the decoder's output is distinguishable from a value built by
/// hand with the "wrong" representation for its size.
#[derive(Debug, Clone)]
pub enum Ref {
    /// The child's canonical encoding was spliced inline; the value is
    /// always resident.
    Embedded(Arc<Cell>),
    /// The child is represented by its hash. `value` is `Some` once the
    /// referenced cell has been resolved (via a multi-cell dictionary or a
    /// [`crate::store::Store`] lookup), `None` while only the hash is known.
    Indirect {
        hash: Hash,
        value: Option<Arc<Cell>>,
    },
}

impl Ref {
    pub fn embedded(cell: Cell) -> Self {
        Ref::Embedded(Arc::new(cell))
    }

    pub fn indirect(hash: Hash) -> Self {
        Ref::Indirect { hash, value: None }
    }

    pub fn resolved(hash: Hash, cell: Arc<Cell>) -> Self {
        Ref::Indirect {
            hash,
            value: Some(cell),
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, Ref::Embedded(_))
    }

    /// The child's hash, computing and caching it for embedded refs on demand.
    pub fn hash(&self) -> Hash {
        match self {
            Ref::Embedded(cell) => cell.hash(),
            Ref::Indirect { hash, .. } => *hash,
        }
    }

    /// The resident value, if any.
    pub fn value(&self) -> Option<&Arc<Cell>> {
        match self {
            Ref::Embedded(cell) => Some(cell),
            Ref::Indirect { value, .. } => value.as_ref(),
        }
    }

    /// Current lifecycle status of this reference: embedded refs are always
    /// [`Status::Embedded`]; indirect refs report [`Status::Direct`] if a
    /// value is resident and [`Status::Stored`] otherwise (the canonical
    /// meaning of "stored" here is "known only by hash, presumed retrievable
    /// from the store").
    pub fn status(&self) -> Status {
        match self {
            Ref::Embedded(_) => Status::Embedded,
            Ref::Indirect { value: Some(_), .. } => Status::Direct,
            Ref::Indirect { value: None, .. } => Status::Stored,
        }
    }
}

impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}
impl Eq for Ref {}

/// Monotonically-advancing lifecycle of a cell's relationship to a peer or a
/// store. Ordinal order matters: [`StatusTable::advance`] only ever moves a
/// hash's recorded status forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Status {
    Embedded = 0,
    Direct = 1,
    Stored = 2,
    Persisted = 3,
    Announced = 4,
}

impl Status {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Status::Embedded,
            1 => Status::Direct,
            2 => Status::Stored,
            3 => Status::Persisted,
            _ => Status::Announced,
        }
    }
}

/// Per-peer (or per-store) monotonic status side table, keyed by hash.
///
/// Concurrent callers racing to advance the same hash's status use
/// `fetch_max` on the slot's atomic: losers simply observe that the work was
/// already done. A weaker "eventually maximum" semantics is acceptable
/// because status never decreases, so the worst case under a race is one
/// redundant re-emit.
#[derive(Debug, Default)]
pub struct StatusTable {
    slots: RwLock<HashMap<Hash, AtomicU8>>,
}

impl StatusTable {
    pub fn new() -> Self {
        StatusTable {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Current status for `hash`, or [`Status::Embedded`] (the lowest rung)
    /// if nothing has been recorded yet.
    pub fn status(&self, hash: &Hash) -> Status {
        let slots = self.slots.read().expect("status table lock poisoned");
        slots
            .get(hash)
            .map(|slot| Status::from_u8(slot.load(Ordering::Acquire)))
            .unwrap_or(Status::Embedded)
    }

    /// Advances `hash`'s recorded status to at least `new`, returning the
    /// status that was recorded *before* this call (so callers can tell
    /// whether they were the one to cross a threshold, e.g. into
    /// `Announced`).
    pub fn advance(&self, hash: Hash, new: Status) -> Status {
        {
            let slots = self.slots.read().expect("status table lock poisoned");
            if let Some(slot) = slots.get(&hash) {
                let previous = slot.fetch_max(new as u8, Ordering::AcqRel);
                return Status::from_u8(previous);
            }
        }
        let mut slots = self.slots.write().expect("status table lock poisoned");
        let slot = slots
            .entry(hash)
            .or_insert_with(|| AtomicU8::new(Status::Embedded as u8));
        let previous = slot.fetch_max(new as u8, Ordering::AcqRel);
        Status::from_u8(previous)
    }
}

/// An in-process cache of indirect refs already resolved to a value,
/// consulted before falling through to a [`Store`]: in-process cache first,
/// then the store, with [`MissingData`] surfaced only once both have been
/// tried.
#[derive(Debug, Default)]
pub struct ResolveCache {
    cells: RwLock<HashMap<Hash, Arc<Cell>>>,
}

impl ResolveCache {
    pub fn new() -> Self {
        ResolveCache::default()
    }

    /// Resolves `r` to its value. Embedded refs and already-resolved
    /// indirect refs return immediately; an unresolved indirect ref is
    /// looked up in this cache, then in `store`, with a hit in the latter
    /// cached for subsequent calls. Fails with [`MissingData`] when neither
    /// holds the hash.
    ///
    /// Decoding a store hit is expected to always succeed: every entry a
    /// well-behaved [`Store`] returns is, by the content-addressing
    /// invariant, the unique canonical encoding that hashes to the key it
    /// was stored under.
    pub fn resolve(
        &self,
        r: &Ref,
        store: &dyn Store,
    ) -> std::result::Result<Arc<Cell>, MissingData> {
        match r {
            Ref::Embedded(cell) => Ok(Arc::clone(cell)),
            Ref::Indirect {
                value: Some(cell), ..
            } => Ok(Arc::clone(cell)),
            Ref::Indirect { hash, value: None } => {
                if let Some(cached) = self.cells.read().expect("cache lock poisoned").get(hash) {
                    return Ok(Arc::clone(cached));
                }
                let bytes = store.get(hash).ok_or(MissingData(*hash))?;
                let cell = Arc::new(
                    Cell::read(&bytes).expect("store entry must be a canonical encoding"),
                );
                self.cells
                    .write()
                    .expect("cache lock poisoned")
                    .insert(*hash, Arc::clone(&cell));
                Ok(cell)
            }
        }
    }
}
