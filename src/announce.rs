//! Delta/novelty broadcast: per-peer tracking of which cells in a graph
//! still need to be sent, and durable persistence of a graph into a
//! [`crate::store::Store`].
//!
//! Both operations share a shape: a post-order walk that only descends into
//! resolved, non-embedded children (an embedded child's bytes already
//! travelled with its parent; there is nothing separate to send or store for
//! it), stopping early wherever the relevant [`StatusTable`] shows the
//! threshold has already been crossed.

use std::sync::Arc;

use tracing::debug;

use crate::cell::Cell;
use crate::refs::{Ref, Status, StatusTable};
use crate::store::Store;

/// Tracks, for one peer, which cells have already been announced to it.
#[derive(Debug, Default)]
pub struct Announcer {
    status: StatusTable,
}

impl Announcer {
    pub fn new() -> Self {
        Announcer {
            status: StatusTable::new(),
        }
    }

    /// Returns every cell reachable from `root` (including `root` itself)
    /// that has not yet been announced to this peer, and marks them all as
    /// announced. A second call with the same or a structurally overlapping
    /// `root` returns only the genuinely new part of the graph -- calling it
    /// twice on an unchanged `root` returns an empty list.
    ///
    /// Status is advanced in post-order (children before parents; see
    /// [`Announcer::visit`]), but the returned list is reordered so `root`
    /// -- if present at all -- is always element `0`, matching the wire
    /// contract [`crate::multicell::encode_delta`] expects: "the first
    /// element is the root, remaining elements length-prefixed." By
    /// monotonicity this reordering is sound: `root` only ever appears
    /// (hence only ever needs to move) when it was genuinely novel, and a
    /// novel root implies every descendant visited during this same call was
    /// also novel at the time it was visited.
    pub fn announce(&self, root: &Arc<Cell>) -> Vec<Arc<Cell>> {
        let mut novel = Vec::new();
        self.visit(root, &mut novel);
        if !novel.is_empty() {
            novel.rotate_right(1);
        }
        debug!(root = %root.hash(), novel = novel.len(), "computed announce delta");
        novel
    }

    fn visit(&self, cell: &Arc<Cell>, novel: &mut Vec<Arc<Cell>>) {
        for r in cell.child_refs() {
            if let Ref::Indirect {
                value: Some(child), ..
            } = r
            {
                self.visit(child, novel);
            }
        }
        let hash = cell.hash();
        let previous = self.status.advance(hash, Status::Announced);
        if previous < Status::Announced {
            novel.push(Arc::clone(cell));
        }
    }

    /// Current status this peer's table reports for `hash`.
    pub fn status_of(&self, hash: &crate::hash::Hash) -> Status {
        self.status.status(hash)
    }
}

/// Persists `cell` and every resolved, non-embedded descendant into `store`,
/// in post-order, skipping any subtree already recorded as
/// [`Status::Persisted`] or later in `status`. Returns the number of cells
/// newly written.
pub fn persist(cell: &Arc<Cell>, store: &mut dyn Store, status: &StatusTable) -> usize {
    let hash = cell.hash();
    if status.status(&hash) >= Status::Persisted {
        return 0;
    }
    let mut written = 0;
    for r in cell.child_refs() {
        if let Ref::Indirect {
            value: Some(child), ..
        } = r
        {
            written += persist(child, store, status);
        }
    }
    store.put(hash, cell.encoding().to_vec());
    status.advance(hash, Status::Persisted);
    debug!(hash = %hash, "persisted cell");
    written + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::limits::MAX_EMBEDDED_LENGTH;
    use crate::store::MemStore;

    fn big_blob(byte: u8) -> Arc<Cell> {
        Cell::blob(vec![byte; MAX_EMBEDDED_LENGTH + 1])
    }

    #[test]
    fn announcing_twice_is_idempotent() {
        let root = Cell::vector(vec![big_blob(1), big_blob(2)]).unwrap();
        let announcer = Announcer::new();
        let first = announcer.announce(&root);
        assert_eq!(first.len(), 3); // two indirect blobs + the root vector

        let second = announcer.announce(&root);
        assert!(second.is_empty());
    }

    #[test]
    fn embedded_children_are_not_announced_separately() {
        let root = Cell::vector(vec![Cell::long(1), Cell::long(2)]).unwrap();
        let announcer = Announcer::new();
        let novel = announcer.announce(&root);
        // The Longs are embedded in the vector's own bytes; only the root
        // itself is a separate announce-able unit.
        assert_eq!(novel.len(), 1);
        assert_eq!(novel[0].hash(), root.hash());
    }

    #[test]
    fn persisting_writes_every_indirect_descendant_once() {
        let shared = big_blob(9);
        let root = Cell::vector(vec![shared.clone(), shared.clone()]).unwrap();
        let status = StatusTable::new();
        let mut store = MemStore::new();
        let written = persist(&root, &mut store, &status);
        assert_eq!(written, 2); // root + one distinct shared blob
        assert_eq!(store.len(), 2);

        let again = persist(&root, &mut store, &status);
        assert_eq!(again, 0);
    }
}
