//! The cell data model: the sole representable unit in the lattice, along
//! with its lazily-cached canonical encoding and content hash.

pub mod bigint;
pub mod decode;
pub mod encode;
pub mod tag;

use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::error::{CellError, Result};
use crate::hash::Hash;
use crate::refs::Ref;

pub use bigint::BigInt;
pub use tag::Kind;

/// The structural content of a cell, independent of its (lazily computed)
/// encoding and hash. See the crate-level data model for the wire grammar
/// each variant corresponds to.
///
/// `PartialEq` is implemented by hand rather than derived: `Double` must
/// compare by bit pattern (`f64::to_bits`), not `f64`'s own `==`, or two
/// cells holding the canonicalized `NaN` (§3 invariant: one bit pattern for
/// all `NaN`s) would compare unequal to themselves and break
/// `decode(encode(c)) == c` (§8 property 1) for every `Double(NaN)` cell.
#[derive(Debug, Clone)]
pub enum CellData {
    Null,
    Bool(bool),
    /// A 4-bit flag value, `0..=15`, distinct from `Bool`.
    ByteFlag(u8),
    Long(i64),
    Double(f64),
    BigInt(BigInt),
    StringShort(Arc<str>),
    StringTree {
        char_count: u64,
        children: Vec<Ref>,
    },
    Symbol(Arc<str>),
    Keyword(Arc<str>),
    BlobLeaf(Arc<[u8]>),
    BlobTree {
        byte_length: u64,
        children: Vec<Ref>,
    },
    /// Up to 16 elements plus an optional 17th "tail" ref used when a
    /// vector's size sits just above a tree boundary.
    VectorLeaf(Vec<Ref>),
    VectorTree {
        shift: u32,
        count: u64,
        children: Vec<Ref>,
    },
    /// Up to 8 `(key, value)` pairs in insertion-independent canonical
    /// order (keys sorted by hash).
    MapLeaf(Vec<(Ref, Ref)>),
    MapTree {
        bitmap: u16,
        count: u64,
        children: Vec<Ref>,
    },
    Index {
        prefix: Arc<[u8]>,
        children: Vec<Ref>,
    },
    Address(u64),
    Record {
        kind: u8,
        fields: Vec<Ref>,
    },
    Signed {
        account_key: [u8; 32],
        signature: [u8; 64],
        value: Ref,
    },
}

impl PartialEq for CellData {
    fn eq(&self, other: &Self) -> bool {
        use CellData::*;
        match (self, other) {
            (Null, Null) => true,
            (Bool(a), Bool(b)) => a == b,
            (ByteFlag(a), ByteFlag(b)) => a == b,
            (Long(a), Long(b)) => a == b,
            // Compare by bit pattern, not `f64::eq`: `NaN != NaN` under IEEE
            // 754 equality would make a canonicalized `NaN` cell unequal to
            // itself.
            (Double(a), Double(b)) => a.to_bits() == b.to_bits(),
            (BigInt(a), BigInt(b)) => a == b,
            (StringShort(a), StringShort(b)) => a == b,
            (
                StringTree {
                    char_count: c1,
                    children: ch1,
                },
                StringTree {
                    char_count: c2,
                    children: ch2,
                },
            ) => c1 == c2 && ch1 == ch2,
            (Symbol(a), Symbol(b)) => a == b,
            (Keyword(a), Keyword(b)) => a == b,
            (BlobLeaf(a), BlobLeaf(b)) => a == b,
            (
                BlobTree {
                    byte_length: l1,
                    children: ch1,
                },
                BlobTree {
                    byte_length: l2,
                    children: ch2,
                },
            ) => l1 == l2 && ch1 == ch2,
            (VectorLeaf(a), VectorLeaf(b)) => a == b,
            (
                VectorTree {
                    shift: s1,
                    count: c1,
                    children: ch1,
                },
                VectorTree {
                    shift: s2,
                    count: c2,
                    children: ch2,
                },
            ) => s1 == s2 && c1 == c2 && ch1 == ch2,
            (MapLeaf(a), MapLeaf(b)) => a == b,
            (
                MapTree {
                    bitmap: b1,
                    count: c1,
                    children: ch1,
                },
                MapTree {
                    bitmap: b2,
                    count: c2,
                    children: ch2,
                },
            ) => b1 == b2 && c1 == c2 && ch1 == ch2,
            (
                Index {
                    prefix: p1,
                    children: ch1,
                },
                Index {
                    prefix: p2,
                    children: ch2,
                },
            ) => p1 == p2 && ch1 == ch2,
            (Address(a), Address(b)) => a == b,
            (
                Record {
                    kind: k1,
                    fields: f1,
                },
                Record {
                    kind: k2,
                    fields: f2,
                },
            ) => k1 == k2 && f1 == f2,
            (
                Signed {
                    account_key: k1,
                    signature: s1,
                    value: v1,
                },
                Signed {
                    account_key: k2,
                    signature: s2,
                    value: v2,
                },
            ) => k1 == k2 && s1 == s2 && v1 == v2,
            _ => false,
        }
    }
}

impl CellData {
    pub fn kind(&self) -> Kind {
        match self {
            CellData::Null => Kind::Null,
            CellData::Bool(_) => Kind::Bool,
            CellData::ByteFlag(_) => Kind::ByteFlag,
            CellData::Long(_) => Kind::Long,
            CellData::Double(_) => Kind::Double,
            CellData::BigInt(_) => Kind::BigInt,
            CellData::StringShort(_) => Kind::StringShort,
            CellData::StringTree { .. } => Kind::StringTree,
            CellData::Symbol(_) => Kind::Symbol,
            CellData::Keyword(_) => Kind::Keyword,
            CellData::BlobLeaf(_) => Kind::BlobLeaf,
            CellData::BlobTree { .. } => Kind::BlobTree,
            CellData::VectorLeaf(_) => Kind::VectorLeaf,
            CellData::VectorTree { .. } => Kind::VectorTree,
            CellData::MapLeaf(_) => Kind::MapLeaf,
            CellData::MapTree { .. } => Kind::MapTree,
            CellData::Index { .. } => Kind::Index,
            CellData::Address(_) => Kind::Address,
            CellData::Record { .. } => Kind::Record,
            CellData::Signed { .. } => Kind::Signed,
        }
    }

    /// Direct children of this cell, in wire order. Used by the multi-cell
    /// framer and the announcer to traverse the graph.
    pub fn child_refs(&self) -> Vec<&Ref> {
        match self {
            CellData::StringTree { children, .. }
            | CellData::BlobTree { children, .. }
            | CellData::VectorLeaf(children)
            | CellData::VectorTree { children, .. }
            | CellData::MapTree { children, .. }
            | CellData::Index { children, .. } => children.iter().collect(),
            CellData::MapLeaf(entries) => entries.iter().flat_map(|(k, v)| [k, v]).collect(),
            CellData::Record { fields, .. } => fields.iter().collect(),
            CellData::Signed { value, .. } => vec![value],
            _ => Vec::new(),
        }
    }
}

/// The sole representable unit of the data model: an immutable value with a
/// canonical byte encoding and a 32-byte content hash, both computed lazily
/// and cached on first demand.
#[derive(Debug, Clone)]
pub struct Cell {
    data: CellData,
    encoding: OnceCell<Arc<[u8]>>,
    hash: OnceCell<Hash>,
}

impl PartialEq for Cell {
    fn eq(&self, other: &Self) -> bool {
        // Two cells are equal iff their hashes are equal iff their
        // canonical encodings are equal (invariant 7); comparing `data`
        // directly is equivalent and avoids forcing encoding on every
        // comparison.
        self.data == other.data
    }
}
impl Eq for Cell {}

impl Cell {
    pub fn new(data: CellData) -> Self {
        Cell {
            data,
            encoding: OnceCell::new(),
            hash: OnceCell::new(),
        }
    }

    pub fn data(&self) -> &CellData {
        &self.data
    }

    pub fn kind(&self) -> Kind {
        self.data.kind()
    }

    pub fn child_refs(&self) -> Vec<&Ref> {
        self.data.child_refs()
    }

    /// This cell's canonical encoding, computed and cached on first demand.
    pub fn encoding(&self) -> &[u8] {
        self.encoding
            .get_or_init(|| Arc::from(encode::encode_cell(self)))
    }

    pub fn encoding_length(&self) -> usize {
        self.encoding().len()
    }

    /// `SHA3-256` of this cell's canonical encoding, computed and cached on
    /// first demand.
    pub fn hash(&self) -> Hash {
        *self.hash.get_or_init(|| Hash::of(self.encoding()))
    }

    /// Whether this cell is eligible to be embedded wherever it is
    /// referenced: its kind must be embeddable and its own encoding must fit
    /// within [`crate::limits::MAX_EMBEDDED_LENGTH`].
    pub fn is_embeddable(&self) -> bool {
        self.kind().embeddable() && self.encoding_length() <= crate::limits::MAX_EMBEDDED_LENGTH
    }

    /// Builds the [`Ref`] this cell should be stored as inside a parent's
    /// child slot: embedded if eligible, indirect (by hash) otherwise.
    pub fn as_ref_for_parent(self: &Arc<Self>) -> Ref {
        if self.is_embeddable() {
            Ref::Embedded(Arc::clone(self))
        } else {
            Ref::resolved(self.hash(), Arc::clone(self))
        }
    }

    /// Parses a single top-level cell from `bytes`, requiring every byte to
    /// be consumed (invariant 1; see [`decode::decode_cell`] for the
    /// recursive/partial form used by child slots).
    pub fn read(bytes: &[u8]) -> Result<Cell> {
        if bytes.is_empty() {
            return Err(CellError::Truncated("empty top-level read"));
        }
        let (cell, consumed) = decode::decode_cell(bytes, 0)?;
        if consumed != bytes.len() {
            return Err(CellError::TrailingData(bytes.len() - consumed));
        }
        if consumed > crate::limits::LIMIT_ENCODING_LENGTH {
            return Err(CellError::EncodingTooLarge(
                consumed,
                crate::limits::LIMIT_ENCODING_LENGTH,
            ));
        }
        Ok(cell)
    }

    /// Total unique cells reachable from `self` via refs, counting `self`.
    /// Used as a structural assertion in tests: a faithful multi-cell
    /// round-trip must preserve this count.
    pub fn total_ref_count(self: &Arc<Self>) -> usize {
        let mut seen = std::collections::HashSet::new();
        count_unique(self, &mut seen);
        seen.len()
    }

    // --- Convenience constructors -----------------------------------------

    pub fn null() -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Null))
    }

    pub fn bool(v: bool) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Bool(v)))
    }

    pub fn byte_flag(v: u8) -> Arc<Cell> {
        assert!(
            (0x02..=0x0F).contains(&v),
            "byte flag nibble 0x0 and 0x1 are reserved for Bool"
        );
        Arc::new(Cell::new(CellData::ByteFlag(v)))
    }

    pub fn long(v: i64) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Long(v)))
    }

    pub fn double(v: f64) -> Arc<Cell> {
        // Canonicalize NaN to a single bit pattern so equal-as-values NaNs
        // hash identically (invariant: a single cell value maps to a single
        // byte string).
        let v = if v.is_nan() { f64::NAN } else { v };
        Arc::new(Cell::new(CellData::Double(v)))
    }

    /// Builds a string cell. Strings whose UTF-8 byte length exceeds
    /// [`crate::limits::CHUNK_LENGTH`] are chunked at `char` boundaries into a
    /// `StringTree` instead of a single oversized `StringShort` leaf.
    pub fn string(s: impl Into<Arc<str>>) -> Arc<Cell> {
        build_string(s.into())
    }

    pub fn symbol(s: impl Into<Arc<str>>) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Symbol(s.into())))
    }

    pub fn keyword(s: impl Into<Arc<str>>) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Keyword(s.into())))
    }

    /// Builds a blob cell. Blobs longer than [`crate::limits::CHUNK_LENGTH`]
    /// are split into fixed-size leaves and assembled into a `BlobTree`
    /// instead of a single oversized `BlobLeaf`.
    pub fn blob(bytes: impl Into<Arc<[u8]>>) -> Arc<Cell> {
        build_blob(bytes.into())
    }

    pub fn address(account: u64) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Address(account)))
    }

    /// Builds a `BigInteger` cell for a value too large to fit `Long`'s
    /// 8-byte range. Values that do fit `i64` must go through [`Cell::long`]
    /// instead: the wire format only has one canonical encoding per integer
    /// value, so `BigInteger`'s minimal byte form is never allowed to be
    /// 8 bytes or shorter (§3 invariant: `VLQ-Count length >= 9`).
    pub fn big_int(value: i128) -> Arc<Cell> {
        assert!(
            value < i64::MIN as i128 || value > i64::MAX as i128,
            "value {value} fits in i64; use Cell::long instead of Cell::big_int"
        );
        Arc::new(Cell::new(CellData::BigInt(BigInt::from_i128(value))))
    }

    /// Builds a fixed-kind `Record`: `kind` selects one of the 16 record tags
    /// (`0xE0..=0xEF`, excluding `0xEA` which `Address` owns), `fields` are
    /// its positional child values in wire order.
    pub fn record(kind: u8, fields: Vec<Arc<Cell>>) -> Arc<Cell> {
        assert!(kind <= 0x0F, "record kind {kind:#x} out of range 0x0..=0xF");
        assert_ne!(kind, 0x0A, "record kind 0x0A collides with the Address tag");
        let fields = fields.iter().map(|c| c.as_ref_for_parent()).collect();
        Arc::new(Cell::new(CellData::Record { kind, fields }))
    }

    /// Wraps `value` in a `Signed` envelope: a 32-byte account key, a
    /// 64-byte signature, and a ref to the signed value itself.
    pub fn signed(account_key: [u8; 32], signature: [u8; 64], value: &Arc<Cell>) -> Arc<Cell> {
        Arc::new(Cell::new(CellData::Signed {
            account_key,
            signature,
            value: value.as_ref_for_parent(),
        }))
    }

    /// Builds a vector from already-constructed child cells, wrapping each
    /// one in the correct embedded/indirect [`Ref`]. Up to
    /// [`crate::limits::TREE_ARITY`] elements encode as a flat `VectorLeaf`;
    /// more elements are grouped into a `VectorTree` of `VectorLeaf` buckets.
    pub fn vector(items: Vec<Arc<Cell>>) -> Result<Arc<Cell>> {
        Ok(build_vector(items))
    }

    /// Builds a map from already-constructed key/value cells, keys sorted by
    /// hash for canonical ordering. Up to
    /// [`crate::limits::MAP_LEAF_MAX_ENTRIES`] entries encode as a flat
    /// `MapLeaf`; more entries are bucketed into a `MapTree` keyed by
    /// successive nibbles of each key's hash (the same nibble-bucketing a
    /// Patricia trie uses to branch).
    pub fn map(entries: Vec<(Arc<Cell>, Arc<Cell>)>) -> Result<Arc<Cell>> {
        Ok(build_map(entries, 0))
    }

    /// Builds a byte-keyed index: `keys` are sorted, their longest common
    /// prefix is factored out into the cell's own `prefix` field, and each
    /// entry's remaining key suffix is stored as a `BlobLeaf` paired with its
    /// value, alternating in `children` the same way [`CellData::MapLeaf`]
    /// alternates key and value refs.
    pub fn index(mut entries: Vec<(Vec<u8>, Arc<Cell>)>) -> Result<Arc<Cell>> {
        entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        let keys: Vec<&[u8]> = entries.iter().map(|(k, _)| k.as_slice()).collect();
        let prefix = longest_common_prefix(&keys);

        let mut children = Vec::with_capacity(entries.len() * 2);
        for (key, value) in &entries {
            let suffix = Cell::blob(key[prefix.len()..].to_vec());
            children.push(suffix.as_ref_for_parent());
            children.push(value.as_ref_for_parent());
        }
        Ok(Arc::new(Cell::new(CellData::Index {
            prefix: Arc::from(prefix.as_slice()),
            children,
        })))
    }

    /// Whether this `Index` cell has an entry for `key`. `false` for any
    /// other cell kind.
    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// The value associated with `key` in this `Index` cell, or `None` if
    /// this cell is not an `Index`, `key` doesn't share the cell's prefix, or
    /// no entry matches -- including when the matching entry's value is an
    /// unresolved indirect ref.
    pub fn get(&self, key: &[u8]) -> Option<Arc<Cell>> {
        let CellData::Index { prefix, children } = self.data() else {
            return None;
        };
        let suffix = key.strip_prefix(prefix.as_ref())?;
        children.chunks_exact(2).find_map(|pair| {
            let matches = match pair[0].value()?.data() {
                CellData::BlobLeaf(bytes) => bytes.as_ref() == suffix,
                _ => false,
            };
            matches.then(|| pair[1].value().cloned()).flatten()
        })
    }
}

/// Longest shared prefix of `keys`, empty if `keys` is empty or any key is
/// empty.
fn longest_common_prefix(keys: &[&[u8]]) -> Vec<u8> {
    let Some((first, rest)) = keys.split_first() else {
        return Vec::new();
    };
    let mut len = first.len();
    for key in rest {
        len = len.min(key.len());
        len = first
            .iter()
            .zip(key.iter())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
        if len == 0 {
            break;
        }
    }
    first[..len].to_vec()
}

fn build_blob(bytes: Arc<[u8]>) -> Arc<Cell> {
    if bytes.len() <= crate::limits::CHUNK_LENGTH {
        return Arc::new(Cell::new(CellData::BlobLeaf(bytes)));
    }
    let byte_length = bytes.len() as u64;
    let mut level: Vec<Arc<Cell>> = bytes
        .chunks(crate::limits::CHUNK_LENGTH)
        .map(|chunk| Arc::new(Cell::new(CellData::BlobLeaf(Arc::from(chunk)))))
        .collect();
    while level.len() > crate::limits::TREE_ARITY {
        level = level
            .chunks(crate::limits::TREE_ARITY)
            .map(|group| {
                let byte_length = group.iter().map(|c| blob_byte_length(c)).sum();
                let children = group.iter().map(|c| c.as_ref_for_parent()).collect();
                Arc::new(Cell::new(CellData::BlobTree {
                    byte_length,
                    children,
                }))
            })
            .collect();
    }
    let children = level.iter().map(|c| c.as_ref_for_parent()).collect();
    Arc::new(Cell::new(CellData::BlobTree {
        byte_length,
        children,
    }))
}

fn blob_byte_length(cell: &Cell) -> u64 {
    match cell.data() {
        CellData::BlobLeaf(bytes) => bytes.len() as u64,
        CellData::BlobTree { byte_length, .. } => *byte_length,
        other => unreachable!("blob tree construction only nests blob cells, got {other:?}"),
    }
}

fn build_string(s: Arc<str>) -> Arc<Cell> {
    if s.len() <= crate::limits::CHUNK_LENGTH {
        return Arc::new(Cell::new(CellData::StringShort(s)));
    }
    let char_count = s.chars().count() as u64;
    let mut level: Vec<Arc<Cell>> = Vec::new();
    let mut rest: &str = s.as_ref();
    while !rest.is_empty() {
        let split = char_boundary_at_or_before(rest, crate::limits::CHUNK_LENGTH);
        let (chunk, remainder) = rest.split_at(split);
        level.push(Arc::new(Cell::new(CellData::StringShort(Arc::from(
            chunk,
        )))));
        rest = remainder;
    }
    while level.len() > crate::limits::TREE_ARITY {
        level = level
            .chunks(crate::limits::TREE_ARITY)
            .map(|group| {
                let char_count = group.iter().map(|c| string_char_count(c)).sum();
                let children = group.iter().map(|c| c.as_ref_for_parent()).collect();
                Arc::new(Cell::new(CellData::StringTree {
                    char_count,
                    children,
                }))
            })
            .collect();
    }
    let children = level.iter().map(|c| c.as_ref_for_parent()).collect();
    Arc::new(Cell::new(CellData::StringTree {
        char_count,
        children,
    }))
}

/// Largest `i <= max_bytes.min(s.len())` that lands on a UTF-8 char boundary.
fn char_boundary_at_or_before(s: &str, max_bytes: usize) -> usize {
    let mut idx = max_bytes.min(s.len());
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn string_char_count(cell: &Cell) -> u64 {
    match cell.data() {
        CellData::StringShort(s) => s.chars().count() as u64,
        CellData::StringTree { char_count, .. } => *char_count,
        other => unreachable!("string tree construction only nests string cells, got {other:?}"),
    }
}

fn build_vector(items: Vec<Arc<Cell>>) -> Arc<Cell> {
    if items.len() <= crate::limits::TREE_ARITY {
        let refs = items.iter().map(|c| c.as_ref_for_parent()).collect();
        return Arc::new(Cell::new(CellData::VectorLeaf(refs)));
    }
    let mut level: Vec<Arc<Cell>> = items
        .chunks(crate::limits::TREE_ARITY)
        .map(|chunk| {
            let refs = chunk.iter().map(|c| c.as_ref_for_parent()).collect();
            Arc::new(Cell::new(CellData::VectorLeaf(refs)))
        })
        .collect();
    let mut shift = 4u32;
    while level.len() > crate::limits::TREE_ARITY {
        level = level
            .chunks(crate::limits::TREE_ARITY)
            .map(|chunk| {
                let count = chunk.iter().map(|c| vector_count(c)).sum();
                let children = chunk.iter().map(|c| c.as_ref_for_parent()).collect();
                Arc::new(Cell::new(CellData::VectorTree {
                    shift,
                    count,
                    children,
                }))
            })
            .collect();
        shift += 4;
    }
    let count = level.iter().map(|c| vector_count(c)).sum();
    let children = level.iter().map(|c| c.as_ref_for_parent()).collect();
    Arc::new(Cell::new(CellData::VectorTree {
        shift,
        count,
        children,
    }))
}

fn vector_count(cell: &Cell) -> u64 {
    match cell.data() {
        CellData::VectorLeaf(refs) => refs.len() as u64,
        CellData::VectorTree { count, .. } => *count,
        other => unreachable!("vector tree construction only nests vector cells, got {other:?}"),
    }
}

/// Builds a `MapLeaf` once `entries` is small enough, otherwise buckets
/// entries by successive nibbles of their key's hash into a `MapTree`.
/// `level` is the nibble index (0 = most significant nibble of the hash's
/// first byte); bounded by the hash's own length, so even a pathological run
/// of colliding key hashes terminates in a single oversized leaf rather than
/// recursing forever.
fn build_map(mut entries: Vec<(Arc<Cell>, Arc<Cell>)>, level: usize) -> Arc<Cell> {
    let exhausted_nibbles = level >= crate::hash::HASH_LENGTH * 2;
    if entries.len() <= crate::limits::MAP_LEAF_MAX_ENTRIES || exhausted_nibbles {
        entries.sort_by_key(|(k, _)| k.hash());
        let refs = entries
            .iter()
            .map(|(k, v)| (k.as_ref_for_parent(), v.as_ref_for_parent()))
            .collect();
        return Arc::new(Cell::new(CellData::MapLeaf(refs)));
    }
    let count = entries.len() as u64;
    let mut buckets: Vec<Vec<(Arc<Cell>, Arc<Cell>)>> =
        (0..crate::limits::TREE_ARITY).map(|_| Vec::new()).collect();
    for (k, v) in entries {
        let nibble = nibble_of(&k.hash(), level);
        buckets[nibble as usize].push((k, v));
    }
    let mut bitmap = 0u16;
    let mut children = Vec::new();
    for (i, bucket) in buckets.into_iter().enumerate() {
        if !bucket.is_empty() {
            bitmap |= 1 << i;
            let node = build_map(bucket, level + 1);
            children.push(node.as_ref_for_parent());
        }
    }
    Arc::new(Cell::new(CellData::MapTree {
        bitmap,
        count,
        children,
    }))
}

fn nibble_of(hash: &Hash, level: usize) -> u8 {
    let byte = hash.as_bytes()[level / 2];
    if level % 2 == 0 {
        byte >> 4
    } else {
        byte & 0x0F
    }
}

fn count_unique(cell: &Arc<Cell>, seen: &mut std::collections::HashSet<Hash>) {
    if !seen.insert(cell.hash()) {
        return;
    }
    for r in cell.child_refs() {
        if let Some(child) = r.value() {
            count_unique(child, seen);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_cells_hash_identically() {
        let a = Cell::long(42);
        let b = Cell::long(42);
        assert_eq!(a, b);
        assert_eq!(a.hash(), b.hash());
    }

    #[test]
    fn nan_is_canonicalized() {
        let a = Cell::double(f64::NAN);
        let b = Cell::double(-f64::NAN);
        assert_eq!(a.encoding(), b.encoding());
    }

    #[test]
    fn nan_double_round_trips_through_decode() {
        let original = Cell::double(f64::NAN);
        let decoded = Cell::read(original.encoding()).unwrap();
        // Must hold by value (invariant 1, §8): a derived `PartialEq` on
        // `CellData` would compare the NaN payloads with `f64::eq` and fail
        // this even though the two cells encode identically.
        assert_eq!(decoded.data(), original.data());
        assert_eq!(decoded, *original);
        assert_eq!(decoded.hash(), original.hash());
    }

    #[test]
    fn total_ref_count_dedupes_shared_children() {
        let shared = Cell::long(1);
        let v = Cell::vector(vec![shared.clone(), shared.clone()]).unwrap();
        // 1 (vector) + 1 (the single distinct Long child, deduplicated).
        assert_eq!(v.total_ref_count(), 2);
    }

    #[test]
    fn index_with_an_empty_key_has_no_common_prefix() {
        // An empty key forces the shared prefix to be empty, since nothing
        // can share more bytes than the shortest key has.
        let index = Cell::index(vec![
            (vec![], Cell::long(0)),
            (vec![0x0a], Cell::long(1)),
            (vec![0x0a, 0x56], Cell::long(2)),
            (vec![0x0a, 0x79], Cell::long(3)),
        ])
        .unwrap();
        assert!(matches!(index.data(), CellData::Index { prefix, .. } if prefix.is_empty()));
        assert!(index.contains_key(&[0x0a, 0x79]));
        assert!(!index.contains_key(&[0x0a, 0x7a]));
        assert_eq!(index.get(&[0x0a, 0x56]).unwrap().data(), Cell::long(2).data());
    }

    #[test]
    fn index_factors_out_a_shared_prefix() {
        let index = Cell::index(vec![
            (b"prefix/a".to_vec(), Cell::long(1)),
            (b"prefix/b".to_vec(), Cell::long(2)),
        ])
        .unwrap();
        match index.data() {
            CellData::Index { prefix, .. } => assert_eq!(prefix.as_ref(), b"prefix/"),
            other => panic!("expected Index, got {other:?}"),
        }
        assert!(index.contains_key(b"prefix/a"));
        assert!(!index.contains_key(b"other"));
    }

    #[test]
    fn blob_at_chunk_length_is_a_leaf_one_byte_past_is_a_tree() {
        let at_boundary = Cell::blob(vec![0u8; crate::limits::CHUNK_LENGTH]);
        assert!(matches!(at_boundary.data(), CellData::BlobLeaf(_)));

        let one_past = Cell::blob(vec![0u8; crate::limits::CHUNK_LENGTH + 1]);
        match one_past.data() {
            CellData::BlobTree { byte_length, children } => {
                assert_eq!(*byte_length, (crate::limits::CHUNK_LENGTH + 1) as u64);
                assert_eq!(children.len(), 2);
            }
            other => panic!("expected BlobTree, got {other:?}"),
        }
    }

    #[test]
    fn large_blob_tree_round_trips_through_decode() {
        let bytes = vec![0x5Au8; crate::limits::CHUNK_LENGTH * 20 + 7];
        let blob = Cell::blob(bytes.clone());
        let decoded = Cell::read(blob.encoding()).unwrap();
        assert_eq!(decoded.hash(), blob.hash());
    }

    #[test]
    fn large_string_chunks_at_char_boundaries() {
        // Each "a" multi-byte char is 2 bytes (Latin small letter with ogonek),
        // so a byte-oblivious splitter would corrupt UTF-8 mid-character.
        let s: String = std::iter::repeat('\u{105}')
            .take(crate::limits::CHUNK_LENGTH)
            .collect();
        let cell = Cell::string(s.clone());
        match cell.data() {
            CellData::StringTree { char_count, .. } => {
                assert_eq!(*char_count, s.chars().count() as u64);
            }
            other => panic!("expected StringTree, got {other:?}"),
        }
        let decoded = Cell::read(cell.encoding()).unwrap();
        assert_eq!(decoded.hash(), cell.hash());
    }

    #[test]
    fn vector_past_tree_arity_becomes_a_vector_tree() {
        let items: Vec<_> = (0..40i64).map(Cell::long).collect();
        let v = Cell::vector(items).unwrap();
        match v.data() {
            CellData::VectorTree { count, .. } => assert_eq!(*count, 40),
            other => panic!("expected VectorTree, got {other:?}"),
        }
        let decoded = Cell::read(v.encoding()).unwrap();
        assert_eq!(decoded.hash(), v.hash());
    }

    #[test]
    fn map_past_leaf_entries_becomes_a_map_tree() {
        let entries: Vec<_> = (0..40i64)
            .map(|i| (Cell::long(i), Cell::long(i * 2)))
            .collect();
        let m = Cell::map(entries).unwrap();
        match m.data() {
            CellData::MapTree { count, bitmap, .. } => {
                assert_eq!(*count, 40);
                assert_ne!(*bitmap, 0);
            }
            other => panic!("expected MapTree, got {other:?}"),
        }
        let decoded = Cell::read(m.encoding()).unwrap();
        assert_eq!(decoded.hash(), m.hash());
    }

    #[test]
    fn big_int_round_trips_and_stays_embedded() {
        for v in [i64::MAX as i128 + 1, i64::MIN as i128 - 1, 1i128 << 100, -(1i128 << 100)] {
            let cell = Cell::big_int(v);
            assert!(cell.is_embeddable());
            let decoded = Cell::read(cell.encoding()).unwrap();
            assert_eq!(decoded.data(), cell.data());
            match decoded.data() {
                CellData::BigInt(big) => assert_eq!(big.to_i128(), Some(v)),
                other => panic!("expected BigInt, got {other:?}"),
            }
        }
    }

    #[test]
    #[should_panic(expected = "fits in i64")]
    fn big_int_rejects_values_that_fit_in_long() {
        Cell::big_int(42);
    }

    #[test]
    fn record_round_trips_its_positional_fields() {
        let record = Cell::record(0x03, vec![Cell::long(1), Cell::string("x")]);
        match record.data() {
            CellData::Record { kind, fields } => {
                assert_eq!(*kind, 0x03);
                assert_eq!(fields.len(), 2);
            }
            other => panic!("expected Record, got {other:?}"),
        }
        let decoded = Cell::read(record.encoding()).unwrap();
        assert_eq!(decoded.hash(), record.hash());
    }

    #[test]
    fn signed_round_trips_key_signature_and_value() {
        let value = Cell::long(7);
        let signed = Cell::signed([0xAB; 32], [0xCD; 64], &value);
        let decoded = Cell::read(signed.encoding()).unwrap();
        assert_eq!(decoded.hash(), signed.hash());
        match decoded.data() {
            CellData::Signed {
                account_key,
                signature,
                value: decoded_value,
            } => {
                assert_eq!(*account_key, [0xAB; 32]);
                assert_eq!(*signature, [0xCD; 64]);
                assert_eq!(decoded_value.value().unwrap().data(), value.data());
            }
            other => panic!("expected Signed, got {other:?}"),
        }
    }
}
