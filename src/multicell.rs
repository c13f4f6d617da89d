//! Multi-cell message framing: a root cell together with the length-prefixed
//! encodings of every indirect descendant it transitively references,
//! deduplicated by hash. This is the unit a peer sends when it wants to
//! hand over a whole value, not just announce that one exists.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::cell::decode;
use crate::cell::{Cell, CellData};
use crate::error::{CellError, Result};
use crate::hash::Hash;
use crate::limits::MAX_DECODE_DEPTH;
use crate::refs::Ref;
use crate::vlq;

/// Encodes `root` directly (its first byte is `root`'s own tag -- there is no
/// length prefix on the root section; a lone `0x00` is a valid encoding of
/// `Null`), followed by every indirect descendant reachable from it whose
/// value is resident, each as `[VLQ-Count of its encoding length][its
/// encoding]`. Embedded children never get a separate entry; unresolved
/// indirect refs (hash known, value absent) are silently omitted, since
/// there is nothing to send for them.
pub fn encode_multi_cell(root: &Arc<Cell>) -> Vec<u8> {
    let mut seen = HashSet::new();
    seen.insert(root.hash());
    let mut dictionary = Vec::new();
    gather_dictionary(root, &mut seen, &mut dictionary);

    let mut all = Vec::with_capacity(1 + dictionary.len());
    all.push(Arc::clone(root));
    all.extend(dictionary);
    encode_delta(&all)
}

/// Serializes an already-computed novelty list (typically the output of
/// [`crate::announce::Announcer::announce`]) as a multi-cell message: the
/// first element travels as the root (written directly, no length prefix),
/// every remaining element is length-prefixed. The receiver -- via
/// [`decode_multi_cell`] -- tolerates duplicate or already-known entries
/// silently, so a delta that happens to re-list something the peer already
/// has is harmless.
pub fn encode_delta(novelty: &[Arc<Cell>]) -> Vec<u8> {
    let mut buf = Vec::new();
    let Some((root, rest)) = novelty.split_first() else {
        return buf;
    };
    buf.extend_from_slice(root.encoding());
    for entry in rest {
        let bytes = entry.encoding();
        vlq::count::write(&mut buf, bytes.len() as u64);
        buf.extend_from_slice(bytes);
    }
    buf
}

fn gather_dictionary(cell: &Cell, seen: &mut HashSet<Hash>, out: &mut Vec<Arc<Cell>>) {
    for r in cell.child_refs() {
        match r {
            Ref::Embedded(child) => gather_dictionary(child, seen, out),
            Ref::Indirect {
                hash,
                value: Some(child),
            } => {
                if seen.insert(*hash) {
                    out.push(Arc::clone(child));
                    gather_dictionary(child, seen, out);
                }
            }
            Ref::Indirect { value: None, .. } => {}
        }
    }
}

/// Decodes a multi-cell message, resolving every indirect ref reachable from
/// the root whose hash appears in the message's dictionary. Refs whose hash
/// is absent from the dictionary decode successfully but stay unresolved
/// (`value: None`) -- the caller is expected to fall back to a
/// [`crate::store::Store`] lookup or a data request.
pub fn decode_multi_cell(bytes: &[u8]) -> Result<Arc<Cell>> {
    if bytes.is_empty() {
        return Err(CellError::truncated("multi-cell message"));
    }
    let (root_cell, root_len) = decode::decode_cell(bytes, 0)?;
    if root_len > crate::limits::LIMIT_ENCODING_LENGTH {
        return Err(CellError::EncodingTooLarge(
            root_len,
            crate::limits::LIMIT_ENCODING_LENGTH,
        ));
    }
    let mut offset = root_len;

    let mut raw: HashMap<Hash, Cell> = HashMap::new();
    while offset < bytes.len() {
        let (entry_len, n) = vlq::count::read(&bytes[offset..])?;
        offset += n;
        let entry_len = entry_len as usize;
        let entry_bytes = bytes
            .get(offset..offset + entry_len)
            .ok_or(CellError::truncated("multi-cell dictionary entry"))?;
        offset += entry_len;

        let (entry_cell, entry_consumed) = decode::decode_cell(entry_bytes, 0)?;
        if entry_consumed != entry_len {
            return Err(CellError::LengthMismatch {
                declared: entry_len,
                actual: entry_consumed,
            });
        }
        if entry_len > crate::limits::LIMIT_ENCODING_LENGTH {
            return Err(CellError::EncodingTooLarge(
                entry_len,
                crate::limits::LIMIT_ENCODING_LENGTH,
            ));
        }
        if entry_cell.is_embeddable() {
            return Err(CellError::RedundantDictionaryEntry);
        }

        let hash = Hash::of(entry_bytes);
        if let Some(existing) = raw.get(&hash) {
            if existing.data() != entry_cell.data() {
                return Err(CellError::DuplicateHash(hash));
            }
        }
        raw.insert(hash, entry_cell);
    }

    let mut memo = HashMap::new();
    let resolved = resolve_cell(&root_cell, &raw, &mut memo, 0)?;
    Ok(Arc::new(resolved))
}

fn resolve_cell(
    cell: &Cell,
    raw: &HashMap<Hash, Cell>,
    memo: &mut HashMap<Hash, Arc<Cell>>,
    depth: usize,
) -> Result<Cell> {
    if depth >= MAX_DECODE_DEPTH {
        return Err(CellError::DepthExceeded(depth, MAX_DECODE_DEPTH));
    }
    let data = match cell.data() {
        CellData::StringTree {
            char_count,
            children,
        } => CellData::StringTree {
            char_count: *char_count,
            children: resolve_list(children, raw, memo, depth)?,
        },
        CellData::BlobTree {
            byte_length,
            children,
        } => CellData::BlobTree {
            byte_length: *byte_length,
            children: resolve_list(children, raw, memo, depth)?,
        },
        CellData::VectorLeaf(children) => {
            CellData::VectorLeaf(resolve_list(children, raw, memo, depth)?)
        }
        CellData::VectorTree {
            shift,
            count,
            children,
        } => CellData::VectorTree {
            shift: *shift,
            count: *count,
            children: resolve_list(children, raw, memo, depth)?,
        },
        CellData::MapLeaf(entries) => {
            let mut resolved = Vec::with_capacity(entries.len());
            for (k, v) in entries {
                let key = resolve_ref(k, raw, memo, depth)?;
                let value = resolve_ref(v, raw, memo, depth)?;
                resolved.push((key, value));
            }
            CellData::MapLeaf(resolved)
        }
        CellData::MapTree {
            bitmap,
            count,
            children,
        } => CellData::MapTree {
            bitmap: *bitmap,
            count: *count,
            children: resolve_list(children, raw, memo, depth)?,
        },
        CellData::Index { prefix, children } => CellData::Index {
            prefix: Arc::clone(prefix),
            children: resolve_list(children, raw, memo, depth)?,
        },
        CellData::Record { kind, fields } => CellData::Record {
            kind: *kind,
            fields: resolve_list(fields, raw, memo, depth)?,
        },
        CellData::Signed {
            account_key,
            signature,
            value,
        } => CellData::Signed {
            account_key: *account_key,
            signature: *signature,
            value: resolve_ref(value, raw, memo, depth)?,
        },
        other => other.clone(),
    };
    Ok(Cell::new(data))
}

fn resolve_list(
    list: &[Ref],
    raw: &HashMap<Hash, Cell>,
    memo: &mut HashMap<Hash, Arc<Cell>>,
    depth: usize,
) -> Result<Vec<Ref>> {
    list.iter()
        .map(|r| resolve_ref(r, raw, memo, depth))
        .collect()
}

fn resolve_ref(
    r: &Ref,
    raw: &HashMap<Hash, Cell>,
    memo: &mut HashMap<Hash, Arc<Cell>>,
    depth: usize,
) -> Result<Ref> {
    match r {
        Ref::Embedded(cell) => Ok(Ref::Embedded(Arc::new(resolve_cell(
            cell,
            raw,
            memo,
            depth + 1,
        )?))),
        Ref::Indirect { hash, value } => {
            if let Some(v) = value {
                let resolved = Arc::new(resolve_cell(v, raw, memo, depth + 1)?);
                return Ok(Ref::resolved(*hash, resolved));
            }
            if let Some(cached) = memo.get(hash) {
                return Ok(Ref::resolved(*hash, Arc::clone(cached)));
            }
            if let Some(raw_cell) = raw.get(hash) {
                let resolved = Arc::new(resolve_cell(raw_cell, raw, memo, depth + 1)?);
                memo.insert(*hash, Arc::clone(&resolved));
                return Ok(Ref::resolved(*hash, resolved));
            }
            Ok(Ref::indirect(*hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;
    use crate::limits::MAX_EMBEDDED_LENGTH;

    fn big_blob(byte: u8) -> Arc<Cell> {
        Cell::blob(vec![byte; MAX_EMBEDDED_LENGTH + 1])
    }

    #[test]
    fn small_all_embedded_graph_has_no_dictionary() {
        let root = Cell::vector(vec![Cell::long(1), Cell::long(2)]).unwrap();
        let bytes = encode_multi_cell(&root);
        let decoded = decode_multi_cell(&bytes).unwrap();
        assert_eq!(decoded.data(), root.data());
    }

    #[test]
    fn indirect_children_round_trip_through_the_dictionary() {
        let blob_a = big_blob(0xAA);
        let blob_b = big_blob(0xBB);
        let root = Cell::vector(vec![blob_a.clone(), blob_b.clone()]).unwrap();
        let bytes = encode_multi_cell(&root);
        let decoded = decode_multi_cell(&bytes).unwrap();

        assert_eq!(decoded.hash(), root.hash());
        let resolved_children = decoded.child_refs();
        assert_eq!(resolved_children.len(), 2);
        assert!(resolved_children.iter().all(|r| r.value().is_some()));
    }

    #[test]
    fn shared_descendant_appears_once_in_dictionary() {
        let shared = big_blob(0xCC);
        let root = Cell::vector(vec![shared.clone(), shared.clone()]).unwrap();
        let bytes = encode_multi_cell(&root);
        // The root section is written directly (no length prefix); exactly
        // one length-prefixed dictionary entry should follow it despite two
        // references to the shared blob.
        let root_len = root.encoding().len();
        let (entry_len, n) = vlq::count::read(&bytes[root_len..]).unwrap();
        assert_eq!(root_len + n + entry_len as usize, bytes.len());

        let decoded = decode_multi_cell(&bytes).unwrap();
        assert_eq!(decoded.total_ref_count(), root.total_ref_count());
    }

    #[test]
    fn encode_delta_of_a_single_root_has_no_dictionary_section() {
        let root = Cell::vector(vec![Cell::long(1)]).unwrap();
        let bytes = encode_delta(&[root.clone()]);
        assert_eq!(bytes, root.encoding());
    }

    #[test]
    fn encode_delta_of_an_empty_novelty_list_is_empty() {
        assert!(encode_delta(&[]).is_empty());
    }

    #[test]
    fn truncated_dictionary_entry_is_rejected() {
        let blob = big_blob(0xDD);
        let root = Cell::vector(vec![blob]).unwrap();
        let mut bytes = encode_multi_cell(&root);
        bytes.pop();
        assert!(decode_multi_cell(&bytes).is_err());
    }
}
