//! Canonical byte emission. Every function here is a pure projection from a
//! [`Cell`]'s structural data to the one byte string the wire format allows
//! for that value (invariant: a single cell value maps to a single byte
//! string).

use byteorder::{BigEndian, ByteOrder};

use crate::cell::bigint::BigInt;
use crate::cell::tag;
use crate::cell::{Cell, CellData};
use crate::refs::Ref;
use crate::vlq;

/// Encodes `cell` to its canonical byte form. Called once per `Cell` and
/// cached by [`Cell::encoding`]; never call this directly on a path that
/// already has a cached encoding available.
pub fn encode_cell(cell: &Cell) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_into(cell.data(), &mut buf);
    buf
}

fn encode_into(data: &CellData, buf: &mut Vec<u8>) {
    match data {
        CellData::Null => buf.push(tag::TAG_NULL),
        CellData::Bool(false) => buf.push(tag::TAG_FALSE),
        CellData::Bool(true) => buf.push(tag::TAG_TRUE),
        CellData::ByteFlag(v) => buf.push(tag::TAG_BYTE_FLAG_BASE + v),
        CellData::Long(v) => encode_long(*v, buf),
        CellData::Double(v) => {
            buf.push(tag::TAG_DOUBLE);
            let mut bytes = [0u8; 8];
            BigEndian::write_f64(&mut bytes, *v);
            buf.extend_from_slice(&bytes);
        }
        CellData::BigInt(big) => {
            buf.push(tag::TAG_BIGINT);
            vlq::count::write(buf, big.as_bytes().len() as u64);
            buf.extend_from_slice(big.as_bytes());
        }
        CellData::StringShort(s) => encode_text(tag::TAG_STRING_SHORT, s, buf),
        CellData::Symbol(s) => encode_text(tag::TAG_SYMBOL, s, buf),
        CellData::Keyword(s) => encode_text(tag::TAG_KEYWORD, s, buf),
        CellData::StringTree {
            char_count,
            children,
        } => {
            buf.push(tag::TAG_STRING_TREE);
            vlq::count::write(buf, *char_count);
            encode_children(children, buf);
        }
        CellData::BlobLeaf(bytes) => {
            buf.push(tag::TAG_BLOB_LEAF);
            vlq::count::write(buf, bytes.len() as u64);
            buf.extend_from_slice(bytes);
        }
        CellData::BlobTree {
            byte_length,
            children,
        } => {
            buf.push(tag::TAG_BLOB_TREE);
            vlq::count::write(buf, *byte_length);
            encode_children(children, buf);
        }
        CellData::VectorLeaf(children) => {
            buf.push(tag::TAG_VECTOR_LEAF);
            encode_children(children, buf);
        }
        CellData::VectorTree {
            shift,
            count,
            children,
        } => {
            buf.push(tag::TAG_VECTOR_TREE);
            vlq::count::write(buf, u64::from(*shift));
            vlq::count::write(buf, *count);
            encode_children(children, buf);
        }
        CellData::MapLeaf(entries) => {
            buf.push(tag::TAG_MAP_LEAF);
            vlq::count::write(buf, entries.len() as u64);
            for (k, v) in entries {
                write_ref(k, buf);
                write_ref(v, buf);
            }
        }
        CellData::MapTree {
            bitmap,
            count,
            children,
        } => {
            buf.push(tag::TAG_MAP_TREE);
            let mut bitmap_bytes = [0u8; 2];
            BigEndian::write_u16(&mut bitmap_bytes, *bitmap);
            buf.extend_from_slice(&bitmap_bytes);
            vlq::count::write(buf, *count);
            encode_children(children, buf);
        }
        CellData::Index { prefix, children } => {
            buf.push(tag::TAG_INDEX);
            vlq::count::write(buf, prefix.len() as u64);
            buf.extend_from_slice(prefix);
            encode_children(children, buf);
        }
        CellData::Address(account) => {
            buf.push(tag::TAG_ADDRESS);
            vlq::count::write(buf, *account);
        }
        CellData::Record { kind, fields } => {
            assert_ne!(*kind, 0x0A, "record kind 0x0A collides with the Address tag");
            buf.push(tag::TAG_RECORD_BASE + kind);
            vlq::count::write(buf, fields.len() as u64);
            encode_children(fields, buf);
        }
        CellData::Signed {
            account_key,
            signature,
            value,
        } => {
            buf.push(tag::TAG_SIGNED);
            buf.extend_from_slice(account_key);
            buf.extend_from_slice(signature);
            write_ref(value, buf);
        }
    }
}

fn encode_long(value: i64, buf: &mut Vec<u8>) {
    // Zero's minimal two's-complement form is the *empty* byte string (tag
    // base + 0), not a single `0x00` byte: `BigInt`'s own minimality rule
    // always keeps at least one byte, which is correct for `BigInteger` (its
    // payload is never empty) but not for `Long`, whose `n=0` tag form exists
    // specifically so zero needs no payload bytes at all.
    if value == 0 {
        buf.push(tag::TAG_LONG_BASE);
        return;
    }
    let bytes = BigInt::from_i128(i128::from(value));
    let minimal = bytes.as_bytes();
    debug_assert!(minimal.len() <= 8, "i64 never needs more than 8 bytes");
    buf.push(tag::TAG_LONG_BASE + minimal.len() as u8);
    buf.extend_from_slice(minimal);
}

fn encode_text(leading_tag: u8, s: &str, buf: &mut Vec<u8>) {
    buf.push(leading_tag);
    vlq::count::write(buf, s.len() as u64);
    buf.extend_from_slice(s.as_bytes());
}

fn encode_children(children: &[Ref], buf: &mut Vec<u8>) {
    vlq::count::write(buf, children.len() as u64);
    for child in children {
        write_ref(child, buf);
    }
}

/// Writes a single child slot: the embedded child's own bytes spliced
/// inline, or a `TAG_REF` marker followed by its 32-byte hash.
fn write_ref(r: &Ref, buf: &mut Vec<u8>) {
    match r {
        Ref::Embedded(cell) => {
            debug_assert!(
                cell.is_embeddable(),
                "a Ref::Embedded child must satisfy the embeddability discipline"
            );
            buf.extend_from_slice(cell.encoding());
        }
        Ref::Indirect { hash, .. } => {
            buf.push(tag::TAG_REF);
            buf.extend_from_slice(hash.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Cell;

    #[test]
    fn null_is_a_single_byte() {
        assert_eq!(Cell::null().encoding(), &[tag::TAG_NULL]);
    }

    #[test]
    fn bool_tags_are_distinct_from_byte_flag_range() {
        assert_eq!(Cell::bool(false).encoding(), &[tag::TAG_FALSE]);
        assert_eq!(Cell::bool(true).encoding(), &[tag::TAG_TRUE]);
    }

    #[test]
    fn long_one_matches_conformance_vector() {
        // 0x11 0x01 == Long(1): tag base + 1 byte, payload 0x01.
        assert_eq!(Cell::long(1).encoding(), &[0x11, 0x01]);
    }

    #[test]
    fn long_zero_is_the_empty_payload_form() {
        // 0x10 == Long(0): tag base + 0 bytes, no payload at all. `0x11 0x00`
        // (a redundant single zero byte) must decode to an error, not 0.
        assert_eq!(Cell::long(0).encoding(), &[0x10]);
    }

    #[test]
    fn address_round_trips_through_vlq_count() {
        let a = Cell::address(1_073_741_824);
        let mut expected = vec![tag::TAG_ADDRESS];
        vlq::count::write(&mut expected, 1_073_741_824);
        assert_eq!(a.encoding(), expected.as_slice());
    }

    #[test]
    fn small_vector_embeds_its_children() {
        let v = Cell::vector(vec![Cell::long(1), Cell::long(2)]).unwrap();
        // tag + count(1 byte, value 2) + two embedded Long(1 byte tag + 1 byte value each)
        assert_eq!(v.encoding()[0], tag::TAG_VECTOR_LEAF);
        assert!(v.encoding().len() < crate::limits::MAX_EMBEDDED_LENGTH);
    }
}
