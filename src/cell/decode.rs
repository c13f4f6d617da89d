//! Canonical decoding, with full enforcement of the embedded/indirect
//! discipline, VLQ minimality, and the other canonicality invariants the
//! encoder in [`crate::cell::encode`] guarantees it never violates.
//!
//! [`decode_cell`] is the recursive, partial-consumption primitive every
//! child slot goes through; [`crate::cell::Cell::read`] wraps it with the
//! top-level "every byte must be consumed" requirement.

use std::sync::Arc;

use byteorder::{BigEndian, ByteOrder};

use crate::cell::bigint::BigInt;
use crate::cell::tag::{self, Kind};
use crate::cell::{Cell, CellData};
use crate::error::{CellError, Result};
use crate::hash::{Hash, HASH_LENGTH};
use crate::limits::MAX_DECODE_DEPTH;
use crate::refs::Ref;
use crate::vlq;

/// Decodes one cell starting at `buf[0]`, returning the cell and the number
/// of bytes consumed. `depth` is the recursion depth of the *caller*; this
/// function checks it against [`MAX_DECODE_DEPTH`] before doing any work.
pub fn decode_cell(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    if depth >= MAX_DECODE_DEPTH {
        return Err(CellError::DepthExceeded(depth, MAX_DECODE_DEPTH));
    }
    let tag_byte = *buf.first().ok_or(CellError::truncated("tag byte"))?;
    let kind = tag::kind_of(tag_byte)?;
    match kind {
        Kind::Null => Ok((Cell::new(CellData::Null), 1)),
        Kind::Bool => Ok((Cell::new(CellData::Bool(tag_byte == tag::TAG_TRUE)), 1)),
        Kind::ByteFlag => Ok((
            Cell::new(CellData::ByteFlag(tag::byte_flag_value(tag_byte))),
            1,
        )),
        Kind::Long => decode_long(buf, tag_byte),
        Kind::Double => decode_double(buf),
        Kind::BigInt => decode_bigint(buf),
        Kind::StringShort => decode_text(buf, CellData::StringShort),
        Kind::Symbol => decode_text(buf, CellData::Symbol),
        Kind::Keyword => decode_text(buf, CellData::Keyword),
        Kind::StringTree => decode_string_tree(buf, depth),
        Kind::BlobLeaf => decode_blob_leaf(buf),
        Kind::BlobTree => decode_blob_tree(buf, depth),
        Kind::VectorLeaf => decode_vector_leaf(buf, depth),
        Kind::VectorTree => decode_vector_tree(buf, depth),
        Kind::MapLeaf => decode_map_leaf(buf, depth),
        Kind::MapTree => decode_map_tree(buf, depth),
        Kind::Index => decode_index(buf, depth),
        Kind::Address => decode_address(buf),
        Kind::Record => decode_record(buf, tag_byte, depth),
        Kind::Signed => decode_signed(buf, depth),
    }
}

fn decode_long(buf: &[u8], tag_byte: u8) -> Result<(Cell, usize)> {
    let byte_count = (tag_byte - tag::TAG_LONG_BASE) as usize;
    if byte_count > 8 {
        return Err(CellError::truncated("long byte count out of range"));
    }
    // `n = 0` is the canonical (and only valid) form for zero: no payload
    // bytes at all. A single `0x00` payload byte (`n = 1`) would be a
    // redundant second encoding of the same value and must be rejected
    // below, not accepted as `Long(0)`.
    if byte_count == 0 {
        return Ok((Cell::new(CellData::Long(0)), 1));
    }
    let payload = buf
        .get(1..1 + byte_count)
        .ok_or(CellError::truncated("long payload"))?;
    if payload == [0x00] || !crate::cell::bigint::is_minimal(payload) {
        return Err(CellError::NonMinimalVlq);
    }
    let negative = payload[0] & 0x80 != 0;
    let fill = if negative { 0xFFu8 } else { 0x00 };
    let mut bytes = [fill; 8];
    bytes[8 - payload.len()..].copy_from_slice(payload);
    let value = i64::from_be_bytes(bytes);
    Ok((Cell::new(CellData::Long(value)), 1 + byte_count))
}

fn decode_double(buf: &[u8]) -> Result<(Cell, usize)> {
    let bytes = buf.get(1..9).ok_or(CellError::truncated("double payload"))?;
    let v = BigEndian::read_f64(bytes);
    let v = if v.is_nan() { f64::NAN } else { v };
    Ok((Cell::new(CellData::Double(v)), 9))
}

fn decode_bigint(buf: &[u8]) -> Result<(Cell, usize)> {
    let (len, prefix_len) = vlq::count::read(&buf[1..])?;
    let len = len as usize;
    let start = 1 + prefix_len;
    let payload = buf
        .get(start..start + len)
        .ok_or(CellError::truncated("bigint payload"))?;
    // A payload of 8 bytes or fewer always fits `Long`'s range, so a
    // canonical encoder never emits `BigInteger` for it (§3: minimum length
    // 9 bytes); accepting one here would give the same integer value two
    // distinct canonical encodings.
    if len < 9 || !crate::cell::bigint::is_minimal(payload) {
        return Err(CellError::NonMinimalVlq);
    }
    let big = BigInt::from_minimal_bytes(payload.to_vec());
    Ok((Cell::new(CellData::BigInt(big)), start + len))
}

fn decode_text(
    buf: &[u8],
    wrap: impl FnOnce(Arc<str>) -> CellData,
) -> Result<(Cell, usize)> {
    let (len, prefix_len) = vlq::count::read(&buf[1..])?;
    let len = len as usize;
    let start = 1 + prefix_len;
    let payload = buf
        .get(start..start + len)
        .ok_or(CellError::truncated("string payload"))?;
    let s = std::str::from_utf8(payload).map_err(|_| CellError::InvalidUtf8)?;
    Ok((Cell::new(wrap(Arc::from(s))), start + len))
}

fn decode_blob_leaf(buf: &[u8]) -> Result<(Cell, usize)> {
    let (len, prefix_len) = vlq::count::read(&buf[1..])?;
    let len = len as usize;
    let start = 1 + prefix_len;
    let payload = buf
        .get(start..start + len)
        .ok_or(CellError::truncated("blob payload"))?;
    Ok((Cell::new(CellData::BlobLeaf(Arc::from(payload))), start + len))
}

fn decode_string_tree(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (char_count, n1) = vlq::count::read(&buf[1..])?;
    let (children, consumed_children) = decode_children(&buf[1 + n1..], depth)?;
    Ok((
        Cell::new(CellData::StringTree {
            char_count,
            children,
        }),
        1 + n1 + consumed_children,
    ))
}

fn decode_blob_tree(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (byte_length, n1) = vlq::count::read(&buf[1..])?;
    let (children, consumed_children) = decode_children(&buf[1 + n1..], depth)?;
    Ok((
        Cell::new(CellData::BlobTree {
            byte_length,
            children,
        }),
        1 + n1 + consumed_children,
    ))
}

fn decode_vector_leaf(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (children, consumed) = decode_children(&buf[1..], depth)?;
    Ok((Cell::new(CellData::VectorLeaf(children)), 1 + consumed))
}

fn decode_vector_tree(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (shift, n1) = vlq::count::read(&buf[1..])?;
    let (count, n2) = vlq::count::read(&buf[1 + n1..])?;
    let (children, consumed_children) = decode_children(&buf[1 + n1 + n2..], depth)?;
    Ok((
        Cell::new(CellData::VectorTree {
            shift: shift as u32,
            count,
            children,
        }),
        1 + n1 + n2 + consumed_children,
    ))
}

fn decode_map_leaf(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (count, n1) = vlq::count::read(&buf[1..])?;
    let mut offset = 1 + n1;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (key, key_len) = decode_ref(&buf[offset..], depth)?;
        offset += key_len;
        let (value, value_len) = decode_ref(&buf[offset..], depth)?;
        offset += value_len;
        entries.push((key, value));
    }
    Ok((Cell::new(CellData::MapLeaf(entries)), offset))
}

fn decode_map_tree(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let bitmap_bytes = buf
        .get(1..3)
        .ok_or(CellError::truncated("map tree bitmap"))?;
    let bitmap = BigEndian::read_u16(bitmap_bytes);
    let (count, n1) = vlq::count::read(&buf[3..])?;
    let (children, consumed_children) = decode_children(&buf[3 + n1..], depth)?;
    Ok((
        Cell::new(CellData::MapTree {
            bitmap,
            count,
            children,
        }),
        3 + n1 + consumed_children,
    ))
}

fn decode_index(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let (prefix_len, n1) = vlq::count::read(&buf[1..])?;
    let prefix_len = prefix_len as usize;
    let prefix_start = 1 + n1;
    let prefix = buf
        .get(prefix_start..prefix_start + prefix_len)
        .ok_or(CellError::truncated("index prefix"))?;
    let (children, consumed_children) =
        decode_children(&buf[prefix_start + prefix_len..], depth)?;
    Ok((
        Cell::new(CellData::Index {
            prefix: Arc::from(prefix),
            children,
        }),
        prefix_start + prefix_len + consumed_children,
    ))
}

fn decode_address(buf: &[u8]) -> Result<(Cell, usize)> {
    let (account, n1) = vlq::count::read(&buf[1..])?;
    Ok((Cell::new(CellData::Address(account)), 1 + n1))
}

fn decode_record(buf: &[u8], tag_byte: u8, depth: usize) -> Result<(Cell, usize)> {
    let kind = tag_byte - tag::TAG_RECORD_BASE;
    let (fields, consumed) = decode_children(&buf[1..], depth)?;
    Ok((Cell::new(CellData::Record { kind, fields }), 1 + consumed))
}

fn decode_signed(buf: &[u8], depth: usize) -> Result<(Cell, usize)> {
    let account_key: [u8; 32] = buf
        .get(1..33)
        .ok_or(CellError::truncated("signed account key"))?
        .try_into()
        .expect("slice of length 32");
    let signature: [u8; 64] = buf
        .get(33..97)
        .ok_or(CellError::truncated("signed signature"))?
        .try_into()
        .expect("slice of length 64");
    let (value, consumed_value) = decode_ref(&buf[97..], depth)?;
    Ok((
        Cell::new(CellData::Signed {
            account_key,
            signature,
            value,
        }),
        97 + consumed_value,
    ))
}

/// Decodes a VLQ-Count child-count prefix followed by that many child refs.
fn decode_children(buf: &[u8], depth: usize) -> Result<(Vec<Ref>, usize)> {
    let (count, mut offset) = vlq::count::read(buf)?;
    let mut children = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let (r, len) = decode_ref(&buf[offset..], depth)?;
        children.push(r);
        offset += len;
    }
    Ok((children, offset))
}

/// Decodes a single child slot: either a `TAG_REF` marker plus hash, or a
/// nested cell spliced inline, which must itself satisfy the embeddability
/// discipline.
fn decode_ref(buf: &[u8], depth: usize) -> Result<(Ref, usize)> {
    let tag_byte = *buf.first().ok_or(CellError::truncated("ref tag byte"))?;
    if tag_byte == tag::TAG_REF {
        let hash_bytes: [u8; HASH_LENGTH] = buf
            .get(1..1 + HASH_LENGTH)
            .ok_or(CellError::truncated("ref hash"))?
            .try_into()
            .expect("slice of length HASH_LENGTH");
        return Ok((Ref::indirect(Hash(hash_bytes)), 1 + HASH_LENGTH));
    }
    let (cell, consumed) = decode_cell(buf, depth + 1)?;
    if !cell.is_embeddable() {
        return Err(CellError::ShouldBeIndirect(cell.encoding_length()));
    }
    Ok((Ref::Embedded(Arc::new(cell)), consumed))
}
