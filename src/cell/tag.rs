//! Tag byte registry: leading-byte dispatch and the embeddability predicate.
//!
//! The registry is closed -- there is no user-registered tag space. Decoding
//! an unrecognized leading byte is always [`CellError::UnknownTag`].

use crate::error::CellError;

pub const TAG_NULL: u8 = 0x00;
pub const TAG_FALSE: u8 = 0xB0;
pub const TAG_TRUE: u8 = 0xB1;
pub const TAG_BYTE_FLAG_BASE: u8 = 0xB0; // low nibble carries the 4-bit flag value

pub const TAG_LONG_BASE: u8 = 0x10; // + byte-count (0..=8)
pub const TAG_DOUBLE: u8 = 0x1D;
pub const TAG_BIGINT: u8 = 0x19;

pub const TAG_STRING_SHORT: u8 = 0x30;
pub const TAG_STRING_TREE: u8 = 0x31;
pub const TAG_SYMBOL: u8 = 0x32;
pub const TAG_KEYWORD: u8 = 0x33;

pub const TAG_BLOB_LEAF: u8 = 0x38;
pub const TAG_BLOB_TREE: u8 = 0x39;

pub const TAG_VECTOR_LEAF: u8 = 0x80;
pub const TAG_VECTOR_TREE: u8 = 0x81;
pub const TAG_MAP_LEAF: u8 = 0x88;
pub const TAG_MAP_TREE: u8 = 0x89;
pub const TAG_INDEX: u8 = 0x8A;

pub const TAG_ADDRESS: u8 = 0xEA;
pub const TAG_RECORD_BASE: u8 = 0xE0; // + record kind (0..=0x0F), disjoint from Address (0xEA)
pub const TAG_SIGNED: u8 = 0xCD;

/// Indirect hash-ref marker used wherever a child slot is not embedded.
pub const TAG_REF: u8 = 0xF0;

/// A coarse classification used by the encoder/decoder to decide the
/// embedded-vs-indirect discipline. Every [`crate::cell::Cell`] variant maps
/// to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    ByteFlag,
    Long,
    Double,
    BigInt,
    StringShort,
    StringTree,
    Symbol,
    Keyword,
    BlobLeaf,
    BlobTree,
    VectorLeaf,
    VectorTree,
    MapLeaf,
    MapTree,
    Index,
    Address,
    Record,
    Signed,
}

impl Kind {
    /// Whether a cell of this kind is ever eligible for embedding,
    /// independent of its actual encoded length. Trees and the "signed
    /// data" envelope are never embedded: they exist specifically to bound
    /// the size of the thing they represent, so splicing one inline would
    /// defeat the purpose.
    pub fn embeddable(self) -> bool {
        !matches!(
            self,
            Kind::StringTree
                | Kind::BlobTree
                | Kind::VectorTree
                | Kind::MapTree
                | Kind::Index
                | Kind::Signed
        )
    }
}

/// Resolves the leading byte of a canonical encoding to a [`Kind`].
///
/// Record tags occupy `0xE0..=0xEF` except `0xEA`, which is reserved for
/// `Address`; `Long` tags occupy `0x10..=0x18`.
pub fn kind_of(tag: u8) -> Result<Kind, CellError> {
    match tag {
        TAG_NULL => Ok(Kind::Null),
        TAG_FALSE | TAG_TRUE => Ok(Kind::Bool),
        0xB2..=0xBF => Ok(Kind::ByteFlag),
        t if (TAG_LONG_BASE..=TAG_LONG_BASE + 8).contains(&t) => Ok(Kind::Long),
        TAG_DOUBLE => Ok(Kind::Double),
        TAG_BIGINT => Ok(Kind::BigInt),
        TAG_STRING_SHORT => Ok(Kind::StringShort),
        TAG_STRING_TREE => Ok(Kind::StringTree),
        TAG_SYMBOL => Ok(Kind::Symbol),
        TAG_KEYWORD => Ok(Kind::Keyword),
        TAG_BLOB_LEAF => Ok(Kind::BlobLeaf),
        TAG_BLOB_TREE => Ok(Kind::BlobTree),
        TAG_VECTOR_LEAF => Ok(Kind::VectorLeaf),
        TAG_VECTOR_TREE => Ok(Kind::VectorTree),
        TAG_MAP_LEAF => Ok(Kind::MapLeaf),
        TAG_MAP_TREE => Ok(Kind::MapTree),
        TAG_INDEX => Ok(Kind::Index),
        TAG_ADDRESS => Ok(Kind::Address),
        TAG_SIGNED => Ok(Kind::Signed),
        t if (TAG_RECORD_BASE..=TAG_RECORD_BASE + 0x0F).contains(&t) && t != TAG_ADDRESS => {
            Ok(Kind::Record)
        }
        other => Err(CellError::UnknownTag(other)),
    }
}

/// The `b0..bF` nibble of a byte-flag tag (`ByteFlag` kind only).
pub fn byte_flag_value(tag: u8) -> u8 {
    tag & 0x0F
}
