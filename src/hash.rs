//! Content addressing: SHA3-256 over a cell's canonical encoding.
//!
//! A cell's identity is entirely a function of its bytes. `Hash` is a plain
//! 32-byte value; hashing is a free function so it can be unit-tested against
//! literal vectors without touching the cell graph at all.

use core::fmt;
use core::str::FromStr;

use sha3::{Digest, Sha3_256};

/// Number of bytes in a Convex content hash.
pub const HASH_LENGTH: usize = 32;

/// A SHA3-256 digest identifying a cell's canonical encoding.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub [u8; HASH_LENGTH]);

impl Hash {
    /// Hashes `encoding`, which must already be a cell's canonical byte form.
    pub fn of(encoding: &[u8]) -> Self {
        let mut hasher = Sha3_256::new();
        hasher.update(encoding);
        let digest = hasher.finalize();
        let mut bytes = [0u8; HASH_LENGTH];
        bytes.copy_from_slice(&digest);
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_hex())
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Parse error for [`Hash::from_str`]: expects exactly 64 lowercase/uppercase hex chars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParseError;

impl fmt::Display for HashParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected 64 hex characters")
    }
}

impl std::error::Error for HashParseError {}

impl FromStr for Hash {
    type Err = HashParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|_| HashParseError)?;
        if bytes.len() != HASH_LENGTH {
            return Err(HashParseError);
        }
        let mut out = [0u8; HASH_LENGTH];
        out.copy_from_slice(&bytes);
        Ok(Hash(out))
    }
}
