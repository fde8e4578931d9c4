//! Content hashing
//!
//! SHA-256 is the only hash the chain uses: transaction leaves, Merkle
//! parents and block headers all go through [`hash`].

use crate::error::{BlockchainError, Result};
use data_encoding::HEXLOWER;
use ring::digest::{Context, SHA256};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DIGEST_LEN: usize = 32;

/// A 256-bit SHA-256 output
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    bincode::Encode,
    bincode::Decode,
)]
pub struct Digest([u8; DIGEST_LEN]);

impl Digest {
    /// The all-zero digest, used as the genesis `previous_hash`
    pub const ZERO: Digest = Digest([0u8; DIGEST_LEN]);

    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Digest {
        Digest(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Digest> {
        let array: [u8; DIGEST_LEN] = bytes.try_into().map_err(|_| {
            BlockchainError::Serialization(format!(
                "Digest must be {DIGEST_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Digest(array))
    }

    pub fn from_hex(hex: &str) -> Result<Digest> {
        let bytes = HEXLOWER
            .decode(hex.as_bytes())
            .map_err(|e| BlockchainError::Serialization(format!("Invalid hex digest: {e}")))?;
        Digest::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.0)
    }

    /// Count of leading `0` characters in the hex form
    pub fn leading_zero_nibbles(&self) -> u32 {
        let mut count = 0;
        for byte in self.0 {
            if byte == 0 {
                count += 2;
                continue;
            }
            if byte < 0x10 {
                count += 1;
            }
            break;
        }
        count
    }

    /// Returns a copy with a single bit flipped (bit 0 is the MSB of byte 0)
    pub fn with_flipped_bit(&self, bit: usize) -> Digest {
        let mut bytes = self.0;
        bytes[(bit / 8) % DIGEST_LEN] ^= 0x80 >> (bit % 8);
        Digest(bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// SHA-256 of `data`
pub fn hash(data: &[u8]) -> Digest {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(context.finish().as_ref());
    Digest(out)
}

/// SHA-256 of `left ++ right`, over raw digest bytes
pub fn hash_pair(left: &Digest, right: &Digest) -> Digest {
    let mut context = Context::new(&SHA256);
    context.update(left.as_bytes());
    context.update(right.as_bytes());
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(context.finish().as_ref());
    Digest(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_hash_of_empty_message() {
        assert_eq!(hash(b"").to_hex(), EMPTY_SHA256);
    }

    #[test]
    fn test_hash_pair_is_concatenation() {
        let a = hash(b"a");
        let b = hash(b"b");
        let mut joined = a.as_bytes().to_vec();
        joined.extend_from_slice(b.as_bytes());
        assert_eq!(hash_pair(&a, &b), hash(&joined));
        assert_ne!(hash_pair(&a, &b), hash_pair(&b, &a));
    }

    #[test]
    fn test_hex_roundtrip() {
        let digest = hash(b"minichain");
        assert_eq!(Digest::from_hex(&digest.to_hex()).unwrap(), digest);
        assert!(Digest::from_hex("abcd").is_err());
        assert!(Digest::from_hex("zz").is_err());
    }

    #[test]
    fn test_leading_zero_nibbles() {
        let mut bytes = [0xffu8; DIGEST_LEN];
        assert_eq!(Digest::from_bytes(bytes).leading_zero_nibbles(), 0);
        bytes[0] = 0x00;
        bytes[1] = 0x0a;
        assert_eq!(Digest::from_bytes(bytes).leading_zero_nibbles(), 3);
        assert_eq!(Digest::ZERO.leading_zero_nibbles(), 64);
    }

    #[test]
    fn test_flipped_bit_differs_by_one_bit() {
        let digest = hash(b"tip");
        let flipped = digest.with_flipped_bit(0);
        assert_ne!(digest, flipped);
        assert_eq!(flipped.with_flipped_bit(0), digest);
        assert_eq!(digest.as_bytes()[0] ^ flipped.as_bytes()[0], 0x80);
    }
}
