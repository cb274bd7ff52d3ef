//! Keccak-256 and ABI tuple encoding
//!
//! Leaves and signature messages are hashed exactly the way Solidity's
//! `keccak256(abi.encode(...))` hashes them, so an on-chain verifier can
//! recompute every value this crate commits to.

use crate::errors::CreditError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// A 32-byte hash (tree node, leaf, root or message digest).
pub type Bytes32 = [u8; 32];

const WORD: usize = 32;

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Bytes32 {
    Keccak256::digest(data).into()
}

/// Hash two nodes in order: `keccak256(left ‖ right)`.
///
/// Equal to `keccak256(abi.encode(bytes32 left, bytes32 right))`.
pub fn hash_pair(left: &Bytes32, right: &Bytes32) -> Bytes32 {
    let mut hasher = Keccak256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// 20-byte account address used as the subject identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = CreditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);

        if stripped.len() != 40 {
            return Err(CreditError::InvalidAddress(format!(
                "expected 40 hex characters, got {}",
                stripped.len()
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(stripped, &mut bytes)
            .map_err(|e| CreditError::InvalidAddress(format!("{}: {}", s, e)))?;
        Ok(Address(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// One typed value of an ABI tuple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiToken<'a> {
    String(&'a str),
    Uint(u128),
    Address(Address),
    Bytes32(Bytes32),
}

fn uint_word(value: u128) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

/// Encode a tuple with the standard ABI head/tail layout.
///
/// Static values occupy one head word each. A string puts its byte offset
/// (from the start of the encoding) in the head and `len ‖ data` padded to a
/// word boundary in the tail.
pub fn encode(tokens: &[AbiToken<'_>]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            AbiToken::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            AbiToken::Address(address) => {
                head.extend_from_slice(&[0u8; 12]);
                head.extend_from_slice(address.as_bytes());
            }
            AbiToken::Bytes32(bytes) => head.extend_from_slice(bytes),
            AbiToken::String(s) => {
                head.extend_from_slice(&uint_word((head_len + tail.len()) as u128));

                let data = s.as_bytes();
                tail.extend_from_slice(&uint_word(data.len() as u128));
                tail.extend_from_slice(data);
                let padding = (WORD - data.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// `keccak256(abi.encode(tokens...))`
pub fn hash_tuple(tokens: &[AbiToken<'_>]) -> Bytes32 {
    keccak256(&encode(tokens))
}

/// Serde adapters rendering hashes as `0x`-prefixed hex.
pub mod serde_hex {
    use super::Bytes32;
    use serde::{Deserialize, Deserializer, Serializer};

    fn to_hex(bytes: &Bytes32) -> String {
        format!("0x{}", hex::encode(bytes))
    }

    fn from_hex<E: serde::de::Error>(s: &str) -> Result<Bytes32, E> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let mut out = [0u8; 32];
        hex::decode_to_slice(stripped, &mut out).map_err(E::custom)?;
        Ok(out)
    }

    /// Variable-length bytes (signatures, public keys).
    pub mod bytes {
        use serde::{Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(value: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&format!("0x{}", hex::encode(value)))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
            let s = String::deserialize(deserializer)?;
            hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(serde::de::Error::custom)
        }
    }

    pub mod bytes32 {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Bytes32, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&to_hex(value))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Bytes32, D::Error> {
            let s = String::deserialize(deserializer)?;
            from_hex(&s)
        }
    }

    pub mod bytes32_vec {
        use super::*;
        use serde::ser::SerializeSeq;

        pub fn serialize<S: Serializer>(
            values: &[Bytes32],
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            let mut seq = serializer.serialize_seq(Some(values.len()))?;
            for value in values {
                seq.serialize_element(&to_hex(value))?;
            }
            seq.end()
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Vec<Bytes32>, D::Error> {
            let raw = Vec::<String>::deserialize(deserializer)?;
            raw.iter().map(|s| from_hex(s)).collect()
        }
    }
}
