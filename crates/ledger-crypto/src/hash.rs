// ledger-crypto/src/hash.rs

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hash output size in bytes
pub const HASH_SIZE: usize = 32;

/// Supported hash algorithms
///
/// SHA256 identifies transactions, addresses and event topics; Blake3 seals
/// ledger notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Sha256,
    Blake3,
}

impl HashAlgorithm {
    pub fn digest(self, data: &[u8]) -> Hash {
        match self {
            HashAlgorithm::Sha256 => Hash(Sha256::digest(data).into()),
            HashAlgorithm::Blake3 => Hash(blake3::hash(data).into()),
        }
    }
}

/// A 32-byte hash value, serialized as a hex string
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(slice: &[u8]) -> Result<Self, crate::CryptoError> {
        <[u8; HASH_SIZE]>::try_from(slice)
            .map(Self)
            .map_err(|_| crate::CryptoError::InvalidHash)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn zero() -> Self {
        Self([0u8; HASH_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_SIZE]
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse 64 hex digits, with or without a `0x` prefix
    pub fn from_hex(s: &str) -> Result<Self, crate::CryptoError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| crate::CryptoError::DeserializationError(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(0x{}..)", hex::encode(&self.0[..6]))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl Default for Hash {
    fn default() -> Self {
        Self::zero()
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Byte strings that can be hashed
pub trait Hashable {
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash;

    /// SHA256 digest
    fn hash(&self) -> Hash {
        self.hash_with(HashAlgorithm::Sha256)
    }
}

impl Hashable for [u8] {
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        algorithm.digest(self)
    }
}

impl Hashable for Vec<u8> {
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        algorithm.digest(self)
    }
}

impl Hashable for str {
    fn hash_with(&self, algorithm: HashAlgorithm) -> Hash {
        algorithm.digest(self.as_bytes())
    }
}
