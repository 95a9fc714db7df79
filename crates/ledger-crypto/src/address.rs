// ledger-crypto/src/address.rs

use crate::{hash::Hashable, CryptoError, CryptoResult};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Address length in bytes
pub const ADDRESS_SIZE: usize = 20;

/// Account identity on the ledger
///
/// Serialized as a `0x`-prefixed hex string so configuration files and
/// transaction scripts stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn new(bytes: [u8; ADDRESS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Derive an address from arbitrary bytes (last 20 bytes of SHA256)
    pub fn derive(data: &[u8]) -> Self {
        let hash = data.hash();
        let mut address = [0u8; ADDRESS_SIZE];
        address.copy_from_slice(&hash.as_bytes()[12..32]);
        Self(address)
    }

    /// Deterministic address for a human-readable label ("alice", "owner", ...)
    pub fn from_label(label: &str) -> Self {
        Self::derive(label.as_bytes())
    }

    /// Address of a ledger created by `creator` with the given creation nonce
    pub fn contract(creator: &Address, nonce: u64) -> Self {
        let mut data = Vec::with_capacity(ADDRESS_SIZE + 8);
        data.extend_from_slice(creator.as_bytes());
        data.extend_from_slice(&nonce.to_le_bytes());
        Self::derive(&data)
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> CryptoResult<Self> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)
            .map_err(|e| CryptoError::DeserializationError(e.to_string()))?;
        if bytes.len() != ADDRESS_SIZE {
            return Err(CryptoError::InvalidAddress(format!(
                "expected {} bytes, got {}",
                ADDRESS_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; ADDRESS_SIZE];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }

    pub fn zero() -> Self {
        Self([0u8; ADDRESS_SIZE])
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_SIZE]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}
