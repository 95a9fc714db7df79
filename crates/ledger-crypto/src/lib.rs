// ledger-crypto/src/lib.rs

//! Hashing and identity primitives for the AMM token ledger
//!
//! This crate provides:
//! - 32-byte hashes (SHA256, Blake3)
//! - 20-byte account addresses, including derived ledger addresses

pub mod hash;
pub mod address;

pub use hash::{Hash, HashAlgorithm, Hashable};
pub use address::Address;

/// Result type for cryptographic operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("Invalid hash")]
    InvalidHash,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_basics() {
        let owner = Address::from_label("owner");
        let ledger = Address::contract(&owner, 0);
        assert_ne!(owner, ledger);
        assert_eq!(ledger, Address::contract(&owner, 0));
    }
}
