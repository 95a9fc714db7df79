// ledger-core/src/lib.rs

//! Core ledger data structures
//!
//! This crate provides:
//! - Arbitrary precision amounts and scalar aliases
//! - Reserve-currency world state with checkpoint/rollback
//! - Transaction types and receipts

pub mod state;
pub mod transaction;
pub mod types;

pub use state::{Account, WorldState};
pub use transaction::{ExecutionStatus, Log, Transaction, TransactionReceipt, TransactionType};
pub use types::*;

/// Result type for ledger operations
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Errors that can occur in ledger operations
#[derive(Debug, thiserror::Error)]
pub enum BlockchainError {
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("State error: {0}")]
    StateError(String),

    #[error("Insufficient balance")]
    InsufficientBalance,

    #[error("Nonce mismatch: expected {expected}, got {actual}")]
    NonceMismatch { expected: Nonce, actual: Nonce },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Cryptographic error: {0}")]
    CryptoError(#[from] ledger_crypto::CryptoError),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for BlockchainError {
    fn from(err: serde_json::Error) -> Self {
        BlockchainError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for BlockchainError {
    fn from(err: bincode::Error) -> Self {
        BlockchainError::SerializationError(err.to_string())
    }
}
