// ledger-core/src/transaction.rs

use crate::{types::*, BlockchainResult};
use ledger_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};

/// Operations a sender can submit against the ledger
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransactionType {
    /// Reserve-currency transfer; sending value to the ledger address buys units
    NativeTransfer {
        to: Address,
        value: Amount,
    },
    /// Unit transfer
    Transfer {
        to: Address,
        amount: Amount,
    },
    /// Set a spender allowance
    Approve {
        spender: Address,
        amount: Amount,
    },
    /// Spend an allowance
    TransferFrom {
        from: Address,
        to: Address,
        amount: Amount,
    },
    /// Move units into `to` and notify it (sells when `to` is the ledger)
    TransferAndCall {
        to: Address,
        amount: Amount,
        #[serde(default)]
        data: Vec<u8>,
    },
    /// Approve `spender` and notify it (sells when `spender` is the ledger)
    ApproveAndCall {
        spender: Address,
        amount: Amount,
        #[serde(default)]
        data: Vec<u8>,
    },
    /// Direct call of the ledger's transfer notification hook
    OnTransferReceived {
        operator: Address,
        from: Address,
        amount: Amount,
        #[serde(default)]
        data: Vec<u8>,
        #[serde(default)]
        seal: Option<Hash>,
    },
    /// Direct call of the ledger's approval notification hook
    OnApprovalReceived {
        owner: Address,
        amount: Amount,
        #[serde(default)]
        data: Vec<u8>,
        #[serde(default)]
        seal: Option<Hash>,
    },
    /// Owner-only update of the deposit gas price cap
    SetMaxGasPrice {
        cap: GasPrice,
    },
}

/// Signed-off transaction as submitted by the hosting platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender's address (authenticated by the hosting platform)
    pub from: Address,
    /// Transaction nonce (prevents replay)
    pub nonce: Nonce,
    /// Type of transaction
    #[serde(rename = "call")]
    pub tx_type: TransactionType,
    /// Gas price the sender pays
    pub gas_price: GasPrice,
    /// Submission time
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl Transaction {
    pub fn new(from: Address, nonce: Nonce, tx_type: TransactionType, gas_price: GasPrice) -> Self {
        Self {
            from,
            nonce,
            tx_type,
            gas_price,
            timestamp: current_timestamp(),
        }
    }

    /// Calculate transaction hash over the canonical JSON encoding
    pub fn hash(&self) -> BlockchainResult<Hash> {
        let bytes = serde_json::to_vec(self)?;
        Ok(bytes.hash())
    }

    /// Reserve currency carried by the transaction
    pub fn value(&self) -> Amount {
        match &self.tx_type {
            TransactionType::NativeTransfer { value, .. } => value.clone(),
            _ => Amount::zero(),
        }
    }

    /// Recipient address (if applicable)
    pub fn recipient(&self) -> Option<Address> {
        match &self.tx_type {
            TransactionType::NativeTransfer { to, .. }
            | TransactionType::Transfer { to, .. }
            | TransactionType::TransferFrom { to, .. }
            | TransactionType::TransferAndCall { to, .. } => Some(*to),
            TransactionType::Approve { spender, .. }
            | TransactionType::ApproveAndCall { spender, .. } => Some(*spender),
            _ => None,
        }
    }
}

/// Execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Success,
    Reverted,
}

/// Event log emitted during execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Emitting address
    pub address: Address,
    /// Event signature hash first
    pub topics: Vec<Hash>,
    /// Encoded event payload
    pub data: Vec<u8>,
}

/// Transaction receipt after execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub tx_hash: Hash,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: Nonce,
    pub status: ExecutionStatus,
    /// Reason for a reverted transaction
    pub revert_reason: Option<String>,
    /// Logs emitted by a successful transaction
    pub logs: Vec<Log>,
}

impl TransactionReceipt {
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Success
    }
}
