// amm-token/src/events.rs

//! Ledger events and their log encoding

use crate::{TokenError, TokenResult};
use ledger_core::{Amount, GasPrice, Log};
use ledger_crypto::{Address, Hash, Hashable};
use serde::{Deserialize, Serialize};

/// Event emitted by a successful token entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Units bought with a deposit
    Minted {
        buyer: Address,
        deposit_amount: Amount,
        units_minted: Amount,
        reserve_balance: Amount,
        total_supply: Amount,
    },
    /// Units sold back for a refund
    Burned {
        seller: Address,
        units_burned: Amount,
        refund_amount: Amount,
        reserve_balance: Amount,
        total_supply: Amount,
    },
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    MaxGasPriceChanged {
        previous: GasPrice,
        current: GasPrice,
    },
}

impl LedgerEvent {
    pub fn signature(&self) -> &'static str {
        match self {
            LedgerEvent::Minted { .. } => "Minted(address,uint256,uint256,uint256,uint256)",
            LedgerEvent::Burned { .. } => "Burned(address,uint256,uint256,uint256,uint256)",
            LedgerEvent::Transfer { .. } => "Transfer(address,address,uint256)",
            LedgerEvent::Approval { .. } => "Approval(address,address,uint256)",
            LedgerEvent::MaxGasPriceChanged { .. } => "MaxGasPriceChanged(uint256,uint256)",
        }
    }

    /// First log topic
    pub fn topic(&self) -> Hash {
        self.signature().hash()
    }

    pub fn to_log(&self, emitter: Address) -> TokenResult<Log> {
        let data = serde_json::to_vec(self).map_err(|e| TokenError::EventEncoding(e.to_string()))?;
        Ok(Log {
            address: emitter,
            topics: vec![self.topic()],
            data,
        })
    }

    pub fn from_log(log: &Log) -> TokenResult<Self> {
        let event: LedgerEvent =
            serde_json::from_slice(&log.data).map_err(|e| TokenError::EventEncoding(e.to_string()))?;
        if log.topics.first() != Some(&event.topic()) {
            return Err(TokenError::EventEncoding(format!(
                "topic does not match {}",
                event.signature()
            )));
        }
        Ok(event)
    }
}
