// amm-token/src/guard.rs

//! Admission control, ownership and reentrancy protection

use crate::{TokenError, TokenResult};
use ledger_core::GasPrice;
use ledger_crypto::Address;
use serde::{Deserialize, Serialize};

/// Gas price cap applied to deposits
///
/// Guards against front-running buyers who bid up gas to jump the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionGuard {
    max_gas_price: GasPrice,
}

impl AdmissionGuard {
    pub fn new(max_gas_price: GasPrice) -> Self {
        Self { max_gas_price }
    }

    pub fn max_gas_price(&self) -> GasPrice {
        self.max_gas_price
    }

    /// Admit a transaction priced at `gas_price`; equality passes
    pub fn check(&self, gas_price: GasPrice) -> TokenResult<()> {
        if gas_price > self.max_gas_price {
            return Err(TokenError::GasPriceExceeded {
                gas_price,
                max_gas_price: self.max_gas_price,
            });
        }
        Ok(())
    }

    /// Replace the cap, returning the previous one
    pub fn set_max_gas_price(&mut self, cap: GasPrice) -> GasPrice {
        std::mem::replace(&mut self.max_gas_price, cap)
    }
}

/// Single-owner access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ownable {
    owner: Address,
}

impl Ownable {
    pub fn new(owner: Address) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn only_owner(&self, caller: &Address) -> TokenResult<()> {
        if *caller != self.owner {
            return Err(TokenError::NotOwner);
        }
        Ok(())
    }
}

/// Lock held for the duration of a state-changing entry point
///
/// Nested mutating calls fail while the lock is held. Read-only queries do
/// not consult it.
#[derive(Debug, Clone, Default)]
pub struct ReentrancyGuard {
    locked: bool,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self) -> TokenResult<()> {
        if self.locked {
            return Err(TokenError::Reentrancy);
        }
        self.locked = true;
        Ok(())
    }

    pub fn release(&mut self) {
        self.locked = false;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }
}
