// ledger-core/src/state.rs

use crate::{types::*, BlockchainError, BlockchainResult};
use ledger_crypto::{hash::Hashable, Address, Hash};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Reserve-currency account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Account {
    /// Account nonce (transaction counter)
    pub nonce: Nonce,
    /// Reserve-currency balance
    pub balance: Amount,
}

impl Account {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_nonce(&mut self) {
        self.nonce += 1;
    }

    pub fn add_balance(&mut self, amount: &Amount) -> BlockchainResult<()> {
        self.balance = self.balance.checked_add(amount)
            .ok_or(BlockchainError::StateError("Balance overflow".into()))?;
        Ok(())
    }

    pub fn sub_balance(&mut self, amount: &Amount) -> BlockchainResult<()> {
        self.balance = self.balance.checked_sub(amount)
            .ok_or(BlockchainError::InsufficientBalance)?;
        Ok(())
    }
}

/// World state holding every reserve-currency account
///
/// Changes made after [`WorldState::checkpoint`] can be undone with
/// [`WorldState::rollback`] or kept with [`WorldState::commit`].
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WorldState {
    accounts: HashMap<Address, Account>,
    modifications: Vec<StateModification>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get account (empty account if it does not exist)
    pub fn get_account(&self, address: &Address) -> Account {
        self.accounts.get(address).cloned().unwrap_or_default()
    }

    pub fn set_account(&mut self, address: Address, account: Account) {
        self.record_account_modification(address);
        self.accounts.insert(address, account);
    }

    pub fn get_balance(&self, address: &Address) -> Amount {
        self.accounts.get(address)
            .map(|acc| acc.balance.clone())
            .unwrap_or_else(Amount::zero)
    }

    pub fn get_nonce(&self, address: &Address) -> Nonce {
        self.accounts.get(address).map(|acc| acc.nonce).unwrap_or(0)
    }

    pub fn increment_nonce(&mut self, address: &Address) {
        let mut account = self.get_account(address);
        account.increment_nonce();
        self.set_account(*address, account);
    }

    /// Credit currency out of thin air (genesis allocations only)
    pub fn credit(&mut self, address: &Address, amount: &Amount) -> BlockchainResult<()> {
        let mut account = self.get_account(address);
        account.add_balance(amount)?;
        self.set_account(*address, account);
        Ok(())
    }

    /// Transfer currency between accounts
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        amount: &Amount,
    ) -> BlockchainResult<()> {
        let mut new_from = self.get_account(from);
        if new_from.balance < *amount {
            return Err(BlockchainError::InsufficientBalance);
        }
        new_from.sub_balance(amount)?;
        self.set_account(*from, new_from);

        // Re-read: `from` and `to` may be the same account
        let mut new_to = self.get_account(to);
        new_to.add_balance(amount)?;
        self.set_account(*to, new_to);

        Ok(())
    }

    /// Sum of every balance
    pub fn total_issuance(&self) -> Amount {
        self.accounts.values()
            .fold(Amount::zero(), |acc, a| acc + a.balance.clone())
    }

    /// Calculate state root hash
    pub fn state_root(&self) -> BlockchainResult<Hash> {
        let mut sorted_accounts: Vec<_> = self.accounts.iter().collect();
        sorted_accounts.sort_by_key(|(addr, _)| *addr);

        let mut combined = Vec::new();
        for (addr, account) in sorted_accounts {
            combined.extend_from_slice(addr.as_bytes());
            combined.extend_from_slice(&bincode::serialize(account)?);
        }

        if combined.is_empty() {
            Ok(Hash::zero())
        } else {
            Ok(combined.hash())
        }
    }

    /// Begin transaction
    pub fn checkpoint(&mut self) {
        self.modifications.push(StateModification::Checkpoint);
    }

    /// Keep every change since the last checkpoint
    pub fn commit(&mut self) {
        while let Some(mod_type) = self.modifications.pop() {
            if matches!(mod_type, StateModification::Checkpoint) {
                break;
            }
        }
    }

    /// Undo every change since the last checkpoint
    pub fn rollback(&mut self) {
        let mut restored = 0usize;
        while let Some(mod_type) = self.modifications.pop() {
            match mod_type {
                StateModification::Checkpoint => break,
                StateModification::AccountSet { address, old_account } => {
                    if let Some(old) = old_account {
                        self.accounts.insert(address, old);
                    } else {
                        self.accounts.remove(&address);
                    }
                    restored += 1;
                }
            }
        }
        tracing::debug!(restored, "world state rolled back");
    }

    /// Record the pre-checkpoint value of `address` once per checkpoint
    fn record_account_modification(&mut self, address: Address) {
        if !self.modifications.iter().any(|m| matches!(m, StateModification::Checkpoint)) {
            return;
        }

        for mod_entry in self.modifications.iter().rev() {
            match mod_entry {
                StateModification::Checkpoint => break,
                StateModification::AccountSet { address: a, .. } if *a == address => return,
                _ => {}
            }
        }

        let old = self.accounts.get(&address).cloned();
        self.modifications.push(StateModification::AccountSet {
            address,
            old_account: old,
        });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum StateModification {
    Checkpoint,
    AccountSet {
        address: Address,
        old_account: Option<Account>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_balance() {
        let mut account = Account::new();
        account.add_balance(&Amount::from_u64(100)).unwrap();
        assert_eq!(account.balance, Amount::from_u64(100));

        account.sub_balance(&Amount::from_u64(50)).unwrap();
        assert_eq!(account.balance, Amount::from_u64(50));
        assert!(account.sub_balance(&Amount::from_u64(51)).is_err());
    }

    #[test]
    fn test_world_state_transfer() {
        let mut state = WorldState::new();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");

        state.credit(&alice, &Amount::from_u64(1000)).unwrap();
        state.transfer(&alice, &bob, &Amount::from_u64(300)).unwrap();

        assert_eq!(state.get_balance(&alice), Amount::from_u64(700));
        assert_eq!(state.get_balance(&bob), Amount::from_u64(300));
        assert_eq!(state.total_issuance(), Amount::from_u64(1000));
    }

    #[test]
    fn test_transfer_to_self_keeps_balance() {
        let mut state = WorldState::new();
        let alice = Address::from_label("alice");
        state.credit(&alice, &Amount::from_u64(10)).unwrap();
        state.transfer(&alice, &alice, &Amount::from_u64(10)).unwrap();
        assert_eq!(state.get_balance(&alice), Amount::from_u64(10));
    }

    #[test]
    fn test_insufficient_balance() {
        let mut state = WorldState::new();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        let err = state.transfer(&alice, &bob, &Amount::from_u64(1)).unwrap_err();
        assert!(matches!(err, BlockchainError::InsufficientBalance));
    }

    #[test]
    fn test_rollback_restores_accounts() {
        let mut state = WorldState::new();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        state.credit(&alice, &Amount::from_u64(500)).unwrap();
        let root_before = state.state_root().unwrap();

        state.checkpoint();
        state.transfer(&alice, &bob, &Amount::from_u64(200)).unwrap();
        state.transfer(&alice, &bob, &Amount::from_u64(100)).unwrap();
        state.rollback();

        assert_eq!(state.get_balance(&alice), Amount::from_u64(500));
        assert_eq!(state.get_balance(&bob), Amount::zero());
        assert_eq!(state.state_root().unwrap(), root_before);
    }

    #[test]
    fn test_commit_keeps_changes() {
        let mut state = WorldState::new();
        let alice = Address::from_label("alice");
        let bob = Address::from_label("bob");
        state.credit(&alice, &Amount::from_u64(500)).unwrap();

        state.checkpoint();
        state.transfer(&alice, &bob, &Amount::from_u64(200)).unwrap();
        state.commit();
        state.rollback();

        assert_eq!(state.get_balance(&bob), Amount::from_u64(200));
    }

    #[test]
    fn test_state_root_changes() {
        let mut state = WorldState::new();
        let root1 = state.state_root().unwrap();
        state.credit(&Address::from_label("alice"), &Amount::from_u64(100)).unwrap();
        assert_ne!(root1, state.state_root().unwrap());
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_transfers_conserve_issuance(
                moves in proptest::collection::vec((0usize..4, 0usize..4, 0u64..400), 0..40)
            ) {
                let holders: Vec<Address> = ["a", "b", "c", "d"].iter().map(|l| Address::from_label(l)).collect();
                let mut state = WorldState::new();
                for h in &holders {
                    state.credit(h, &Amount::from_u64(1_000)).unwrap();
                }
                let root = state.state_root().unwrap();

                state.checkpoint();
                for (from, to, value) in moves {
                    // Failed transfers must not change anything
                    let _ = state.transfer(&holders[from], &holders[to], &Amount::from_u64(value));
                    prop_assert_eq!(state.total_issuance(), Amount::from_u64(4_000));
                }
                state.rollback();
                prop_assert_eq!(state.state_root().unwrap(), root);
            }
        }
    }
}
