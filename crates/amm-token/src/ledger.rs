// amm-token/src/ledger.rs

//! Token balances, allowances and the curve-backed reserve

use crate::{TokenError, TokenResult};
use bonding_curve::{CurveError, LinearCurve, UnitCount};
use ledger_core::Amount;
use ledger_crypto::Address;
use num_bigint::BigUint;
use num_traits::Zero;
use std::collections::HashMap;

/// Token ledger state
///
/// Supply is tracked in whole units; balances and allowances are in base
/// units (`unit_size` per whole unit). `reserve_balance` always equals
/// `curve.cumulative_cost(supply_units)`.
#[derive(Debug, Clone)]
pub struct TokenLedger {
    curve: LinearCurve,
    unit_size: Amount,
    supply_units: UnitCount,
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    reserve_balance: Amount,
}

impl TokenLedger {
    pub fn new(curve: LinearCurve, unit_size: Amount) -> TokenResult<Self> {
        if unit_size.is_zero() {
            return Err(TokenError::InvalidConfiguration("unit_size must be greater than zero".into()));
        }
        Ok(Self {
            curve,
            unit_size,
            supply_units: 0,
            balances: HashMap::new(),
            allowances: HashMap::new(),
            reserve_balance: Amount::zero(),
        })
    }

    pub fn curve(&self) -> &LinearCurve {
        &self.curve
    }

    pub fn unit_size(&self) -> &Amount {
        &self.unit_size
    }

    pub fn supply_units(&self) -> UnitCount {
        self.supply_units
    }

    /// Supply in base units
    pub fn total_supply(&self) -> Amount {
        self.units_to_amount(self.supply_units)
    }

    pub fn reserve_balance(&self) -> &Amount {
        &self.reserve_balance
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).cloned().unwrap_or_default()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).cloned().unwrap_or_default()
    }

    /// Holders with a non-zero balance
    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn units_to_amount(&self, units: UnitCount) -> Amount {
        Amount::new(self.unit_size.inner() * BigUint::from(units))
    }

    /// Whole units in `amount`, or `None` if it has a fractional part
    pub fn whole_units(&self, amount: &Amount) -> TokenResult<Option<UnitCount>> {
        let unit_size = self.unit_size.inner();
        if !(amount.inner() % unit_size).is_zero() {
            return Ok(None);
        }
        let units = amount.inner() / unit_size;
        u64::try_from(&units)
            .map(Some)
            .map_err(|_| CurveError::OverflowError(format!("{} units exceed the unit counter", units)).into())
    }

    /// Mint `n` units to `holder`, returning the reserve they cost
    ///
    /// The caller must already hold the returned amount in the ledger's
    /// reserve account.
    pub fn mint(&mut self, holder: &Address, n: UnitCount) -> TokenResult<Amount> {
        let new_supply = self
            .supply_units
            .checked_add(n)
            .ok_or_else(|| CurveError::OverflowError("supply counter overflow".into()))?;
        let cost = self.curve.cost_to_buy(self.supply_units, n);
        let minted = self.units_to_amount(n);

        self.credit(holder, &minted);
        self.supply_units = new_supply;
        self.reserve_balance = self.reserve_balance.clone() + cost.clone();

        tracing::debug!(%holder, units = n, %cost, supply = self.supply_units, "minted units");
        Ok(cost)
    }

    /// Burn `n` units held by `holder`, returning the reserve they release
    ///
    /// Balance, supply and reserve are all updated before this returns; the
    /// refund itself is paid out by the caller.
    pub fn burn(&mut self, holder: &Address, n: UnitCount) -> TokenResult<Amount> {
        if n > self.supply_units {
            return Err(TokenError::BurnExceedsSupply {
                requested: n,
                supply: self.supply_units,
            });
        }
        let refund = self.curve.refund_for(self.supply_units, n)?;
        let reserve_after = self
            .reserve_balance
            .checked_sub(&refund)
            .ok_or_else(|| TokenError::InvariantViolation("reserve smaller than refund".into()))?;

        let burned = self.units_to_amount(n);
        self.debit(holder, &burned)?;
        self.supply_units -= n;
        self.reserve_balance = reserve_after;

        tracing::debug!(%holder, units = n, %refund, supply = self.supply_units, "burned units");
        Ok(refund)
    }

    /// Move base units between holders
    pub fn transfer(&mut self, from: &Address, to: &Address, amount: &Amount) -> TokenResult<()> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.debit(from, amount)?;
        self.credit(to, amount);
        Ok(())
    }

    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        if amount.is_zero() {
            self.allowances.remove(&(*owner, *spender));
        } else {
            self.allowances.insert((*owner, *spender), amount);
        }
        Ok(())
    }

    /// Reduce the allowance `owner` granted `spender` by `amount`
    pub fn spend_allowance(&mut self, owner: &Address, spender: &Address, amount: &Amount) -> TokenResult<()> {
        let available = self.allowance(owner, spender);
        let remaining = available.checked_sub(amount).ok_or_else(|| TokenError::InsufficientAllowance {
            required: amount.clone(),
            available: available.clone(),
        })?;
        self.approve(owner, spender, remaining)
    }

    /// Verify supply, balances and reserve agree with the curve
    pub fn check_invariants(&self) -> TokenResult<()> {
        let expected_reserve = self.curve.cumulative_cost(self.supply_units);
        if self.reserve_balance != expected_reserve {
            return Err(TokenError::InvariantViolation(format!(
                "reserve {} != cumulative cost {} at supply {}",
                self.reserve_balance, expected_reserve, self.supply_units
            )));
        }

        let held = self.balances.values().fold(Amount::zero(), |acc, b| acc + b.clone());
        let supply = self.total_supply();
        if held != supply {
            return Err(TokenError::InvariantViolation(format!(
                "balances sum {} != total supply {}",
                held, supply
            )));
        }
        Ok(())
    }

    fn credit(&mut self, holder: &Address, amount: &Amount) {
        if amount.is_zero() {
            return;
        }
        let balance = self.balances.entry(*holder).or_default();
        *balance = balance.clone() + amount.clone();
    }

    fn debit(&mut self, holder: &Address, amount: &Amount) -> TokenResult<()> {
        let available = self.balance_of(holder);
        let remaining = available.checked_sub(amount).ok_or_else(|| TokenError::InsufficientBalance {
            required: amount.clone(),
            available: available.clone(),
        })?;
        if remaining.is_zero() {
            self.balances.remove(holder);
        } else {
            self.balances.insert(*holder, remaining);
        }
        Ok(())
    }
}
