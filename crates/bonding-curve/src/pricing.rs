// bonding-curve/src/pricing.rs

use crate::{config::CurveConfig, CurveError, CurveResult};
use ledger_core::Amount;
use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

/// Count of whole units
pub type UnitCount = u64;

/// Linear per-unit bonding curve
///
/// Stateless: every query takes the current supply as an argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinearCurve {
    unit_price: BigUint,
}

impl LinearCurve {
    /// Create curve from configuration
    pub fn new(config: &CurveConfig) -> CurveResult<Self> {
        config.validate()?;
        Ok(Self {
            unit_price: config.unit_price.inner().clone(),
        })
    }

    /// Price of the first unit
    pub fn unit_price(&self) -> Amount {
        Amount::new(self.unit_price.clone())
    }

    /// Price of the `k`-th unit ever issued (1-based)
    pub fn price_of_unit(&self, k: UnitCount) -> Amount {
        Amount::new(&self.unit_price * BigUint::from(k))
    }

    /// Price of the next unit at supply `supply`
    pub fn next_unit_price(&self, supply: UnitCount) -> Amount {
        Amount::new(&self.unit_price * (BigUint::from(supply) + 1u32))
    }

    /// Reserve required to back `n` units: `unit_price × n(n+1)/2`
    pub fn cumulative_cost(&self, n: UnitCount) -> Amount {
        let n = BigUint::from(n);
        let triangle = (&n * (&n + 1u32)) >> 1;
        Amount::new(&self.unit_price * triangle)
    }

    /// Cost of minting the next `n` units starting at supply `supply`
    ///
    /// `unit_price × Σ_{i=s+1}^{s+n} i = unit_price × n(2s+n+1)/2`. The
    /// product `n(2s+n+1)` is always even so the halving is exact.
    pub fn cost_to_buy(&self, supply: UnitCount, n: UnitCount) -> Amount {
        let s = BigUint::from(supply);
        let n = BigUint::from(n);
        let span = (&s << 1) + &n + 1u32;
        let units_sum = (&n * span) >> 1;
        Amount::new(&self.unit_price * units_sum)
    }

    /// Largest `n` such that `cost_to_buy(supply, n) <= amount`
    ///
    /// Solves `n² + n(2s+1) − 2q ≤ 0` with `q = ⌊amount / unit_price⌋`:
    /// `n = ⌊(√((2s+1)² + 8q) − (2s+1)) / 2⌋` using the integer square root.
    pub fn units_for_deposit(&self, supply: UnitCount, amount: &Amount) -> CurveResult<UnitCount> {
        let q = amount.inner() / &self.unit_price;
        if q.is_zero() {
            return Ok(0);
        }

        let b = (BigUint::from(supply) << 1) + 1u32;
        let discriminant: BigUint = &b * &b + (q << 3);
        let root = discriminant.sqrt();
        // root >= b because discriminant >= b²
        let n: BigUint = (root - &b) >> 1;

        let units = n.to_u64().ok_or_else(|| {
            CurveError::OverflowError(format!("deposit buys more than {} units", UnitCount::MAX))
        })?;

        debug_assert!(self.cost_to_buy(supply, units) <= *amount);
        tracing::trace!(supply, units, %amount, "priced deposit");
        Ok(units)
    }

    /// Reserve released by burning `n` units at supply `supply`
    ///
    /// `cumulative_cost(s) − cumulative_cost(s − n)`, which equals
    /// `cost_to_buy(s − n, n)`.
    pub fn refund_for(&self, supply: UnitCount, n: UnitCount) -> CurveResult<Amount> {
        let remaining = supply.checked_sub(n).ok_or(CurveError::SupplyUnderflow {
            requested: n,
            supply,
        })?;
        Ok(self.cost_to_buy(remaining, n))
    }
}
