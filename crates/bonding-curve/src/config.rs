// bonding-curve/src/config.rs

use crate::{CurveError, CurveResult};
use ledger_core::Amount;
use serde::{Deserialize, Serialize};

/// Curve configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurveConfig {
    /// Price of the first unit, in the smallest reserve denomination
    pub unit_price: Amount,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            unit_price: Amount::from_tokens(1), // first unit costs 1 whole reserve coin
        }
    }
}

impl CurveConfig {
    pub fn validate(&self) -> CurveResult<()> {
        if self.unit_price.is_zero() {
            return Err(CurveError::InvalidConfiguration(
                "unit_price must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
