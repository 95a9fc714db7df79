// amm-token/src/config.rs

use crate::{TokenError, TokenResult};
use bonding_curve::CurveConfig;
use ledger_core::{Amount, GasPrice, DECIMALS, GWEI};
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Token configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    /// Decimal places; one whole unit is `10^decimals` base units
    pub decimals: u32,
    /// Initial deposit gas price cap
    pub max_gas_price: GasPrice,
    /// Pricing curve
    pub curve: CurveConfig,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: "AMM Token".into(),
            symbol: "AMMT".into(),
            decimals: DECIMALS,
            max_gas_price: 200 * GWEI,
            curve: CurveConfig::default(),
        }
    }
}

impl TokenConfig {
    /// Base units per whole unit
    pub fn unit_size(&self) -> Amount {
        Amount::new(BigUint::from(10u32).pow(self.decimals))
    }

    pub fn validate(&self) -> TokenResult<()> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() {
            return Err(TokenError::InvalidConfiguration("name and symbol are required".into()));
        }
        if self.decimals > 77 {
            return Err(TokenError::InvalidConfiguration(format!(
                "decimals {} exceed a 256-bit unit size",
                self.decimals
            )));
        }
        self.curve.validate()?;
        Ok(())
    }
}
