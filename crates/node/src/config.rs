// node/src/config.rs
use amm_token::TokenConfig;
use bonding_curve::CurveConfig;
use ledger_core::{Amount, GasPrice, DECIMALS, GWEI};
use ledger_crypto::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Creator and owner of the token
    pub owner: Address,
    pub token: TokenSettings,
    #[serde(default)]
    pub genesis: Vec<GenesisAccount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenSettings {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub unit_price: Amount,
    pub max_gas_price: GasPrice,
}

/// Reserve currency allocated before the first transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenesisAccount {
    pub address: Address,
    pub balance: Amount,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let owner = Address::from_label("owner");
        Self {
            owner,
            token: TokenSettings {
                name: "AMM Token".into(),
                symbol: "AMMT".into(),
                decimals: DECIMALS,
                unit_price: Amount::from_tokens(1),
                max_gas_price: 200 * GWEI,
            },
            genesis: vec![
                GenesisAccount { address: owner, balance: Amount::from_tokens(10_000) },
                GenesisAccount {
                    address: Address::from_label("alice"),
                    balance: Amount::from_tokens(1_000_000),
                },
            ],
        }
    }
}

impl NodeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn to_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            name: self.token.name.clone(),
            symbol: self.token.symbol.clone(),
            decimals: self.token.decimals,
            max_gas_price: self.token.max_gas_price,
            curve: CurveConfig { unit_price: self.token.unit_price.clone() },
        }
    }

    /// Address the token is deployed at when the owner deploys first
    pub fn ledger_address(&self) -> Address {
        Address::contract(&self.owner, 0)
    }
}
