// ledger-core/src/types.rs

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::ops::Add;
use std::str::FromStr;

/// Transaction nonce
pub type Nonce = u64;

/// Gas price (smallest currency denomination per gas unit)
pub type GasPrice = u64;

/// Timestamp in Unix epoch seconds
pub type Timestamp = u64;

/// One gwei in the smallest currency denomination
pub const GWEI: GasPrice = 1_000_000_000;

/// Decimal places of the reserve currency and of the issued unit
pub const DECIMALS: u32 = 18;

/// Token or currency amount in the smallest denomination
///
/// Arbitrary precision so curve arithmetic never overflows. Serialized as a
/// decimal string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(BigUint);

impl Amount {
    pub fn new(value: BigUint) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_u64(value: u64) -> Self {
        Self(BigUint::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(BigUint::from(value))
    }

    /// Whole tokens scaled by 10^18 (1 token = 10^18 base units, like ETH/wei)
    pub fn from_tokens(tokens: u64) -> Self {
        Self(BigUint::from(tokens) * BigUint::from(10u64).pow(DECIMALS))
    }

    /// 10^decimals, the base-unit size of one whole token
    pub fn one_token() -> Self {
        Self::from_tokens(1)
    }

    pub fn inner(&self) -> &BigUint {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(&self, other: &Amount) -> Option<Amount> {
        Some(Amount(&self.0 + &other.0))
    }

    pub fn checked_sub(&self, other: &Amount) -> Option<Amount> {
        if self.0 < other.0 {
            None
        } else {
            Some(Amount(&self.0 - &other.0))
        }
    }
}

impl From<BigUint> for Amount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self::from_u64(value)
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, other: Amount) -> Amount {
        Amount(self.0 + other.0)
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = crate::BlockchainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().replace('_', "");
        BigUint::from_str(&trimmed)
            .map(Amount)
            .map_err(|e| crate::BlockchainError::InvalidAmount(format!("{}: {}", s, e)))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Amount::from_str(&s).map_err(de::Error::custom)
    }
}

/// Current wall-clock time
pub fn current_timestamp() -> Timestamp {
    chrono::Utc::now().timestamp().max(0) as Timestamp
}
