// bonding-curve/src/lib.rs

//! Linear bonding curve pricing
//!
//! The `k`-th unit costs `k × unit_price`, so buying `n` units at supply `s`
//! costs `unit_price × n(2s+n+1)/2` and the reserve backing `s` units is the
//! triangular number `unit_price × s(s+1)/2`. Everything is integer
//! arithmetic on arbitrary precision values.

pub mod config;
pub mod pricing;

pub use config::CurveConfig;
pub use pricing::{LinearCurve, UnitCount};

/// Result type for curve operations
pub type CurveResult<T> = Result<T, CurveError>;

/// Errors that can occur in curve operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Cannot price {requested} units against a supply of {supply}")]
    SupplyUnderflow { requested: UnitCount, supply: UnitCount },

    #[error("Overflow error: {0}")]
    OverflowError(String),
}
