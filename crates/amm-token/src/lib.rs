// amm-token/src/lib.rs

//! Bonding-curve AMM token
//!
//! A ledger that mints units to anyone depositing reserve currency at the
//! price the linear curve dictates, and burns units on sale while refunding
//! exactly the reserve the curve releases:
//! - Buy: a plain deposit into the ledger address
//! - Sell: `transfer_and_call` / `approve_and_call` targeting the ledger,
//!   which routes through a sealed self-notification
//! - Admission: an owner-controlled gas price cap on deposits

pub mod bank;
pub mod config;
pub mod events;
pub mod guard;
pub mod ledger;
pub mod notice;
pub mod protocol;
pub mod token;

pub use bank::ReserveBank;
pub use config::TokenConfig;
pub use events::LedgerEvent;
pub use guard::{AdmissionGuard, Ownable, ReentrancyGuard};
pub use ledger::TokenLedger;
pub use notice::{NoticeBook, Notification};
pub use protocol::CallContext;
pub use token::AmmToken;

use bonding_curve::{CurveError, UnitCount};
use ledger_core::{Amount, GasPrice};
use ledger_crypto::Address;

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;

/// Reasons a token transaction reverts
///
/// Every variant aborts the triggering transaction with no state change.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("deposit amount must be > 0!")]
    ZeroDeposit,

    #[error("Fractions are not supported yet! deposit {deposit} does not buy a whole number of units")]
    FractionalOrUnderpricedDeposit { deposit: Amount },

    #[error("Fractions are not supported yet! {amount} is not a whole number of units")]
    FractionalAmount { amount: Amount },

    #[error("Transaction gas price cannot exceed maximum gas price! ({gas_price} > {max_gas_price})")]
    GasPriceExceeded { gas_price: GasPrice, max_gas_price: GasPrice },

    #[error("Only this contract can receive tokens")]
    Unauthorized,

    #[error("ERC1363: approve a non contract address ({spender})")]
    ApprovalTargetInvalid { spender: Address },

    #[error("ERC1363: transfer to non contract address ({to})")]
    TransferTargetInvalid { to: Address },

    #[error("Ownable: caller is not the owner")]
    NotOwner,

    #[error("ERC20: transfer amount exceeds balance (required {required}, available {available})")]
    InsufficientBalance { required: Amount, available: Amount },

    #[error("ERC20: insufficient allowance (required {required}, available {available})")]
    InsufficientAllowance { required: Amount, available: Amount },

    #[error("ERC20: transfer to the zero address")]
    ZeroAddress,

    #[error("Units sent to the ledger must use transfer_and_call")]
    LedgerRecipient,

    #[error("ReentrancyGuard: reentrant call")]
    Reentrancy,

    #[error("Burn of {requested} units exceeds supply {supply}")]
    BurnExceedsSupply { requested: UnitCount, supply: UnitCount },

    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    #[error("Reserve transfer failed: {0}")]
    Bank(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Event encoding error: {0}")]
    EventEncoding(String),
}
