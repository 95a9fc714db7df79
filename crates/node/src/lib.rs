// node/src/lib.rs
pub mod config;
pub mod runtime;

pub use config::{GenesisAccount, NodeConfig, TokenSettings};
pub use runtime::{LedgerSummary, PayoutHook, Runtime, RuntimeError, RuntimeResult};
