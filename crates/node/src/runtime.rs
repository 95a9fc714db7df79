// node/src/runtime.rs
use crate::NodeConfig;
use amm_token::{AmmToken, CallContext, ReserveBank, TokenError, TokenResult};
use ledger_core::{
    Amount, BlockchainError, ExecutionStatus, GasPrice, Log, Transaction, TransactionReceipt,
    TransactionType, WorldState,
};
use ledger_crypto::{Address, Hash};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Token error: {0}")]
    Token(#[from] TokenError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] BlockchainError),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Invalid genesis: {0}")]
    InvalidGenesis(String),
}

/// Code run when an account receives a reserve-currency refund
///
/// The refund is already credited when the hook runs. The hook may query
/// `token` freely; mutating calls fail with a reentrancy error while the
/// refunding sell is in progress.
pub trait PayoutHook {
    fn on_payout(&mut self, token: &mut AmmToken, amount: &Amount) -> TokenResult<()>;
}

/// Transaction dispatcher hosting a single AMM token
///
/// Transactions run one at a time. Each either commits in full or leaves
/// both the reserve-currency world and the token untouched.
pub struct Runtime {
    world: WorldState,
    token: AmmToken,
    hooks: HashMap<Address, Box<dyn PayoutHook>>,
    receipts: Vec<TransactionReceipt>,
}

impl Runtime {
    /// Allocate genesis balances and deploy the token from the owner account
    pub fn new(config: &NodeConfig) -> RuntimeResult<Self> {
        let mut world = WorldState::new();
        for account in &config.genesis {
            world.credit(&account.address, &account.balance)?;
        }

        let creation_nonce = world.get_nonce(&config.owner);
        let token = AmmToken::new(config.token_config(), config.owner, creation_nonce)?;
        if config.genesis.iter().any(|account| account.address == token.address()) {
            return Err(RuntimeError::InvalidGenesis(format!(
                "{} is the ledger address and cannot hold a genesis balance",
                token.address()
            )));
        }
        world.increment_nonce(&config.owner);

        tracing::info!(
            ledger = %token.address(),
            accounts = config.genesis.len(),
            issuance = %world.total_issuance(),
            "runtime initialized"
        );

        Ok(Self {
            world,
            token,
            hooks: HashMap::new(),
            receipts: Vec::new(),
        })
    }

    pub fn token(&self) -> &AmmToken {
        &self.token
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn receipts(&self) -> &[TransactionReceipt] {
        &self.receipts
    }

    /// Every log emitted by committed transactions, in order
    pub fn logs(&self) -> impl Iterator<Item = &Log> {
        self.receipts.iter().flat_map(|r| r.logs.iter())
    }

    /// Attach recipient code to `address`
    pub fn register_hook(&mut self, address: Address, hook: Box<dyn PayoutHook>) {
        self.hooks.insert(address, hook);
    }

    /// Next nonce expected from `address`
    pub fn nonce_of(&self, address: &Address) -> u64 {
        self.world.get_nonce(address)
    }

    /// Execute a transaction and record its receipt
    ///
    /// A nonce mismatch or a transaction sent from the ledger address is
    /// returned as an error and nothing is recorded. A revert produces a
    /// `Reverted` receipt and still consumes the nonce.
    pub fn execute(&mut self, tx: Transaction) -> RuntimeResult<TransactionReceipt> {
        if tx.from == self.token.address() {
            return Err(BlockchainError::InvalidTransaction(format!(
                "ledger address {} cannot send transactions",
                tx.from
            ))
            .into());
        }
        let expected = self.world.get_nonce(&tx.from);
        if tx.nonce != expected {
            return Err(BlockchainError::NonceMismatch {
                expected,
                actual: tx.nonce,
            }
            .into());
        }
        let tx_hash = tx.hash()?;

        self.world.checkpoint();
        let snapshot = self.token.clone();

        let outcome = self.apply(&tx).and_then(|()| self.encode_logs());
        Ok(self.conclude(&tx, tx_hash, snapshot, outcome))
    }

    /// Commit or roll back a dispatched transaction, consume its nonce and
    /// record the receipt
    fn conclude(
        &mut self,
        tx: &Transaction,
        tx_hash: Hash,
        snapshot: AmmToken,
        outcome: RuntimeResult<Vec<Log>>,
    ) -> TransactionReceipt {
        let (status, revert_reason, logs) = match outcome {
            Ok(logs) => {
                self.world.commit();
                (ExecutionStatus::Success, None, logs)
            }
            Err(e) => {
                self.world.rollback();
                self.token = snapshot;
                tracing::warn!(tx = %tx_hash, from = %tx.from, error = %e, "transaction reverted");
                (ExecutionStatus::Reverted, Some(e.to_string()), Vec::new())
            }
        };
        self.world.increment_nonce(&tx.from);

        let receipt = TransactionReceipt {
            tx_hash,
            from: tx.from,
            to: tx.recipient(),
            nonce: tx.nonce,
            status,
            revert_reason,
            logs,
        };
        tracing::debug!(tx = %tx_hash, status = ?receipt.status, logs = receipt.logs.len(), "transaction executed");
        self.receipts.push(receipt.clone());
        receipt
    }

    /// Drain the token's events into logs
    fn encode_logs(&mut self) -> RuntimeResult<Vec<Log>> {
        let ledger = self.token.address();
        let logs = self
            .token
            .take_events()
            .iter()
            .map(|event| event.to_log(ledger))
            .collect::<TokenResult<Vec<_>>>()?;
        Ok(logs)
    }

    fn apply(&mut self, tx: &Transaction) -> RuntimeResult<()> {
        let Self { world, token, hooks, .. } = self;
        let caller = tx.from;
        let mut bank = HookedBank { world, hooks };

        match tx.tx_type.clone() {
            TransactionType::NativeTransfer { to, value } => {
                bank.world.transfer(&caller, &to, &value)?;
                if to == token.address() {
                    token.receive(&CallContext::new(caller, value, tx.gas_price))?;
                }
            }
            TransactionType::Transfer { to, amount } => token.transfer(caller, to, amount)?,
            TransactionType::Approve { spender, amount } => token.approve(caller, spender, amount)?,
            TransactionType::TransferFrom { from, to, amount } => {
                token.transfer_from(caller, from, to, amount)?
            }
            TransactionType::TransferAndCall { to, amount, data } => {
                token.transfer_and_call(caller, to, amount, data, &mut bank)?;
            }
            TransactionType::ApproveAndCall { spender, amount, data } => {
                token.approve_and_call(caller, spender, amount, data, &mut bank)?;
            }
            TransactionType::OnTransferReceived { operator, from, amount, data, seal } => {
                token.on_transfer_received(caller, operator, from, amount, data, seal, &mut bank)?;
            }
            TransactionType::OnApprovalReceived { owner, amount, data, seal } => {
                token.on_approval_received(caller, owner, amount, data, seal, &mut bank)?;
            }
            TransactionType::SetMaxGasPrice { cap } => token.set_max_gas_price(caller, cap)?,
        }
        Ok(())
    }

    /// Verify the token ledger and that the world holds exactly its reserve
    pub fn check_invariants(&self) -> RuntimeResult<()> {
        self.token.check_invariants()?;
        let held = self.world.get_balance(&self.token.address());
        let reserve = self.token.reserve_balance();
        if held != reserve {
            return Err(RuntimeError::InvariantViolation(format!(
                "ledger account holds {} but reserve is {}",
                held, reserve
            )));
        }
        Ok(())
    }

    pub fn summary(&self) -> RuntimeResult<LedgerSummary> {
        let token = &self.token;
        Ok(LedgerSummary {
            address: token.address(),
            owner: token.owner(),
            name: token.name().to_string(),
            symbol: token.symbol().to_string(),
            decimals: token.decimals(),
            supply_units: token.supply_units(),
            total_supply: token.total_supply(),
            reserve_balance: token.reserve_balance(),
            next_unit_price: token.next_unit_price(),
            max_gas_price: token.max_gas_price(),
            holders: token.holders().map(|(a, b)| (*a, b.clone())).collect(),
            transactions: self.receipts.len(),
            reverted: self.receipts.iter().filter(|r| !r.is_success()).count(),
            state_root: self.world.state_root()?,
        })
    }
}

/// Snapshot of the hosted token for reporting
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSummary {
    pub address: Address,
    pub owner: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub supply_units: u64,
    pub total_supply: Amount,
    pub reserve_balance: Amount,
    pub next_unit_price: Amount,
    pub max_gas_price: GasPrice,
    pub holders: BTreeMap<Address, Amount>,
    pub transactions: usize,
    pub reverted: usize,
    pub state_root: Hash,
}

/// Pays refunds out of the world state and runs the recipient's hook
struct HookedBank<'a> {
    world: &'a mut WorldState,
    hooks: &'a mut HashMap<Address, Box<dyn PayoutHook>>,
}

impl ReserveBank for HookedBank<'_> {
    fn pay_out(&mut self, token: &mut AmmToken, to: &Address, amount: &Amount) -> TokenResult<()> {
        self.world.pay_out(token, to, amount)?;
        if let Some(hook) = self.hooks.get_mut(to) {
            hook.on_payout(token, amount)?;
        }
        Ok(())
    }
}
