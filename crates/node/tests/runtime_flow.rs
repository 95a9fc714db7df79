//! Dispatcher scenarios: atomicity, nonces, payout hooks and configuration

use amm_token::{AmmToken, LedgerEvent, TokenError, TokenResult};
use ledger_core::{Amount, ExecutionStatus, Transaction, TransactionType, GWEI};
use ledger_crypto::Address;
use ledger_core::BlockchainError;
use node::{GenesisAccount, NodeConfig, PayoutHook, Runtime, RuntimeError};
use std::sync::{Arc, Mutex};

fn eth(n: u64) -> Amount {
    Amount::from_tokens(n)
}

fn submit(runtime: &mut Runtime, from: Address, call: TransactionType) -> ledger_core::TransactionReceipt {
    let tx = Transaction::new(from, runtime.nonce_of(&from), call, 10 * GWEI);
    runtime.execute(tx).unwrap()
}

fn setup() -> (Runtime, Address, Address) {
    let config = NodeConfig::default();
    let alice = Address::from_label("alice");
    (Runtime::new(&config).unwrap(), config.owner, alice)
}

#[test]
fn buy_then_sell_everything_round_trips() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    let start = runtime.world().get_balance(&alice);

    let bought = submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(210) });
    assert!(bought.is_success());
    assert_eq!(runtime.token().balance_of(&alice), eth(20));

    let sold = submit(
        &mut runtime,
        alice,
        TransactionType::TransferAndCall { to: ledger, amount: eth(20), data: Vec::new() },
    );
    assert!(sold.is_success());
    let burned = sold
        .logs
        .iter()
        .filter_map(|log| LedgerEvent::from_log(log).ok())
        .find(|event| matches!(event, LedgerEvent::Burned { .. }));
    assert!(matches!(burned, Some(LedgerEvent::Burned { refund_amount, .. }) if refund_amount == eth(210)));

    assert_eq!(runtime.world().get_balance(&alice), start);
    assert_eq!(runtime.token().supply_units(), 0);
    assert!(runtime.world().get_balance(&ledger).is_zero());
    runtime.check_invariants().unwrap();
}

#[test]
fn reverted_sell_leaves_everything_in_place() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(3) });
    let root = runtime.world().state_root().unwrap();

    let receipt = submit(
        &mut runtime,
        alice,
        TransactionType::ApproveAndCall { spender: ledger, amount: Amount::from_u64(1), data: Vec::new() },
    );
    assert_eq!(receipt.status, ExecutionStatus::Reverted);
    assert!(receipt.logs.is_empty());
    assert!(runtime.token().allowance(&alice, &ledger).is_zero());
    assert_eq!(runtime.token().balance_of(&alice), eth(2));
    // Only the sender nonce moved
    assert_ne!(runtime.world().state_root().unwrap(), root);
    assert_eq!(runtime.world().get_balance(&ledger), eth(3));
    runtime.check_invariants().unwrap();
}

#[test]
fn forged_notification_is_unauthorized() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(1) });

    let mallory = Address::from_label("mallory");
    let receipt = submit(
        &mut runtime,
        mallory,
        TransactionType::OnTransferReceived {
            operator: alice,
            from: alice,
            amount: eth(1),
            data: Vec::new(),
            seal: None,
        },
    );
    assert_eq!(receipt.revert_reason.as_deref(), Some("Token error: Only this contract can receive tokens"));
    assert_eq!(runtime.token().supply_units(), 1);
}

#[test]
fn gas_cap_admission() {
    let (mut runtime, owner, alice) = setup();
    let ledger = runtime.token().address();

    let denied = submit(&mut runtime, alice, TransactionType::SetMaxGasPrice { cap: GWEI });
    assert!(denied.revert_reason.unwrap().contains("Ownable: caller is not the owner"));

    let changed = submit(&mut runtime, owner, TransactionType::SetMaxGasPrice { cap: 5 * GWEI });
    assert!(changed.is_success());
    assert_eq!(runtime.token().max_gas_price(), 5 * GWEI);

    // submit() pays 10 gwei
    let before = runtime.world().get_balance(&alice);
    let rejected = submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(1) });
    assert!(rejected.revert_reason.unwrap().contains("Transaction gas price cannot exceed maximum gas price!"));
    assert_eq!(runtime.world().get_balance(&alice), before);
}

#[derive(Default)]
struct Observed {
    balance: Option<Amount>,
    supply: Option<u64>,
    reserve: Option<Amount>,
    reentry: Option<TokenResult<()>>,
}

/// Receiving contract that inspects the ledger and tries to re-enter it
struct GreedyReceiver {
    address: Address,
    observed: Arc<Mutex<Observed>>,
}

impl PayoutHook for GreedyReceiver {
    fn on_payout(&mut self, token: &mut AmmToken, _amount: &Amount) -> TokenResult<()> {
        let reentry = token.transfer(self.address, Address::from_label("accomplice"), eth(1));
        let mut observed = self.observed.lock().unwrap();
        observed.balance = Some(token.balance_of(&self.address));
        observed.supply = Some(token.supply_units());
        observed.reserve = Some(token.reserve_balance());
        observed.reentry = Some(reentry);
        Ok(())
    }
}

#[test]
fn payout_hook_sees_post_burn_state() {
    let receiver = Address::from_label("receiver");
    let mut config = NodeConfig::default();
    config.genesis.push(GenesisAccount { address: receiver, balance: eth(100) });
    let mut runtime = Runtime::new(&config).unwrap();
    let ledger = runtime.token().address();

    let observed = Arc::new(Mutex::new(Observed::default()));
    runtime.register_hook(receiver, Box::new(GreedyReceiver { address: receiver, observed: observed.clone() }));

    submit(&mut runtime, receiver, TransactionType::NativeTransfer { to: ledger, value: eth(3) });
    let receipt = submit(
        &mut runtime,
        receiver,
        TransactionType::TransferAndCall { to: ledger, amount: eth(1), data: Vec::new() },
    );
    assert!(receipt.is_success());

    let observed = observed.lock().unwrap();
    assert_eq!(observed.balance, Some(eth(1)));
    assert_eq!(observed.supply, Some(1));
    assert_eq!(observed.reserve, Some(eth(1)));
    assert_eq!(observed.reentry, Some(Err(TokenError::Reentrancy)));
    assert_eq!(runtime.token().balance_of(&Address::from_label("accomplice")), Amount::zero());
    runtime.check_invariants().unwrap();
}

/// Receiving contract that tries to erase the sell's events
struct EventEraser {
    erased: Arc<Mutex<Option<usize>>>,
}

impl PayoutHook for EventEraser {
    fn on_payout(&mut self, token: &mut AmmToken, _amount: &Amount) -> TokenResult<()> {
        *self.erased.lock().unwrap() = Some(token.take_events().len());
        Ok(())
    }
}

#[test]
fn payout_hook_cannot_erase_sell_events() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    let erased = Arc::new(Mutex::new(None));
    runtime.register_hook(alice, Box::new(EventEraser { erased: erased.clone() }));

    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(3) });
    let receipt = submit(
        &mut runtime,
        alice,
        TransactionType::TransferAndCall { to: ledger, amount: eth(1), data: Vec::new() },
    );
    assert!(receipt.is_success());
    assert_eq!(*erased.lock().unwrap(), Some(0));

    let events: Vec<_> = receipt.logs.iter().map(|log| LedgerEvent::from_log(log).unwrap()).collect();
    assert_eq!(events.len(), 3);
    assert!(matches!(&events[0], LedgerEvent::Transfer { from, to, .. } if *from == alice && *to == ledger));
    assert!(matches!(&events[1], LedgerEvent::Transfer { from, to, .. } if *from == ledger && to.is_zero()));
    assert!(matches!(&events[2], LedgerEvent::Burned { refund_amount, .. } if *refund_amount == eth(3)));
    runtime.check_invariants().unwrap();
}

#[test]
fn ledger_address_cannot_originate_transactions() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    let mallory = Address::from_label("mallory");
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(55) });

    let drain = Transaction::new(
        ledger,
        runtime.nonce_of(&ledger),
        TransactionType::NativeTransfer { to: mallory, value: eth(55) },
        10 * GWEI,
    );
    assert!(matches!(
        runtime.execute(drain),
        Err(RuntimeError::Ledger(BlockchainError::InvalidTransaction(_)))
    ));
    assert_eq!(runtime.receipts().len(), 1);
    assert!(runtime.world().get_balance(&mallory).is_zero());
    assert_eq!(runtime.world().get_balance(&ledger), eth(55));
    runtime.check_invariants().unwrap();

    // Holders can still sell against the full reserve
    let sold = submit(
        &mut runtime,
        alice,
        TransactionType::TransferAndCall { to: ledger, amount: eth(10), data: Vec::new() },
    );
    assert!(sold.is_success());
    assert!(runtime.world().get_balance(&ledger).is_zero());
    runtime.check_invariants().unwrap();
}

#[test]
fn genesis_cannot_fund_the_ledger_address() {
    let mut config = NodeConfig::default();
    let ledger = config.ledger_address();
    config.genesis.push(GenesisAccount { address: ledger, balance: eth(5) });
    assert!(matches!(Runtime::new(&config), Err(RuntimeError::InvalidGenesis(_))));
}

struct FailingReceiver;

impl PayoutHook for FailingReceiver {
    fn on_payout(&mut self, _token: &mut AmmToken, _amount: &Amount) -> TokenResult<()> {
        Err(TokenError::Bank("receiver refused payment".into()))
    }
}

#[test]
fn failing_hook_reverts_the_sell() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    runtime.register_hook(alice, Box::new(FailingReceiver));

    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(1) });
    let receipt = submit(
        &mut runtime,
        alice,
        TransactionType::TransferAndCall { to: ledger, amount: eth(1), data: Vec::new() },
    );
    assert_eq!(receipt.status, ExecutionStatus::Reverted);
    assert_eq!(runtime.token().balance_of(&alice), eth(1));
    assert_eq!(runtime.world().get_balance(&ledger), eth(1));
    runtime.check_invariants().unwrap();
}

#[test]
fn config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    let mut config = NodeConfig::default();
    config.token.max_gas_price = 42 * GWEI;
    config.to_file(&path).unwrap();

    let loaded = NodeConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(Runtime::new(&loaded).unwrap().token().max_gas_price(), 42 * GWEI);
}

#[test]
fn receipts_accumulate_in_order() {
    let (mut runtime, _, alice) = setup();
    let ledger = runtime.token().address();
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(1) });
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: Amount::zero() });
    submit(&mut runtime, alice, TransactionType::NativeTransfer { to: ledger, value: eth(2) });

    let nonces: Vec<_> = runtime.receipts().iter().map(|r| r.nonce).collect();
    assert_eq!(nonces, vec![0, 1, 2]);
    assert_eq!(runtime.receipts()[1].status, ExecutionStatus::Reverted);

    let minted = runtime
        .logs()
        .filter(|log| matches!(LedgerEvent::from_log(log), Ok(LedgerEvent::Minted { .. })))
        .count();
    assert_eq!(minted, 2);

    let summary = runtime.summary().unwrap();
    assert_eq!(summary.supply_units, 2);
    assert_eq!(summary.reverted, 1);
}
