// amm-token/src/token.rs

use crate::{
    events::LedgerEvent,
    guard::{AdmissionGuard, Ownable, ReentrancyGuard},
    ledger::TokenLedger,
    notice::NoticeBook,
    TokenConfig, TokenError, TokenResult,
};
use bonding_curve::{LinearCurve, UnitCount};
use ledger_core::{Amount, GasPrice, Nonce};
use ledger_crypto::Address;

/// Bonding-curve token deployed at a fixed ledger address
///
/// Owns the ledger state and every guard around it. Entry points that mutate
/// state run under the reentrancy lock and leave no trace when they fail.
#[derive(Debug, Clone)]
pub struct AmmToken {
    pub(crate) address: Address,
    pub(crate) name: String,
    pub(crate) symbol: String,
    pub(crate) decimals: u32,
    pub(crate) ledger: TokenLedger,
    pub(crate) ownable: Ownable,
    pub(crate) admission: AdmissionGuard,
    pub(crate) reentrancy: ReentrancyGuard,
    pub(crate) notices: NoticeBook,
    pub(crate) events: Vec<LedgerEvent>,
}

impl AmmToken {
    /// Deploy a token created by `creator`, who becomes its owner
    pub fn new(config: TokenConfig, creator: Address, creation_nonce: Nonce) -> TokenResult<Self> {
        config.validate()?;
        let curve = LinearCurve::new(&config.curve)?;
        let ledger = TokenLedger::new(curve, config.unit_size())?;
        let address = Address::contract(&creator, creation_nonce);

        tracing::info!(
            %address,
            owner = %creator,
            symbol = %config.symbol,
            unit_price = %config.curve.unit_price,
            max_gas_price = config.max_gas_price,
            "deployed AMM token"
        );

        Ok(Self {
            address,
            name: config.name,
            symbol: config.symbol,
            decimals: config.decimals,
            ledger,
            ownable: Ownable::new(creator),
            admission: AdmissionGuard::new(config.max_gas_price),
            reentrancy: ReentrancyGuard::new(),
            notices: NoticeBook::new(),
            events: Vec::new(),
        })
    }

    // Queries

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    pub fn owner(&self) -> Address {
        self.ownable.owner()
    }

    pub fn max_gas_price(&self) -> GasPrice {
        self.admission.max_gas_price()
    }

    pub fn curve(&self) -> &LinearCurve {
        self.ledger.curve()
    }

    /// Supply in base units
    pub fn total_supply(&self) -> Amount {
        self.ledger.total_supply()
    }

    pub fn supply_units(&self) -> UnitCount {
        self.ledger.supply_units()
    }

    pub fn balance_of(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(holder)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.ledger.allowance(owner, spender)
    }

    pub fn reserve_balance(&self) -> Amount {
        self.ledger.reserve_balance().clone()
    }

    /// Deposit needed to buy the next `n` units
    pub fn required_reserve_for(&self, n: UnitCount) -> Amount {
        self.curve().cost_to_buy(self.supply_units(), n)
    }

    /// Whole units `amount` would buy at the current supply
    pub fn units_purchasable_for(&self, amount: &Amount) -> TokenResult<UnitCount> {
        Ok(self.curve().units_for_deposit(self.supply_units(), amount)?)
    }

    pub fn next_unit_price(&self) -> Amount {
        self.curve().next_unit_price(self.supply_units())
    }

    pub fn is_locked(&self) -> bool {
        self.reentrancy.is_locked()
    }

    pub fn holders(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.ledger.holders()
    }

    /// Events emitted since the last `take_events`
    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain the emitted events
    ///
    /// Returns nothing while a call is in progress, so code running inside a
    /// sell cannot remove events the sell has already emitted.
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        if self.reentrancy.is_locked() {
            return Vec::new();
        }
        std::mem::take(&mut self.events)
    }

    /// Verify the ledger against the curve, and that the ledger holds none
    /// of its own units between transactions
    pub fn check_invariants(&self) -> TokenResult<()> {
        self.ledger.check_invariants()?;
        let stranded = self.ledger.balance_of(&self.address);
        if !stranded.is_zero() {
            return Err(TokenError::InvariantViolation(format!(
                "ledger holds {} of its own units",
                stranded
            )));
        }
        Ok(())
    }

    // ERC-20 surface

    pub fn transfer(&mut self, caller: Address, to: Address, amount: Amount) -> TokenResult<()> {
        self.nonreentrant(|token| {
            if to == token.address {
                return Err(TokenError::LedgerRecipient);
            }
            token.ledger.transfer(&caller, &to, &amount)?;
            token.emit(LedgerEvent::Transfer { from: caller, to, amount });
            Ok(())
        })
    }

    pub fn approve(&mut self, caller: Address, spender: Address, amount: Amount) -> TokenResult<()> {
        self.nonreentrant(|token| {
            token.ledger.approve(&caller, &spender, amount.clone())?;
            token.emit(LedgerEvent::Approval { owner: caller, spender, amount });
            Ok(())
        })
    }

    pub fn transfer_from(
        &mut self,
        caller: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> TokenResult<()> {
        self.nonreentrant(|token| {
            if to == token.address {
                return Err(TokenError::LedgerRecipient);
            }
            token.ledger.spend_allowance(&from, &caller, &amount)?;
            token.ledger.transfer(&from, &to, &amount)?;
            token.emit(LedgerEvent::Transfer { from, to, amount });
            Ok(())
        })
    }

    // Admin

    /// Replace the deposit gas price cap; owner only
    pub fn set_max_gas_price(&mut self, caller: Address, cap: GasPrice) -> TokenResult<()> {
        self.nonreentrant(|token| {
            token.ownable.only_owner(&caller)?;
            let previous = token.admission.set_max_gas_price(cap);
            tracing::info!(previous, current = cap, "max gas price changed");
            token.emit(LedgerEvent::MaxGasPriceChanged { previous, current: cap });
            Ok(())
        })
    }

    pub(crate) fn emit(&mut self, event: LedgerEvent) {
        self.events.push(event);
    }

    /// Run a mutating entry point under the reentrancy lock
    ///
    /// On failure the ledger, guards, pending seal and emitted events are
    /// restored to their state before the call.
    pub(crate) fn nonreentrant<T>(
        &mut self,
        op: impl FnOnce(&mut Self) -> TokenResult<T>,
    ) -> TokenResult<T> {
        self.reentrancy.acquire()?;

        let ledger = self.ledger.clone();
        let admission = self.admission;
        let notices = self.notices.clone();
        let emitted = self.events.len();

        let result = op(self);
        if result.is_err() {
            self.ledger = ledger;
            self.admission = admission;
            self.notices = notices;
            self.events.truncate(emitted);
        }

        self.reentrancy.release();
        result
    }
}
