// amm-token/src/protocol.rs

//! Buy and sell protocols
//!
//! Buy: gas cap, non-zero deposit, exact curve amount, then mint.
//! Sell: authenticate the self-notification, require whole units, burn, and
//! only then pay the refund out through the [`ReserveBank`].

use crate::{
    bank::ReserveBank,
    events::LedgerEvent,
    notice::Notification,
    AmmToken, TokenError, TokenResult,
};
use ledger_core::{Amount, GasPrice};
use ledger_crypto::{Address, Hash};

/// Ambient context of a deposit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    /// Reserve currency sent along, already credited to the ledger account
    pub value: Amount,
    pub gas_price: GasPrice,
}

impl CallContext {
    pub fn new(caller: Address, value: Amount, gas_price: GasPrice) -> Self {
        Self { caller, value, gas_price }
    }
}

impl AmmToken {
    /// Buy units with the deposit carried by `ctx`
    ///
    /// Returns the number of whole units minted. On failure the host must
    /// return the deposit to the caller.
    pub fn receive(&mut self, ctx: &CallContext) -> TokenResult<u64> {
        let result = self.nonreentrant(|token| {
            token.admission.check(ctx.gas_price)?;
            if ctx.value.is_zero() {
                return Err(TokenError::ZeroDeposit);
            }

            let supply = token.ledger.supply_units();
            let units = token.ledger.curve().units_for_deposit(supply, &ctx.value)?;
            if token.ledger.curve().cost_to_buy(supply, units) != ctx.value {
                return Err(TokenError::FractionalOrUnderpricedDeposit {
                    deposit: ctx.value.clone(),
                });
            }

            token.ledger.mint(&ctx.caller, units)?;
            let minted = token.ledger.units_to_amount(units);
            token.emit(LedgerEvent::Transfer {
                from: Address::zero(),
                to: ctx.caller,
                amount: minted.clone(),
            });
            token.emit(LedgerEvent::Minted {
                buyer: ctx.caller,
                deposit_amount: ctx.value.clone(),
                units_minted: minted,
                reserve_balance: token.reserve_balance(),
                total_supply: token.total_supply(),
            });
            Ok(units)
        });

        match &result {
            Ok(units) => tracing::info!(buyer = %ctx.caller, units, deposit = %ctx.value, "units bought"),
            Err(e) => tracing::warn!(buyer = %ctx.caller, deposit = %ctx.value, error = %e, "deposit rejected"),
        }
        result
    }

    /// Sell by moving `amount` into the ledger and notifying it
    ///
    /// `to` must be the ledger itself.
    pub fn transfer_and_call(
        &mut self,
        caller: Address,
        to: Address,
        amount: Amount,
        data: Vec<u8>,
        bank: &mut dyn ReserveBank,
    ) -> TokenResult<Amount> {
        let result = self.nonreentrant(|token| {
            if to != token.address {
                return Err(TokenError::TransferTargetInvalid { to });
            }
            let ledger = token.address;
            token.ledger.transfer(&caller, &ledger, &amount)?;
            token.emit(LedgerEvent::Transfer { from: caller, to: ledger, amount: amount.clone() });

            let notice = Notification::TransferReceived {
                operator: caller,
                from: caller,
                amount,
                data,
            };
            let seal = token.notices.issue(&ledger, &notice);
            tracing::debug!(seal = %seal, "issued transfer notice");
            token.settle(&ledger, notice, Some(&seal), bank)
        });
        log_sell(&caller, &result);
        result
    }

    /// Sell by approving the ledger for `amount` and notifying it
    ///
    /// `spender` must be the ledger itself; the ledger pulls the units.
    pub fn approve_and_call(
        &mut self,
        caller: Address,
        spender: Address,
        amount: Amount,
        data: Vec<u8>,
        bank: &mut dyn ReserveBank,
    ) -> TokenResult<Amount> {
        let result = self.nonreentrant(|token| {
            if spender != token.address {
                return Err(TokenError::ApprovalTargetInvalid { spender });
            }
            let ledger = token.address;
            token.ledger.approve(&caller, &ledger, amount.clone())?;
            token.emit(LedgerEvent::Approval { owner: caller, spender: ledger, amount: amount.clone() });

            let notice = Notification::ApprovalReceived { owner: caller, amount, data };
            let seal = token.notices.issue(&ledger, &notice);
            tracing::debug!(seal = %seal, "issued approval notice");
            token.settle(&ledger, notice, Some(&seal), bank)
        });
        log_sell(&caller, &result);
        result
    }

    /// Receiver side of `transfer_and_call`
    ///
    /// Only honored when delivered by the ledger with the seal it issued;
    /// every direct call is `Unauthorized`.
    #[allow(clippy::too_many_arguments)]
    pub fn on_transfer_received(
        &mut self,
        caller: Address,
        operator: Address,
        from: Address,
        amount: Amount,
        data: Vec<u8>,
        seal: Option<Hash>,
        bank: &mut dyn ReserveBank,
    ) -> TokenResult<Amount> {
        self.nonreentrant(|token| {
            let notice = Notification::TransferReceived { operator, from, amount, data };
            token.settle(&caller, notice, seal.as_ref(), bank)
        })
    }

    /// Receiver side of `approve_and_call`
    pub fn on_approval_received(
        &mut self,
        caller: Address,
        owner: Address,
        amount: Amount,
        data: Vec<u8>,
        seal: Option<Hash>,
        bank: &mut dyn ReserveBank,
    ) -> TokenResult<Amount> {
        self.nonreentrant(|token| {
            let notice = Notification::ApprovalReceived { owner, amount, data };
            token.settle(&caller, notice, seal.as_ref(), bank)
        })
    }

    /// Burn the units a redeemed notification refers to and refund the seller
    fn settle(
        &mut self,
        caller: &Address,
        notice: Notification,
        seal: Option<&Hash>,
        bank: &mut dyn ReserveBank,
    ) -> TokenResult<Amount> {
        let ledger = self.address;
        self.notices.redeem(&ledger, caller, &notice, seal)?;

        let amount = notice.amount().clone();
        let units = self
            .ledger
            .whole_units(&amount)?
            .ok_or_else(|| TokenError::FractionalAmount { amount: amount.clone() })?;
        let seller = notice.seller();

        if let Notification::ApprovalReceived { owner, .. } = &notice {
            self.ledger.spend_allowance(owner, &ledger, &amount)?;
            self.ledger.transfer(owner, &ledger, &amount)?;
            self.emit(LedgerEvent::Transfer { from: *owner, to: ledger, amount: amount.clone() });
        }

        let refund = self.ledger.burn(&ledger, units)?;
        self.emit(LedgerEvent::Transfer { from: ledger, to: Address::zero(), amount: amount.clone() });

        // State is final before any reserve leaves the ledger
        bank.pay_out(self, &seller, &refund)?;

        self.emit(LedgerEvent::Burned {
            seller,
            units_burned: amount,
            refund_amount: refund.clone(),
            reserve_balance: self.reserve_balance(),
            total_supply: self.total_supply(),
        });
        Ok(refund)
    }
}

fn log_sell(seller: &Address, result: &TokenResult<Amount>) {
    match result {
        Ok(refund) => tracing::info!(%seller, %refund, "units sold"),
        Err(e) => tracing::warn!(%seller, error = %e, "sell rejected"),
    }
}
