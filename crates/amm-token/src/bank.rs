// amm-token/src/bank.rs

use crate::{AmmToken, TokenError, TokenResult};
use ledger_core::{Amount, WorldState};
use ledger_crypto::Address;

/// Reserve currency side of a sell
///
/// `pay_out` moves `amount` from the ledger's reserve account to `to`. It is
/// invoked after the ledger has burned the units, and an implementation may
/// run recipient code that calls back into `token`; such code observes the
/// post-burn state and cannot enter a mutating entry point.
pub trait ReserveBank {
    fn pay_out(&mut self, token: &mut AmmToken, to: &Address, amount: &Amount) -> TokenResult<()>;
}

/// Plain reserve transfer with no recipient code
impl ReserveBank for WorldState {
    fn pay_out(&mut self, token: &mut AmmToken, to: &Address, amount: &Amount) -> TokenResult<()> {
        self.transfer(&token.address(), to, amount)
            .map_err(|e| TokenError::Bank(e.to_string()))
    }
}
