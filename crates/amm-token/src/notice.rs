// amm-token/src/notice.rs

//! Sealed self-notifications
//!
//! A sell moves units to (or approves) the ledger and then notifies the
//! ledger about it. The notification is only honored if the ledger issued it
//! itself within the same call: issuing stores a seal binding the ledger
//! address, a running counter and the notification contents, and redeeming
//! consumes it. Anyone calling the receiver entry points directly holds no
//! valid seal and is rejected.

use crate::{TokenError, TokenResult};
use ledger_core::Amount;
use ledger_crypto::{Address, Hash, HashAlgorithm, Hashable};

/// Notification the ledger sends itself during a sell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TransferReceived {
        operator: Address,
        from: Address,
        amount: Amount,
        data: Vec<u8>,
    },
    ApprovalReceived {
        owner: Address,
        amount: Amount,
        data: Vec<u8>,
    },
}

impl Notification {
    /// Account whose units are sold
    pub fn seller(&self) -> Address {
        match self {
            Notification::TransferReceived { from, .. } => *from,
            Notification::ApprovalReceived { owner, .. } => *owner,
        }
    }

    pub fn amount(&self) -> &Amount {
        match self {
            Notification::TransferReceived { amount, .. } | Notification::ApprovalReceived { amount, .. } => amount,
        }
    }

    fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            Notification::TransferReceived { operator, from, amount, data } => {
                out.push(0x01);
                out.extend_from_slice(operator.as_bytes());
                out.extend_from_slice(from.as_bytes());
                push_field(&mut out, &amount.inner().to_bytes_be());
                push_field(&mut out, data);
            }
            Notification::ApprovalReceived { owner, amount, data } => {
                out.push(0x02);
                out.extend_from_slice(owner.as_bytes());
                push_field(&mut out, &amount.inner().to_bytes_be());
                push_field(&mut out, data);
            }
        }
        out
    }
}

fn push_field(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u64).to_be_bytes());
    out.extend_from_slice(bytes);
}

/// Issues and redeems single-use notification seals
#[derive(Debug, Clone, Default)]
pub struct NoticeBook {
    issued: u64,
    pending: Option<Hash>,
}

impl NoticeBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Seal `notice` for delivery by `ledger` to itself
    pub fn issue(&mut self, ledger: &Address, notice: &Notification) -> Hash {
        self.issued += 1;
        let seal = Self::seal(ledger, self.issued, notice);
        self.pending = Some(seal);
        seal
    }

    /// Consume the pending seal if `caller` is the ledger and `seal` matches
    /// the one issued for exactly this notification
    ///
    /// The pending seal is cleared whatever the outcome.
    pub fn redeem(
        &mut self,
        ledger: &Address,
        caller: &Address,
        notice: &Notification,
        seal: Option<&Hash>,
    ) -> TokenResult<()> {
        let pending = self.pending.take();
        if caller != ledger {
            return Err(TokenError::Unauthorized);
        }
        let expected = Self::seal(ledger, self.issued, notice);
        match (pending, seal) {
            (Some(pending), Some(seal)) if pending == *seal && pending == expected => Ok(()),
            _ => Err(TokenError::Unauthorized),
        }
    }

    fn seal(ledger: &Address, counter: u64, notice: &Notification) -> Hash {
        let mut preimage = Vec::new();
        preimage.extend_from_slice(ledger.as_bytes());
        preimage.extend_from_slice(&counter.to_be_bytes());
        preimage.extend_from_slice(&notice.encode());
        preimage.hash_with(HashAlgorithm::Blake3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(amount: u64) -> Notification {
        let alice = Address::from_label("alice");
        Notification::TransferReceived {
            operator: alice,
            from: alice,
            amount: Amount::from_tokens(amount),
            data: Vec::new(),
        }
    }

    #[test]
    fn test_issue_and_redeem() {
        let ledger = Address::from_label("ledger");
        let mut book = NoticeBook::new();
        let seal = book.issue(&ledger, &notice(1));
        assert!(book.has_pending());
        assert!(book.redeem(&ledger, &ledger, &notice(1), Some(&seal)).is_ok());
        assert!(!book.has_pending());

        // Single use
        assert_eq!(
            book.redeem(&ledger, &ledger, &notice(1), Some(&seal)),
            Err(TokenError::Unauthorized)
        );
    }

    #[test]
    fn test_foreign_caller_rejected() {
        let ledger = Address::from_label("ledger");
        let mut book = NoticeBook::new();
        let seal = book.issue(&ledger, &notice(1));
        let mallory = Address::from_label("mallory");
        assert_eq!(
            book.redeem(&ledger, &mallory, &notice(1), Some(&seal)),
            Err(TokenError::Unauthorized)
        );
        assert!(!book.has_pending());
    }

    #[test]
    fn test_tampered_notification_rejected() {
        let ledger = Address::from_label("ledger");
        let mut book = NoticeBook::new();
        let seal = book.issue(&ledger, &notice(1));
        assert_eq!(
            book.redeem(&ledger, &ledger, &notice(2), Some(&seal)),
            Err(TokenError::Unauthorized)
        );
    }

    #[test]
    fn test_missing_or_forged_seal_rejected() {
        let ledger = Address::from_label("ledger");
        let mut book = NoticeBook::new();
        assert_eq!(book.redeem(&ledger, &ledger, &notice(1), None), Err(TokenError::Unauthorized));

        book.issue(&ledger, &notice(1));
        assert_eq!(
            book.redeem(&ledger, &ledger, &notice(1), Some(&Hash::zero())),
            Err(TokenError::Unauthorized)
        );
    }

    #[test]
    fn test_seals_are_not_reused_across_issues() {
        let ledger = Address::from_label("ledger");
        let mut book = NoticeBook::new();
        let first = book.issue(&ledger, &notice(1));
        let second = book.issue(&ledger, &notice(1));
        assert_ne!(first, second);
        assert_eq!(
            book.redeem(&ledger, &ledger, &notice(1), Some(&first)),
            Err(TokenError::Unauthorized)
        );
    }
}
