//! Value custody
//!
//! The auction never holds value itself: deposits go into the custody of
//! a `Treasury`, and every refund or settlement is a payout out of it.
use crate::auction::{Amount, BidderId, BidderIdRef, Payout};
use anyhow::{bail, format_err, Result};
use parking_lot::Mutex;
use serde::Serialize;
use std::{collections::BTreeMap, sync::Arc};

pub trait Treasury {
    /// Take `amount` from `from` into the auction's custody
    fn escrow(&self, from: BidderIdRef, amount: Amount) -> Result<()>;

    /// Undo an `escrow` of `amount` by `to`, as if it never happened
    fn release(&self, to: BidderIdRef, amount: Amount) -> Result<()>;

    /// Move every payout out of custody, all or nothing
    ///
    /// On error no payout has been applied.
    fn pay(&self, payouts: &[Payout]) -> Result<()>;

    /// Value currently held on behalf of the auction
    fn custody(&self) -> Amount;
}

pub type SharedTreasury = Arc<dyn Treasury + Send + Sync + 'static>;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Total ever escrowed by this identity
    pub deposited: Amount,
    /// Total ever paid out to this identity
    pub received: Amount,
}

#[derive(Default, Debug)]
struct Ledger {
    accounts: BTreeMap<BidderId, Account>,
    custody: Amount,
}

#[derive(Default, Debug)]
pub struct InMemoryTreasury {
    ledger: Mutex<Ledger>,
}

impl InMemoryTreasury {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn account(&self, id: BidderIdRef) -> Account {
        self.ledger
            .lock()
            .accounts
            .get(id)
            .copied()
            .unwrap_or_default()
    }
}

impl Treasury for InMemoryTreasury {
    fn escrow(&self, from: BidderIdRef, amount: Amount) -> Result<()> {
        let mut ledger = self.ledger.lock();
        let custody = ledger
            .custody
            .checked_add(amount)
            .ok_or_else(|| format_err!("custody overflow"))?;
        let account = ledger.accounts.entry(from.to_owned()).or_default();
        account.deposited = account
            .deposited
            .checked_add(amount)
            .ok_or_else(|| format_err!("deposit overflow for {from}"))?;
        ledger.custody = custody;
        Ok(())
    }

    fn release(&self, to: BidderIdRef, amount: Amount) -> Result<()> {
        let mut ledger = self.ledger.lock();
        let custody = ledger
            .custody
            .checked_sub(amount)
            .ok_or_else(|| format_err!("releasing {amount} out of {}", ledger.custody))?;
        let account = ledger
            .accounts
            .get_mut(to)
            .filter(|account| amount <= account.deposited)
            .ok_or_else(|| format_err!("{to} has not escrowed {amount}"))?;
        account.deposited -= amount;
        ledger.custody = custody;
        Ok(())
    }

    fn pay(&self, payouts: &[Payout]) -> Result<()> {
        let mut ledger = self.ledger.lock();

        let total = payouts
            .iter()
            .try_fold(0 as Amount, |acc, p| acc.checked_add(p.amount))
            .ok_or_else(|| format_err!("payout total overflow"))?;
        if total > ledger.custody {
            bail!(
                "insufficient custody: paying {} out of {}",
                total,
                ledger.custody
            );
        }

        ledger.custody -= total;
        for payout in payouts.iter().filter(|p| p.amount > 0) {
            let account = ledger.accounts.entry(payout.payee.clone()).or_default();
            account.received = account.received.saturating_add(payout.amount);
        }
        Ok(())
    }

    fn custody(&self) -> Amount {
        self.ledger.lock().custody
    }
}
