//! Audit trail
//!
//! Follows the event log, logging every auction event and keeping
//! running totals of the value that moved through the auction.
use super::*;
use crate::{
    auction::{Amount, RevealOutcome},
    event::Event,
};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info, warn};

pub const AUDIT_SERVICE_ID: &str = "audit-trail";

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditTotals {
    pub bids_placed: u64,
    pub bids_revealed: u64,
    pub deposited: Amount,
    pub refunded: Amount,
    pub forfeited: Amount,
    pub settled: Amount,
}

pub type SharedAuditTotals = Arc<Mutex<AuditTotals>>;

#[derive(Default)]
pub struct AuditTrail {
    totals: SharedAuditTotals,
    /// Deposits of unrevealed bids, in placement order, so forfeits can be valued
    deposits: BTreeMap<String, VecDeque<Amount>>,
    /// Stake of the current leader, returned to it once outbid
    leading_stake: Option<Amount>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> SharedAuditTotals {
        self.totals.clone()
    }

    fn record(&mut self, event: &Event) {
        let mut totals = self.totals.lock();
        match event {
            Event::BidPlaced { bidder, deposit } => {
                totals.bids_placed += 1;
                totals.deposited = totals.deposited.saturating_add(*deposit);
                self.deposits
                    .entry(bidder.clone())
                    .or_default()
                    .push_back(*deposit);
            }
            Event::BidRevealed {
                bidder,
                refund,
                outcome,
            } => {
                totals.bids_revealed += 1;
                totals.refunded = totals.refunded.saturating_add(*refund);
                let deposit = self
                    .deposits
                    .get_mut(bidder)
                    .and_then(|deposits| deposits.pop_front());
                if *outcome == RevealOutcome::Forged {
                    let deposit = deposit.unwrap_or_default();
                    totals.forfeited = totals.forfeited.saturating_add(deposit);
                    warn!(%bidder, deposit, "deposit forfeited");
                }
            }
            Event::BidIncrease { bidder, amount } => {
                if let Some(displaced) = self.leading_stake.replace(*amount) {
                    totals.refunded = totals.refunded.saturating_add(displaced);
                }
                info!(%bidder, amount, "leader changed");
            }
            Event::AuctionEnded { winner, amount } => {
                self.leading_stake = None;
                totals.settled = totals.settled.saturating_add(*amount);
                info!(%winner, amount, "auction ended");
            }
            #[cfg(test)]
            Event::Test => {}
        }
    }
}

impl LogFollowerService for AuditTrail {
    fn get_log_progress_id(&self) -> String {
        AUDIT_SERVICE_ID.to_owned()
    }

    fn handle_event(&mut self, event: LogEvent) -> Result<()> {
        debug!(offset = event.offset, event = ?event.details, "event");
        self.record(&event.details);
        Ok(())
    }
}
