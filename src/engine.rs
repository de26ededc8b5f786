//! Auction Engine
//!
//! The sealed-bid state machine. Bidders place hashed bids with a deposit
//! until `bidding_end`, disclose them until `reveal_end`, and after that
//! anyone can settle the auction, paying the best bid to the beneficiary.
//!
//! The phase is never stored: every call compares the clock against the
//! two deadlines. Each call is all-or-nothing. Everything that could fail
//! (phase checks, the value transfer) happens before any state is touched.
use crate::{
    auction::{
        Amount, Bid, BidderId, BidderIdRef, Leader, Payout, Phase, RevealOutcome, RevealedBid,
        Settlement,
    },
    bid_book::BidBook,
    clock::{SharedClock, Timestamp},
    commitment::Commitment,
    error::{AuctionError, PhaseViolation},
    event::Event,
    event_log,
    treasury::SharedTreasury,
};
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuctionConfig {
    /// Length of the bidding phase, in milliseconds
    pub bidding_time: Timestamp,
    /// Length of the reveal phase, in milliseconds
    pub reveal_time: Timestamp,
    pub beneficiary: BidderId,
}

/// What a reveal will do, computed before anything is changed
struct RevealPlan {
    outcome: RevealOutcome,
    refund: Amount,
    new_leader: Option<Leader>,
    payouts: Vec<Payout>,
}

pub struct AuctionEngine {
    beneficiary: BidderId,
    bids: BidBook,
    bidding_end: Timestamp,
    reveal_end: Timestamp,
    leader: Option<Leader>,
    finalized: bool,
    clock: SharedClock,
    treasury: SharedTreasury,
    event_writer: event_log::SharedWriter,
}

impl AuctionEngine {
    pub fn new(
        config: AuctionConfig,
        clock: SharedClock,
        treasury: SharedTreasury,
        event_writer: event_log::SharedWriter,
    ) -> Result<Self, AuctionError> {
        if config.bidding_time == 0 {
            return Err(AuctionError::InvalidParameter(
                "bidding time must be positive",
            ));
        }
        if config.reveal_time == 0 {
            return Err(AuctionError::InvalidParameter(
                "reveal time must be positive",
            ));
        }

        let now = clock.now();
        let bidding_end = now
            .checked_add(config.bidding_time)
            .ok_or(AuctionError::InvalidParameter("bidding time out of range"))?;
        let reveal_end = bidding_end
            .checked_add(config.reveal_time)
            .ok_or(AuctionError::InvalidParameter("reveal time out of range"))?;

        info!(
            beneficiary = %config.beneficiary,
            bidding_end, reveal_end, "auction created"
        );

        Ok(Self {
            beneficiary: config.beneficiary,
            bids: BidBook::new(),
            bidding_end,
            reveal_end,
            leader: None,
            finalized: false,
            clock,
            treasury,
            event_writer,
        })
    }

    pub fn beneficiary(&self) -> BidderIdRef {
        &self.beneficiary
    }

    pub fn bidding_end(&self) -> Timestamp {
        self.bidding_end
    }

    pub fn reveal_end(&self) -> Timestamp {
        self.reveal_end
    }

    pub fn leader(&self) -> Option<&Leader> {
        self.leader.as_ref()
    }

    pub fn pending_bids(&self, bidder: BidderIdRef) -> usize {
        self.bids.pending(bidder)
    }

    pub fn total_pending_bids(&self) -> usize {
        self.bids.total_pending()
    }

    pub fn phase(&self) -> Phase {
        let now = self.clock.now();
        if self.finalized {
            Phase::Settled
        } else if now < self.bidding_end {
            Phase::Bidding
        } else if now < self.reveal_end {
            Phase::Reveal
        } else {
            Phase::Settleable
        }
    }

    /// Record a sealed bid
    ///
    /// The deposit must already be in the treasury's custody.
    pub fn place_bid(
        &mut self,
        bidder: BidderIdRef,
        deposit: Amount,
        commitment: Commitment,
    ) -> Result<(), AuctionError> {
        self.only_before(self.bidding_end)?;

        self.bids.push(
            bidder,
            Bid {
                commitment,
                deposit,
            },
        );
        debug!(?bidder, deposit, "bid placed");

        self.publish(&[Event::BidPlaced {
            bidder: bidder.to_owned(),
            deposit,
        }]);
        Ok(())
    }

    /// Disclose the oldest unrevealed bid of `bidder`, returning the refund paid
    ///
    /// A disclosure that does not match the commitment is not an error:
    /// the bid is consumed and its deposit forfeited.
    pub fn reveal(
        &mut self,
        bidder: BidderIdRef,
        revealed: Option<RevealedBid>,
    ) -> Result<Amount, AuctionError> {
        self.only_after(self.bidding_end)?;
        self.only_before(self.reveal_end)?;
        let bid = *self
            .bids
            .oldest(bidder)
            .ok_or(AuctionError::NoBidsToReveal)?;
        let revealed =
            revealed.ok_or(AuctionError::InvalidParameter("revealed bid is missing"))?;

        let plan = self.plan_reveal(bidder, &bid, &revealed);

        self.treasury
            .pay(&plan.payouts)
            .map_err(AuctionError::Transfer)?;

        self.bids.pop_oldest(bidder);

        let mut events = vec![Event::BidRevealed {
            bidder: bidder.to_owned(),
            refund: plan.refund,
            outcome: plan.outcome,
        }];
        if let Some(leader) = plan.new_leader {
            info!(bidder = %leader.bidder, amount = leader.amount, "new highest bid");
            events.push(Event::BidIncrease {
                bidder: leader.bidder.clone(),
                amount: leader.amount,
            });
            self.leader = Some(leader);
        }

        match plan.outcome {
            RevealOutcome::Forged => warn!(?bidder, deposit = bid.deposit, "forged reveal"),
            outcome => debug!(?bidder, ?outcome, refund = plan.refund, "bid revealed"),
        }

        self.publish(&events);
        Ok(plan.refund)
    }

    /// Pay the best bid to the beneficiary and report the winner
    ///
    /// Safe to call repeatedly: once paid, the leader is gone and any
    /// further call finds no winner.
    pub fn finalize(&mut self, caller: BidderIdRef) -> Result<Option<Settlement>, AuctionError> {
        self.only_after(self.reveal_end)?;

        let settlement = match &self.leader {
            Some(leader) => {
                self.treasury
                    .pay(&[Payout::new(&self.beneficiary, leader.amount)])
                    .map_err(AuctionError::Transfer)?;

                Some(Settlement {
                    winner: leader.bidder.clone(),
                    amount: leader.amount,
                })
            }
            None => None,
        };

        self.leader = None;
        self.finalized = true;

        match &settlement {
            Some(settlement) => {
                info!(
                    ?caller,
                    winner = %settlement.winner,
                    amount = settlement.amount,
                    "auction settled"
                );
                self.publish(&[Event::AuctionEnded {
                    winner: settlement.winner.clone(),
                    amount: settlement.amount,
                }]);
            }
            None => debug!(?caller, "auction finalized without a winner"),
        }

        Ok(settlement)
    }

    fn plan_reveal(&self, bidder: BidderIdRef, bid: &Bid, revealed: &RevealedBid) -> RevealPlan {
        if !bid
            .commitment
            .opens_to(revealed.value, revealed.fake, &revealed.salt)
        {
            return RevealPlan {
                outcome: RevealOutcome::Forged,
                refund: 0,
                new_leader: None,
                payouts: vec![],
            };
        }

        let outcome = if revealed.fake {
            RevealOutcome::Fake
        } else if bid.deposit < revealed.value {
            RevealOutcome::Underfunded
        } else {
            match self.consider_bid(bidder, revealed.value) {
                Some((new_leader, displaced)) => {
                    let refund = bid.deposit - revealed.value;
                    let payouts = displaced
                        .into_iter()
                        .chain(Some(Payout::new(bidder, refund)))
                        .filter(|p| p.amount > 0)
                        .collect();
                    return RevealPlan {
                        outcome: RevealOutcome::Leading,
                        refund,
                        new_leader: Some(new_leader),
                        payouts,
                    };
                }
                None => RevealOutcome::Outbid,
            }
        };

        RevealPlan {
            outcome,
            refund: bid.deposit,
            new_leader: None,
            payouts: if bid.deposit > 0 {
                vec![Payout::new(bidder, bid.deposit)]
            } else {
                vec![]
            },
        }
    }

    /// Would `value` become the best bid?
    ///
    /// If so, returns the new leader and the payout returning the
    /// displaced leader's whole stake.
    fn consider_bid(&self, bidder: BidderIdRef, value: Amount) -> Option<(Leader, Option<Payout>)> {
        match &self.leader {
            Some(leader) if !leader.is_outbidded_by(value) => None,
            current => Some((
                Leader {
                    bidder: bidder.to_owned(),
                    amount: value,
                },
                current
                    .as_ref()
                    .map(|leader| Payout::new(&leader.bidder, leader.amount)),
            )),
        }
    }

    fn only_before(&self, when: Timestamp) -> Result<(), PhaseViolation> {
        if self.clock.now() < when {
            Ok(())
        } else {
            Err(PhaseViolation::TooLate)
        }
    }

    fn only_after(&self, when: Timestamp) -> Result<(), PhaseViolation> {
        if when < self.clock.now() {
            Ok(())
        } else {
            Err(PhaseViolation::TooEarly)
        }
    }

    /// Events describe already committed changes; losing one must not undo the call.
    fn publish(&self, events: &[Event]) {
        if let Err(e) = self.event_writer.write(events) {
            warn!(error = %e, "failed to publish auction events");
        }
    }
}
