//! Auction House
//!
//! Stands in for the ledger the auction lives on: it collects deposits
//! before a bid is accepted, serializes every call against the engine,
//! and answers queries about the auction and its participants.
use crate::{
    auction::{Amount, BidderIdRef, Leader, Phase, RevealedBid, Settlement},
    clock::{SharedClock, Timestamp},
    commitment::Commitment,
    engine::{AuctionConfig, AuctionEngine},
    error::AuctionError,
    event_log,
    treasury::{Account, InMemoryTreasury, Treasury},
};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuctionStatus {
    pub phase: Phase,
    pub now: Timestamp,
    pub beneficiary: String,
    pub bidding_end: Timestamp,
    pub reveal_end: Timestamp,
    pub leader: Option<Leader>,
    pub pending_bids: usize,
    pub custody: Amount,
}

pub struct AuctionHouse {
    engine: Mutex<AuctionEngine>,
    treasury: Arc<InMemoryTreasury>,
    clock: SharedClock,
}

pub type SharedAuctionHouse = Arc<AuctionHouse>;

impl AuctionHouse {
    pub fn new(
        config: AuctionConfig,
        clock: SharedClock,
        treasury: Arc<InMemoryTreasury>,
        event_writer: event_log::SharedWriter,
    ) -> Result<Self, AuctionError> {
        let engine = AuctionEngine::new(config, clock.clone(), treasury.clone(), event_writer)?;
        Ok(Self {
            engine: Mutex::new(engine),
            treasury,
            clock,
        })
    }

    pub fn new_shared(
        config: AuctionConfig,
        clock: SharedClock,
        treasury: Arc<InMemoryTreasury>,
        event_writer: event_log::SharedWriter,
    ) -> Result<SharedAuctionHouse, AuctionError> {
        Ok(Arc::new(Self::new(config, clock, treasury, event_writer)?))
    }

    /// Escrow the deposit, then record the bid
    ///
    /// If the auction refuses the bid, the deposit goes straight back.
    pub fn place_bid(
        &self,
        bidder: BidderIdRef,
        deposit: Amount,
        commitment: Commitment,
    ) -> Result<(), AuctionError> {
        let mut engine = self.engine.lock();

        self.treasury
            .escrow(bidder, deposit)
            .map_err(AuctionError::Transfer)?;

        engine
            .place_bid(bidder, deposit, commitment)
            .map_err(|e| {
                if let Err(revert) = self.treasury.release(bidder, deposit) {
                    warn!(?bidder, error = %revert, "failed to return a rejected deposit");
                }
                e
            })
    }

    pub fn reveal(
        &self,
        bidder: BidderIdRef,
        revealed: Option<RevealedBid>,
    ) -> Result<Amount, AuctionError> {
        self.engine.lock().reveal(bidder, revealed)
    }

    pub fn finalize(&self, caller: BidderIdRef) -> Result<Option<Settlement>, AuctionError> {
        self.engine.lock().finalize(caller)
    }

    pub fn status(&self) -> AuctionStatus {
        let engine = self.engine.lock();
        AuctionStatus {
            phase: engine.phase(),
            now: self.clock.now(),
            beneficiary: engine.beneficiary().to_owned(),
            bidding_end: engine.bidding_end(),
            reveal_end: engine.reveal_end(),
            leader: engine.leader().cloned(),
            pending_bids: engine.total_pending_bids(),
            custody: self.treasury.custody(),
        }
    }

    pub fn account(&self, id: BidderIdRef) -> Account {
        self.treasury.account(id)
    }

    pub fn pending_bids(&self, bidder: BidderIdRef) -> usize {
        self.engine.lock().pending_bids(bidder)
    }
}
