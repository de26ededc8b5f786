//! Outstanding sealed bids, per bidder, in placement order
use crate::auction::{Bid, BidderId, BidderIdRef};
use std::collections::{BTreeMap, VecDeque};

#[derive(Default, Debug, Clone)]
pub struct BidBook(BTreeMap<BidderId, VecDeque<Bid>>);

impl BidBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bidder: BidderIdRef, bid: Bid) {
        self.0.entry(bidder.to_owned()).or_default().push_back(bid);
    }

    /// The bid the next reveal of `bidder` will consume
    pub fn oldest(&self, bidder: BidderIdRef) -> Option<&Bid> {
        self.0.get(bidder).and_then(|bids| bids.front())
    }

    /// Remove and return the oldest bid of `bidder`
    ///
    /// A consumed bid is gone for good, so its deposit can't be claimed twice.
    pub fn pop_oldest(&mut self, bidder: BidderIdRef) -> Option<Bid> {
        let bids = self.0.get_mut(bidder)?;
        let bid = bids.pop_front();
        if bids.is_empty() {
            self.0.remove(bidder);
        }
        bid
    }

    pub fn pending(&self, bidder: BidderIdRef) -> usize {
        self.0.get(bidder).map(VecDeque::len).unwrap_or(0)
    }

    pub fn total_pending(&self) -> usize {
        self.0.values().map(VecDeque::len).sum()
    }
}
