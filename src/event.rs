use crate::auction::{Amount, BidderId, RevealOutcome};
use serde::Serialize;

/// Everything the auction tells the outside world about
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    BidPlaced {
        bidder: BidderId,
        deposit: Amount,
    },
    BidRevealed {
        bidder: BidderId,
        refund: Amount,
        outcome: RevealOutcome,
    },
    /// A new best bid; the previous leader, if any, was paid back
    BidIncrease {
        bidder: BidderId,
        amount: Amount,
    },
    AuctionEnded {
        winner: BidderId,
        amount: Amount,
    },
    #[cfg(test)]
    Test,
}
