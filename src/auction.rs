use crate::commitment::{Commitment, Salt};
use serde::{Deserialize, Serialize};

pub type BidderId = String;
pub type BidderIdRef<'s> = &'s str;
pub type Amount = u64;

/// A sealed bid, as placed during the bidding phase
///
/// The deposit is already in the auction's custody when the bid
/// is recorded. How much of it comes back is decided at reveal time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Bid {
    pub commitment: Commitment,
    pub deposit: Amount,
}

/// The disclosure of a previously sealed bid
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealedBid {
    pub value: Amount,
    pub fake: bool,
    pub salt: Salt,
}

impl RevealedBid {
    pub fn new(value: Amount, fake: bool, salt: Salt) -> Self {
        Self { value, fake, salt }
    }

    pub fn seal(&self) -> Commitment {
        Commitment::seal(self.value, self.fake, &self.salt)
    }
}

/// The best valid revealed bid so far
///
/// Bidder and amount live together so one can't be set without the other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    pub bidder: BidderId,
    pub amount: Amount,
}

impl Leader {
    /// Strictly greater is required: an equal value does not dethrone
    /// whoever revealed it first.
    pub fn is_outbidded_by(&self, value: Amount) -> bool {
        self.amount < value
    }
}

/// Result of a paying `finalize`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub winner: BidderId,
    pub amount: Amount,
}

/// Value leaving the auction's custody
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Payout {
    pub payee: BidderId,
    pub amount: Amount,
}

impl Payout {
    pub fn new(payee: BidderIdRef, amount: Amount) -> Self {
        Self {
            payee: payee.to_owned(),
            amount,
        }
    }
}

/// How a reveal was judged
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealOutcome {
    /// Valid and now the best bid; only the excess over the value is refunded
    Leading,
    /// Valid but not better than the current leader
    Outbid,
    /// Declared as a decoy
    Fake,
    /// Deposit did not cover the claimed value
    Underfunded,
    /// Disclosure did not hash to the sealed commitment; deposit forfeited
    Forged,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Bidding,
    Reveal,
    Settleable,
    Settled,
}
