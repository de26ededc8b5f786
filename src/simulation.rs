//! Simulated auction run
//!
//! Places random sealed bids from a few bidders, reveals them all once
//! bidding is over and settles the auction, keeping its own note of who
//! should win so the result can be checked against the engine's.
use crate::{
    auction::{Amount, BidderId, RevealedBid, Settlement},
    clock::ManualClock,
    commitment::Salt,
    engine::AuctionConfig,
    event_log,
    house::AuctionHouse,
    treasury::{InMemoryTreasury, Treasury},
};
use anyhow::{ensure, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::{debug, info};

pub const BIDDING_TIME: u64 = 130_000;
pub const REVEAL_TIME: u64 = 170_000;
pub const MAX_AMOUNT: Amount = 1000;

#[derive(Clone, Debug)]
pub struct SimulationConfig {
    pub bids: usize,
    pub bidders: usize,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimulationReport {
    pub expected: Option<Settlement>,
    pub actual: Option<Settlement>,
    /// Value left in custody after settlement
    pub custody: Amount,
}

impl SimulationReport {
    pub fn is_consistent(&self) -> bool {
        self.expected == self.actual && self.custody == 0
    }
}

struct BidToReveal {
    bidder: BidderId,
    revealed: RevealedBid,
}

pub fn run(config: &SimulationConfig) -> Result<SimulationReport> {
    ensure!(config.bidders > 0, "at least one bidder is needed");

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let clock = ManualClock::new_shared(0);
    let treasury = InMemoryTreasury::new_shared();
    let (event_writer, _event_reader) = event_log::new_in_memory_shared();
    let beneficiary = "beneficiary".to_owned();
    let house = AuctionHouse::new(
        AuctionConfig {
            bidding_time: BIDDING_TIME,
            reveal_time: REVEAL_TIME,
            beneficiary: beneficiary.clone(),
        },
        clock.clone(),
        treasury.clone(),
        event_writer,
    )?;

    let mut expected: Option<Settlement> = None;
    let mut to_reveal = Vec::with_capacity(config.bids);

    while to_reveal.len() < config.bids {
        let bidder = format!("bidder-{}", rng.gen_range(0..config.bidders));
        let deposit = rng.gen_range(0..MAX_AMOUNT);
        let value = rng.gen_range(0..MAX_AMOUNT);
        let fake = rng.gen_bool(0.5);
        let salt = Salt::random_from(&mut rng);

        if !fake && value <= deposit {
            match &expected {
                Some(best) if value == best.amount => {
                    // a tie would be won by whoever reveals first; keep the outcome predictable
                    continue;
                }
                Some(best) if value < best.amount => {}
                _ => {
                    expected = Some(Settlement {
                        winner: bidder.clone(),
                        amount: value,
                    })
                }
            }
        }

        let revealed = RevealedBid::new(value, fake, salt);
        debug!(%bidder, deposit, "placing bid {}", to_reveal.len() + 1);
        house.place_bid(&bidder, deposit, revealed.seal())?;
        to_reveal.push(BidToReveal { bidder, revealed });
    }

    clock.advance(BIDDING_TIME + 1);
    for (i, bid) in to_reveal.iter().enumerate() {
        debug!("revealing bid {} out of {}", i + 1, to_reveal.len());
        house.reveal(&bid.bidder, Some(bid.revealed))?;
    }

    clock.advance(REVEAL_TIME);
    let actual = house.finalize(&beneficiary)?;

    let report = SimulationReport {
        expected,
        actual,
        custody: treasury.custody(),
    };
    info!(
        expected = ?report.expected,
        actual = ?report.actual,
        "simulation finished"
    );
    Ok(report)
}
