use crate::{
    auction::RevealOutcome,
    event::Event,
    event_log::LogEvent,
    service::{AuditTotals, AuditTrail, LogFollowerService, AUDIT_SERVICE_ID},
};
use anyhow::Result;

fn feed(trail: &mut AuditTrail, events: Vec<Event>) -> Result<()> {
    for (offset, details) in (0..).zip(events) {
        trail.handle_event(LogEvent { offset, details })?;
    }
    Ok(())
}

#[test]
fn totals_follow_the_money() -> Result<()> {
    let mut trail = AuditTrail::new();
    let totals = trail.totals();
    assert_eq!(trail.get_log_progress_id(), AUDIT_SERVICE_ID);

    feed(
        &mut trail,
        vec![
            Event::BidPlaced {
                bidder: "alice".to_owned(),
                deposit: 600,
            },
            Event::BidPlaced {
                bidder: "bob".to_owned(),
                deposit: 700,
            },
            Event::BidPlaced {
                bidder: "carol".to_owned(),
                deposit: 50,
            },
            Event::BidRevealed {
                bidder: "alice".to_owned(),
                refund: 100,
                outcome: RevealOutcome::Leading,
            },
            Event::BidIncrease {
                bidder: "alice".to_owned(),
                amount: 500,
            },
            Event::BidRevealed {
                bidder: "bob".to_owned(),
                refund: 0,
                outcome: RevealOutcome::Leading,
            },
            Event::BidIncrease {
                bidder: "bob".to_owned(),
                amount: 700,
            },
            Event::BidRevealed {
                bidder: "carol".to_owned(),
                refund: 0,
                outcome: RevealOutcome::Forged,
            },
            Event::AuctionEnded {
                winner: "bob".to_owned(),
                amount: 700,
            },
        ],
    )?;

    assert_eq!(
        *totals.lock(),
        AuditTotals {
            bids_placed: 3,
            bids_revealed: 3,
            deposited: 1350,
            // alice's excess, then her whole stake once outbid
            refunded: 600,
            forfeited: 50,
            settled: 700,
        }
    );
    Ok(())
}
