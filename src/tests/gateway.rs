use super::salt;
use crate::{
    auction::{Phase, RevealedBid},
    clock::ManualClock,
    engine::AuctionConfig,
    error::{AuctionError, PhaseViolation},
    event_log,
    house::AuctionHouse,
    service::{
        gateway::{self, FinalizeRequest, PlaceBidRequest, RevealRequest},
        ApiError, AuditTrail, GatewayState,
    },
    treasury::{Account, InMemoryTreasury},
};
use anyhow::{format_err, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use futures::executor::block_on;
use std::sync::Arc;

fn gateway_state(clock: Arc<ManualClock>) -> Result<GatewayState> {
    let (event_writer, _) = event_log::new_in_memory_shared();
    let house = AuctionHouse::new_shared(
        AuctionConfig {
            bidding_time: 1000,
            reveal_time: 1000,
            beneficiary: "beneficiary".to_owned(),
        },
        clock,
        InMemoryTreasury::new_shared(),
        event_writer,
    )?;
    Ok(GatewayState {
        house,
        audit: AuditTrail::new().totals(),
    })
}

fn status_of(err: ApiError) -> StatusCode {
    err.into_response().status()
}

#[test]
fn full_auction_over_the_handlers() -> Result<()> {
    let clock = ManualClock::new_shared(0);
    let state = gateway_state(clock.clone())?;
    let revealed = RevealedBid::new(300, false, salt(1));

    let created = block_on(gateway::place_bid(
        State(state.clone()),
        Json(PlaceBidRequest {
            bidder: "alice".to_owned(),
            deposit: 400,
            commitment: revealed.seal(),
        }),
    ))
    .map_err(|e| format_err!("{:?}", e))?;
    assert_eq!(created, StatusCode::CREATED);

    let Json(status) = block_on(gateway::status(State(state.clone())));
    assert_eq!(status.phase, Phase::Bidding);
    assert_eq!(status.pending_bids, 1);
    assert_eq!(status.custody, 400);

    let Json(account) = block_on(gateway::account(
        State(state.clone()),
        Path("alice".to_owned()),
    ));
    assert_eq!(account.pending_bids, 1);
    assert_eq!(account.account.deposited, 400);

    clock.set(1500);
    let Json(revealed) = block_on(gateway::reveal(
        State(state.clone()),
        Json(RevealRequest {
            bidder: "alice".to_owned(),
            revealed: Some(revealed),
        }),
    ))
    .map_err(|e| format_err!("{:?}", e))?;
    assert_eq!(revealed.refund, 100);

    clock.set(2500);
    let Json(settled) = block_on(gateway::finalize(
        State(state.clone()),
        Json(FinalizeRequest {
            caller: "bob".to_owned(),
        }),
    ))
    .map_err(|e| format_err!("{:?}", e))?;
    assert_eq!(settled.winner.as_deref(), Some("alice"));
    assert_eq!(settled.amount, Some(300));

    let Json(account) = block_on(gateway::account(
        State(state.clone()),
        Path("beneficiary".to_owned()),
    ));
    assert_eq!(account.account.received, 300);
    assert_eq!(account.pending_bids, 0);

    let Json(status) = block_on(gateway::status(State(state)));
    assert_eq!(status.phase, Phase::Settled);
    assert_eq!(status.leader, None);
    assert_eq!(status.custody, 0);
    Ok(())
}

#[test]
fn rejected_bid_leaves_no_deposit_on_record() -> Result<()> {
    let clock = ManualClock::new_shared(0);
    let state = gateway_state(clock.clone())?;

    clock.set(1000);
    let err = block_on(gateway::place_bid(
        State(state.clone()),
        Json(PlaceBidRequest {
            bidder: "alice".to_owned(),
            deposit: 400,
            commitment: RevealedBid::new(1, false, salt(1)).seal(),
        }),
    ))
    .err()
    .ok_or_else(|| format_err!("late bid was accepted"))?;
    assert_eq!(status_of(err), StatusCode::CONFLICT);

    let Json(account) = block_on(gateway::account(
        State(state.clone()),
        Path("alice".to_owned()),
    ));
    assert_eq!(account.account, Account::default());
    assert_eq!(account.pending_bids, 0);
    assert_eq!(state.house.status().custody, 0);
    Ok(())
}

#[test]
fn errors_map_to_status_codes() {
    assert_eq!(
        status_of(AuctionError::InvalidParameter("x").into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AuctionError::NoBidsToReveal.into()),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_of(AuctionError::PhaseViolation(PhaseViolation::TooEarly).into()),
        StatusCode::CONFLICT
    );
    assert_eq!(
        status_of(AuctionError::Transfer(format_err!("broke")).into()),
        StatusCode::BAD_GATEWAY
    );
}

#[test]
fn reveal_requests_accept_a_missing_disclosure() -> Result<()> {
    let req: RevealRequest = serde_json::from_str(r#"{ "bidder": "alice" }"#)?;
    assert_eq!(req.revealed, None);

    let clock = ManualClock::new_shared(0);
    let state = gateway_state(clock.clone())?;
    state
        .house
        .place_bid("alice", 1, RevealedBid::new(1, false, salt(1)).seal())?;
    clock.set(1500);

    let err = block_on(gateway::reveal(State(state), Json(req)))
        .err()
        .ok_or_else(|| format_err!("empty reveal was accepted"))?;
    assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    Ok(())
}

#[test]
fn place_bid_request_wire_format() -> Result<()> {
    let commitment = RevealedBid::new(5, true, salt(3)).seal();
    let req: PlaceBidRequest = serde_json::from_value(serde_json::json!({
        "bidder": "alice",
        "deposit": 10,
        "commitment": commitment.to_string(),
    }))?;
    assert_eq!(req.commitment, commitment);
    assert_eq!(req.deposit, 10);
    Ok(())
}
