//! HTTP gateway
//!
//! The JSON front through which bidders and the beneficiary submit calls
//! to the auction house and get back either a result or a failure.
use super::*;
use crate::{
    auction::{Amount, BidderId, RevealedBid},
    commitment::Commitment,
    error::AuctionError,
    house::{AuctionStatus, SharedAuctionHouse},
    service::audit::{AuditTotals, SharedAuditTotals},
    treasury::Account,
};
use anyhow::Context;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::{runtime::Runtime, sync::oneshot};

#[derive(Clone)]
pub struct GatewayState {
    pub house: SharedAuctionHouse,
    pub audit: SharedAuditTotals,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceBidRequest {
    pub bidder: BidderId,
    pub deposit: Amount,
    pub commitment: Commitment,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealRequest {
    pub bidder: BidderId,
    #[serde(default)]
    pub revealed: Option<RevealedBid>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevealResponse {
    pub refund: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeRequest {
    pub caller: BidderId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizeResponse {
    pub winner: Option<BidderId>,
    pub amount: Option<Amount>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccountResponse {
    #[serde(flatten)]
    pub account: Account,
    /// Bids placed and not yet revealed
    pub pending_bids: usize,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// An `AuctionError` on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub AuctionError);

impl From<AuctionError> for ApiError {
    fn from(e: AuctionError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AuctionError::InvalidParameter(_) | AuctionError::NoBidsToReveal => {
                StatusCode::BAD_REQUEST
            }
            AuctionError::PhaseViolation(_) => StatusCode::CONFLICT,
            AuctionError::Transfer(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorBody {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

pub fn router(state: GatewayState) -> Router {
    Router::new()
        .route("/auction", get(status))
        .route("/audit", get(audit))
        .route("/accounts/:id", get(account))
        .route("/bids", post(place_bid))
        .route("/reveals", post(reveal))
        .route("/finalize", post(finalize))
        .with_state(state)
}

pub async fn status(State(state): State<GatewayState>) -> Json<AuctionStatus> {
    Json(state.house.status())
}

pub async fn audit(State(state): State<GatewayState>) -> Json<AuditTotals> {
    Json(*state.audit.lock())
}

pub async fn account(
    State(state): State<GatewayState>,
    Path(id): Path<String>,
) -> Json<AccountResponse> {
    Json(AccountResponse {
        account: state.house.account(&id),
        pending_bids: state.house.pending_bids(&id),
    })
}

pub async fn place_bid(
    State(state): State<GatewayState>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .house
        .place_bid(&req.bidder, req.deposit, req.commitment)?;
    Ok(StatusCode::CREATED)
}

pub async fn reveal(
    State(state): State<GatewayState>,
    Json(req): Json<RevealRequest>,
) -> Result<Json<RevealResponse>, ApiError> {
    let refund = state.house.reveal(&req.bidder, req.revealed)?;
    Ok(Json(RevealResponse { refund }))
}

pub async fn finalize(
    State(state): State<GatewayState>,
    Json(req): Json<FinalizeRequest>,
) -> Result<Json<FinalizeResponse>, ApiError> {
    let settlement = state.house.finalize(&req.caller)?;
    Ok(Json(FinalizeResponse {
        amount: settlement.as_ref().map(|s| s.amount),
        winner: settlement.map(|s| s.winner),
    }))
}

async fn run_http_server(listen: SocketAddr, state: GatewayState) -> Result<()> {
    let server = axum::Server::try_bind(&listen)
        .with_context(|| format!("failed to bind {listen}"))?
        .serve(router(state).into_make_service());

    info!(%listen, "gateway listening");
    server.await?;

    Ok(())
}

pub struct Gateway {
    // cancels all tasks on drop
    _runtime: Runtime,
    server_rx: oneshot::Receiver<Result<()>>,
}

impl Gateway {
    pub fn new(listen: SocketAddr, state: GatewayState) -> Result<Self> {
        let runtime = Runtime::new()?;

        let (tx, rx) = oneshot::channel();

        runtime.spawn(async move {
            let res = run_http_server(listen, state)
                .await
                .context("failed to run http server");
            // the receiver is gone only if the gateway was dropped
            let _ = tx.send(res);
        });

        Ok(Self {
            _runtime: runtime,
            server_rx: rx,
        })
    }
}

impl LoopService for Gateway {
    fn run_iteration(&mut self) -> Result<()> {
        // don't hog the cpu
        std::thread::sleep(Duration::from_millis(100));

        match self.server_rx.try_recv() {
            Ok(res) => res.and_then(|()| Err(format_err!("gateway stopped serving"))),
            Err(oneshot::error::TryRecvError::Empty) => Ok(()),
            Err(oneshot::error::TryRecvError::Closed) => {
                Err(format_err!("gateway server died without leaving a response"))
            }
        }
    }
}
