mod auction;
mod bid_book;
mod clock;
mod commitment;
mod engine;
mod error;
mod event;
mod event_log;
mod house;
mod progress;
mod service;
mod simulation;
mod treasury;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "blind-auction")]
#[command(about = "Sealed-bid commit-reveal auction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an auction behind the HTTP gateway
    Serve {
        #[arg(long, env = "BLIND_AUCTION_LISTEN", default_value = "127.0.0.1:3000")]
        listen: SocketAddr,

        /// Length of the bidding phase, in milliseconds
        #[arg(long, env = "BLIND_AUCTION_BIDDING_TIME", default_value_t = simulation::BIDDING_TIME)]
        bidding_time: u64,

        /// Length of the reveal phase, in milliseconds
        #[arg(long, env = "BLIND_AUCTION_REVEAL_TIME", default_value_t = simulation::REVEAL_TIME)]
        reveal_time: u64,

        /// Identity receiving the winning bid
        #[arg(long, env = "BLIND_AUCTION_BENEFICIARY")]
        beneficiary: String,
    },

    /// Print the commitment sealing a bid
    Seal {
        #[arg(long)]
        value: auction::Amount,

        /// Seal a decoy bid
        #[arg(long)]
        fake: bool,

        /// Hex-encoded 32-byte salt; random if omitted
        #[arg(long)]
        salt: Option<commitment::Salt>,
    },

    /// Run a whole auction with random bids and check its winner
    Simulate {
        #[arg(long, env = "BLIND_AUCTION_SIM_BIDS", default_value_t = 10)]
        bids: usize,

        #[arg(long, env = "BLIND_AUCTION_SIM_BIDDERS", default_value_t = 2)]
        bidders: usize,

        #[arg(long, env = "BLIND_AUCTION_SIM_SEED")]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("blind_auction=info")),
        )
        .init();

    match Cli::parse().command {
        Commands::Serve {
            listen,
            bidding_time,
            reveal_time,
            beneficiary,
        } => serve(
            listen,
            engine::AuctionConfig {
                bidding_time,
                reveal_time,
                beneficiary,
            },
        ),
        Commands::Seal { value, fake, salt } => {
            let salt = salt.unwrap_or_else(commitment::Salt::random);
            let revealed = auction::RevealedBid::new(value, fake, salt);
            println!("salt:       {salt}");
            println!("commitment: {}", revealed.seal());
            Ok(())
        }
        Commands::Simulate {
            bids,
            bidders,
            seed,
        } => {
            let report = simulation::run(&simulation::SimulationConfig {
                bids,
                bidders,
                seed,
            })?;
            println!("expected winner: {:?}", report.expected);
            println!("actual winner:   {:?}", report.actual);
            if !report.is_consistent() {
                bail!("auction outcome differs from the expected one");
            }
            Ok(())
        }
    }
}

fn serve(listen: SocketAddr, config: engine::AuctionConfig) -> Result<()> {
    let (event_writer, event_reader) = event_log::new_in_memory_shared();
    let progress_store = progress::InMemoryProgressTracker::new_shared();
    let treasury = treasury::InMemoryTreasury::new_shared();
    let house = house::AuctionHouse::new_shared(
        config,
        clock::SystemClock::new_shared(),
        treasury,
        event_writer,
    )?;

    let svc_ctr = service::ServiceControl::new(progress_store);

    ctrlc::set_handler({
        let svc_ctr = svc_ctr.clone();
        move || {
            warn!("stopping all services...");
            svc_ctr.stop_all();
        }
    })?;

    let audit_trail = service::AuditTrail::new();
    let gateway_state = service::GatewayState {
        house,
        audit: audit_trail.totals(),
    };

    info!(%listen, "starting auction services");
    for handle in vec![
        svc_ctr.spawn_log_follower(audit_trail, event_reader),
        svc_ctr.spawn_loop(service::Gateway::new(listen, gateway_state)?),
    ] {
        handle.join()?
    }

    Ok(())
}
