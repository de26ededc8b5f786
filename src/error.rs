use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum PhaseViolation {
    #[error("too early")]
    TooEarly,
    #[error("too late")]
    TooLate,
}

/// Why an auction call was rejected
///
/// A rejected call leaves the auction exactly as it was.
#[derive(Error, Debug)]
pub enum AuctionError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    #[error("phase violation: {0}")]
    PhaseViolation(#[from] PhaseViolation),
    #[error("no bids to reveal")]
    NoBidsToReveal,
    #[error("value transfer failed: {0:#}")]
    Transfer(anyhow::Error),
}
