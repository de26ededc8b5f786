//! Sealed-bid commitments
//!
//! A commitment is `sha256(value || fake_flag || salt)` where `value` is
//! encoded the way an arbitrary-precision integer serializes itself:
//! big-endian, minimal length, with a leading zero byte whenever the top
//! bit would otherwise read as a sign. The fake flag is a single byte,
//! `0` for a decoy and `1` for a real bid. Bidders and the auction must
//! agree on this encoding byte for byte, or no reveal will ever match.
use crate::auction::Amount;
use rand::RngCore;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const DIGEST_LEN: usize = 32;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DigestParseError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    #[error("expected 32 bytes, got {0}")]
    Length(usize),
}

fn parse_bytes32(s: &str) -> Result<[u8; DIGEST_LEN], DigestParseError> {
    let bytes = hex::decode(s.trim_start_matches("0x"))?;
    let len = bytes.len();
    bytes.try_into().map_err(|_| DigestParseError::Length(len))
}

/// Opaque 32-byte digest hiding a bid
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Commitment([u8; DIGEST_LEN]);

impl Commitment {
    /// Hash a bid the way both the bidder and the auction do
    pub fn seal(value: Amount, fake: bool, salt: &Salt) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(encode_value(value));
        hasher.update([if fake { 0u8 } else { 1u8 }]);
        hasher.update(salt.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn opens_to(&self, value: Amount, fake: bool, salt: &Salt) -> bool {
        *self == Self::seal(value, fake, salt)
    }
}

/// Secret randomness strengthening a commitment
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Salt([u8; DIGEST_LEN]);

impl Salt {
    #[cfg(test)]
    pub fn from_bytes(bytes: [u8; DIGEST_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn random() -> Self {
        Self::random_from(&mut rand::thread_rng())
    }

    pub fn random_from(rng: &mut impl RngCore) -> Self {
        let mut bytes = [0u8; DIGEST_LEN];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

/// Big-endian minimal encoding, sign-preserving
pub fn encode_value(value: Amount) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let first = bytes
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(bytes.len() - 1);

    let mut out = Vec::with_capacity(bytes.len() - first + 1);
    if bytes[first] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&bytes[first..]);
    out
}

macro_rules! impl_hex_bytes32 {
    ($t:ident) => {
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($t), self)
            }
        }

        impl FromStr for $t {
            type Err = DigestParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_bytes32(s).map(Self)
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $t {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

impl_hex_bytes32!(Commitment);
impl_hex_bytes32!(Salt);
