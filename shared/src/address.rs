//! Deterministic storage keys for poll, candidate and receipt records.
//!
//! A key is the SHA-256 digest of a seed preimage:
//!
//! ```text
//! poll      = "poll"      ‖ LE64(poll_id)
//! candidate = "candidate" ‖ LE64(poll_id) ‖ UTF8(candidate_name)
//! receipt   = "receipt"   ‖ LE64(poll_id) ‖ voter (32 bytes)
//! ```
//!
//! No tag is a prefix of another, so two records of different kinds never share a preimage.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::identity::CallerIdentity;

pub const POLL_TAG: &[u8] = b"poll";
pub const CANDIDATE_TAG: &[u8] = b"candidate";
pub const RECEIPT_TAG: &[u8] = b"receipt";

/// Longest variable seed (candidate name) accepted by derivation.
pub const MAX_SEED_LENGTH: usize = 32;

pub const KEY_LENGTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Seed exceeds maximum length of {MAX_SEED_LENGTH} bytes (got {0})")]
    SeedTooLong(usize),
    #[error("Invalid key encoding: {0}")]
    InvalidEncoding(String),
}

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key([u8; KEY_LENGTH]);

impl Key {
    pub const fn new(bytes: [u8; KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    fn from_seeds(seeds: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        Self(hasher.finalize().into())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({})", self)
    }
}

impl FromStr for Key {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = URL_SAFE_NO_PAD
            .decode(s)
            .map_err(|e| AddressError::InvalidEncoding(e.to_string()))?;
        let bytes: [u8; KEY_LENGTH] = bytes
            .try_into()
            .map_err(|b: Vec<u8>| AddressError::InvalidEncoding(format!("expected {KEY_LENGTH} bytes, got {}", b.len())))?;
        Ok(Self(bytes))
    }
}

impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Preimage of a poll key.
pub fn poll_seed(poll_id: u64) -> Vec<u8> {
    [POLL_TAG, &poll_id.to_le_bytes()[..]].concat()
}

/// Preimage of a candidate key. The name is appended raw, not length-prefixed.
pub fn candidate_seed(poll_id: u64, candidate_name: &str) -> Result<Vec<u8>, AddressError> {
    let name = candidate_name.as_bytes();
    if name.len() > MAX_SEED_LENGTH {
        return Err(AddressError::SeedTooLong(name.len()));
    }
    Ok([CANDIDATE_TAG, &poll_id.to_le_bytes()[..], name].concat())
}

pub fn derive_poll_key(poll_id: u64) -> Key {
    Key::from_seeds(&[POLL_TAG, &poll_id.to_le_bytes()])
}

pub fn derive_candidate_key(poll_id: u64, candidate_name: &str) -> Result<Key, AddressError> {
    let seed = candidate_seed(poll_id, candidate_name)?;
    Ok(Key::from_seeds(&[&seed]))
}

pub fn derive_receipt_key(poll_id: u64, voter: &CallerIdentity) -> Key {
    Key::from_seeds(&[RECEIPT_TAG, &poll_id.to_le_bytes(), voter.as_bytes()])
}
