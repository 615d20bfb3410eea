use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::{Error, ErrorCode};

pub const IDENTITY_LENGTH: usize = 32;

/// The authorized signer of a transition, as delivered by the host.
///
/// The core never verifies signatures; it trusts that whoever constructed the
/// [`crate::processor::InvocationContext`] already did.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallerIdentity([u8; IDENTITY_LENGTH]);

impl CallerIdentity {
    pub const fn from_bytes(bytes: [u8; IDENTITY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Stable identity derived from a human-readable label. Handy for
    /// configuration and fixtures, never for real signers.
    pub fn from_label(label: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(label.as_bytes());
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; IDENTITY_LENGTH] {
        &self.0
    }
}

impl fmt::Display for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(self.0))
    }
}

impl fmt::Debug for CallerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CallerIdentity({})", self)
    }
}

impl FromStr for CallerIdentity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = URL_SAFE_NO_PAD.decode(s.trim()).map_err(|e| {
            Error::with_details(ErrorCode::InvalidInput, "Invalid caller identity", e.to_string())
        })?;
        let bytes: [u8; IDENTITY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            Error::with_details(
                ErrorCode::InvalidInput,
                "Invalid caller identity",
                format!("expected {IDENTITY_LENGTH} bytes, got {}", b.len()),
            )
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for CallerIdentity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CallerIdentity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
