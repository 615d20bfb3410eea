use std::str::FromStr;

use poll_core::{validate_candidate_name, AuthorityPolicy, CallerIdentity, ProgramConfig, ValidationError};
use shuttle_runtime::SecretStore;

const DEFAULT_POLL_ID: u64 = 1;
const DEFAULT_CANDIDATES: &str = "Kyrgyztan,Swizzterland,Japan";
const DEFAULT_TITLE: &str = "Vote which country that you really wanted to visit?";
const DEFAULT_DESCRIPTION: &str = "Vote for your favorite country";
const DEFAULT_ICON: &str = "https://dynamic-media-cdn.tripadvisor.com/media/photo-o/1a/60/6a/e9/caption.jpg?w=800&h=800&s=1";
const DEFAULT_POLL_DESCRIPTION: &str = "Which country that you really wanted to visit?";
const DEFAULT_POLL_START: i64 = 0;
const DEFAULT_POLL_END: i64 = 1_867_777_767;
const DEFAULT_COMPUTE_UNIT_LIMIT: u32 = 200_000;
const DEFAULT_COMPUTE_UNIT_PRICE: u64 = 10_000;
const DEFAULT_AUTHORITY_LABEL: &str = "poll-authority";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid candidate {0:?}: {1}")]
    InvalidCandidate(String, ValidationError),
    #[error("At least one candidate must be configured")]
    NoCandidates,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cluster {
    Mainnet,
    Devnet,
    Testnet,
    Localnet,
}

impl Cluster {
    /// Unknown names fall back to devnet.
    pub fn parse(name: &str) -> Self {
        let name = name.trim().to_lowercase();
        if name.starts_with("mainnet") {
            Cluster::Mainnet
        } else if name == "testnet" {
            Cluster::Testnet
        } else if name == "localnet" || name == "localhost" {
            Cluster::Localnet
        } else {
            Cluster::Devnet
        }
    }

    /// Value of the `X-Blockchain-Ids` header. Clients only know the three
    /// public clusters, so localnet advertises devnet.
    pub fn blockchain_id(&self) -> &'static str {
        match self {
            Cluster::Mainnet => "solana:5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
            Cluster::Testnet => "solana:4uhcVJyU9pJkvQyS88uRDiswHXSCkY3z",
            Cluster::Devnet | Cluster::Localnet => "solana:EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
        }
    }
}

/// The poll the service creates on startup when `BOOTSTRAP_POLL` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollSeed {
    pub description: String,
    pub poll_start: i64,
    pub poll_end: i64,
    pub authority: CallerIdentity,
}

#[derive(Debug, Clone)]
pub struct ActionsConfig {
    pub cluster: Cluster,
    pub poll_id: u64,
    pub candidates: Vec<String>,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub compute_unit_limit: u32,
    pub compute_unit_price: u64,
    pub program: ProgramConfig,
    pub bootstrap: Option<PollSeed>,
}

fn lookup_trimmed<F: Fn(&str) -> Option<String>>(lookup: &F, key: &str) -> Option<String> {
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<T: FromStr, F: Fn(&str) -> Option<String>>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError> {
    match lookup_trimmed(lookup, key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn parse_identity(key: &'static str, value: &str) -> Result<CallerIdentity, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue { key, value: value.to_string() })
}

impl ActionsConfig {
    pub fn from_secrets(secrets: &SecretStore) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| secrets.get(key))
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self, ConfigError> {
        let candidates: Vec<String> = lookup_trimmed(&lookup, "POLL_CANDIDATES")
            .unwrap_or_else(|| DEFAULT_CANDIDATES.to_string())
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        if candidates.is_empty() {
            return Err(ConfigError::NoCandidates);
        }
        for name in &candidates {
            validate_candidate_name(name).map_err(|e| ConfigError::InvalidCandidate(name.clone(), e))?;
        }

        let authorities = lookup_trimmed(&lookup, "POLL_AUTHORITIES")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .map(|value| parse_identity("POLL_AUTHORITIES", value))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?
            .unwrap_or_default();

        let program = ProgramConfig {
            authority: if authorities.is_empty() {
                AuthorityPolicy::Anyone
            } else {
                AuthorityPolicy::Only(authorities.clone())
            },
            one_vote_per_voter: parse_or(&lookup, "ONE_VOTE_PER_VOTER", false)?,
        };

        let bootstrap = if parse_or(&lookup, "BOOTSTRAP_POLL", false)? {
            let authority = match lookup_trimmed(&lookup, "BOOTSTRAP_AUTHORITY") {
                Some(value) => parse_identity("BOOTSTRAP_AUTHORITY", &value)?,
                None => authorities
                    .first()
                    .copied()
                    .unwrap_or_else(|| CallerIdentity::from_label(DEFAULT_AUTHORITY_LABEL)),
            };
            Some(PollSeed {
                description: lookup_trimmed(&lookup, "POLL_DESCRIPTION")
                    .unwrap_or_else(|| DEFAULT_POLL_DESCRIPTION.to_string()),
                poll_start: parse_or(&lookup, "POLL_START", DEFAULT_POLL_START)?,
                poll_end: parse_or(&lookup, "POLL_END", DEFAULT_POLL_END)?,
                authority,
            })
        } else {
            None
        };

        Ok(Self {
            cluster: lookup_trimmed(&lookup, "SOLANA_CLUSTER")
                .map(|name| Cluster::parse(&name))
                .unwrap_or(Cluster::Devnet),
            poll_id: parse_or(&lookup, "POLL_ID", DEFAULT_POLL_ID)?,
            candidates,
            title: lookup_trimmed(&lookup, "ACTION_TITLE").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            description: lookup_trimmed(&lookup, "ACTION_DESCRIPTION").unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string()),
            icon: lookup_trimmed(&lookup, "ACTION_ICON").unwrap_or_else(|| DEFAULT_ICON.to_string()),
            compute_unit_limit: parse_or(&lookup, "COMPUTE_UNIT_LIMIT", DEFAULT_COMPUTE_UNIT_LIMIT)?,
            compute_unit_price: parse_or(&lookup, "COMPUTE_UNIT_PRICE", DEFAULT_COMPUTE_UNIT_PRICE)?,
            program,
            bootstrap,
        })
    }

    pub fn is_candidate(&self, name: &str) -> bool {
        self.candidates.iter().any(|candidate| candidate == name)
    }
}
