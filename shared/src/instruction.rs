use serde::{Serialize, Deserialize};

use crate::accounts::AccountMeta;
use crate::address::{derive_candidate_key, derive_poll_key, derive_receipt_key};
use crate::error::Result;
use crate::identity::CallerIdentity;
use crate::processor::ProgramConfig;
use crate::validation::validate_candidate_name;

/// The transitions a host can invoke, in the shape a client submits them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum Instruction {
    #[serde(rename_all = "camelCase")]
    OpenPoll {
        poll_id: u64,
        description: String,
        poll_start: i64,
        poll_end: i64,
    },
    #[serde(rename_all = "camelCase")]
    RegisterCandidate {
        poll_id: u64,
        candidate_name: String,
    },
    #[serde(rename_all = "camelCase")]
    CastVote {
        poll_id: u64,
        candidate_name: String,
    },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::OpenPoll { .. } => "open_poll",
            Instruction::RegisterCandidate { .. } => "register_candidate",
            Instruction::CastVote { .. } => "cast_vote",
        }
    }

    pub fn poll_id(&self) -> u64 {
        match self {
            Instruction::OpenPoll { poll_id, .. }
            | Instruction::RegisterCandidate { poll_id, .. }
            | Instruction::CastVote { poll_id, .. } => *poll_id,
        }
    }

    /// Every record the transition may read or write, declared up front so the
    /// host can lock them before the handler runs.
    pub fn accounts(&self, signer: &CallerIdentity, config: &ProgramConfig) -> Result<Vec<AccountMeta>> {
        match self {
            Instruction::OpenPoll { poll_id, .. } => {
                Ok(vec![AccountMeta::writable(derive_poll_key(*poll_id))])
            }
            Instruction::RegisterCandidate { poll_id, candidate_name } => {
                validate_candidate_name(candidate_name)?;
                Ok(vec![
                    AccountMeta::readonly(derive_poll_key(*poll_id)),
                    AccountMeta::writable(derive_candidate_key(*poll_id, candidate_name)?),
                ])
            }
            Instruction::CastVote { poll_id, candidate_name } => {
                validate_candidate_name(candidate_name)?;
                let mut metas = vec![
                    AccountMeta::readonly(derive_poll_key(*poll_id)),
                    AccountMeta::writable(derive_candidate_key(*poll_id, candidate_name)?),
                ];
                if config.one_vote_per_voter {
                    metas.push(AccountMeta::writable(derive_receipt_key(*poll_id, signer)));
                }
                Ok(metas)
            }
        }
    }
}
