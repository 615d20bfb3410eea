//! Builds unsigned vote transactions for a wallet to sign.
//!
//! Assembly only reads the store. Existence is pre-checked so a client gets a
//! useful error before it pays to submit a transaction that cannot succeed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use poll_core::{
    derive_candidate_key, derive_poll_key, validate_candidate_name, AccountMeta, CallerIdentity, Instruction,
    ProgramConfig,
};
use serde::{Serialize, Deserialize};
use tracing::{debug, instrument};

use crate::actions::ActionPostResponse;
use crate::config::ActionsConfig;
use crate::error::ApiError;
use crate::store::{fetch_candidate, fetch_poll, AccountReader};
use crate::utils::parse_account;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComputeBudget {
    pub unit_limit: u32,
    pub unit_price: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstructionEnvelope {
    pub accounts: Vec<AccountMeta>,
    pub data: Instruction,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    pub fee_payer: CallerIdentity,
    pub compute_budget: ComputeBudget,
    pub instructions: Vec<InstructionEnvelope>,
}

impl UnsignedTransaction {
    pub fn new(fee_payer: CallerIdentity, compute_budget: ComputeBudget) -> Self {
        Self {
            fee_payer,
            compute_budget,
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, signer: &CallerIdentity, program: &ProgramConfig, instruction: Instruction) -> Result<(), ApiError> {
        let accounts = instruction.accounts(signer, program)?;
        self.instructions.push(InstructionEnvelope { accounts, data: instruction });
        Ok(())
    }

    pub fn encode(&self) -> Result<String, ApiError> {
        let bytes = serde_json::to_vec(self).map_err(|e| ApiError::Build(e.to_string()))?;
        Ok(STANDARD.encode(bytes))
    }

    pub fn decode(encoded: &str) -> Result<Self, ApiError> {
        let bytes = STANDARD.decode(encoded).map_err(|e| ApiError::Build(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Build(e.to_string()))
    }
}

#[instrument(skip(config, reader, account))]
pub async fn build_vote_transaction(
    config: &ActionsConfig,
    reader: &dyn AccountReader,
    candidate: Option<&str>,
    account: &str,
) -> Result<ActionPostResponse, ApiError> {
    let candidate = candidate.ok_or(ApiError::MissingCandidate)?;
    if !config.is_candidate(candidate) {
        return Err(ApiError::InvalidCandidate);
    }
    validate_candidate_name(candidate).map_err(|_| ApiError::CandidateNameTooLong)?;
    let voter = parse_account(account)?;

    let poll_id = config.poll_id;
    if fetch_poll(reader, poll_id).await?.is_none() {
        return Err(ApiError::PollNotFound { poll_key: derive_poll_key(poll_id) });
    }
    if fetch_candidate(reader, poll_id, candidate).await?.is_none() {
        return Err(ApiError::CandidateNotFound {
            candidate_key: derive_candidate_key(poll_id, candidate).map_err(poll_core::Error::from)?,
            candidate: candidate.to_string(),
        });
    }

    let mut transaction = UnsignedTransaction::new(voter, ComputeBudget {
        unit_limit: config.compute_unit_limit,
        unit_price: config.compute_unit_price,
    });
    transaction.push(&voter, &config.program, Instruction::CastVote {
        poll_id,
        candidate_name: candidate.to_string(),
    })?;
    debug!(%voter, "Assembled vote transaction");

    Ok(ActionPostResponse {
        kind: "transaction".into(),
        transaction: transaction.encode()?,
        message: Some(format!("Vote for {candidate}")),
    })
}
