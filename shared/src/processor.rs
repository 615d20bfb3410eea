use serde::{Serialize, Deserialize};
use tracing::{debug, error, info, instrument, warn};

use crate::accounts::Accounts;
use crate::address::{derive_candidate_key, derive_poll_key, derive_receipt_key, Key};
use crate::clock::Clock;
use crate::error::{Error, ErrorCode, Result};
use crate::identity::CallerIdentity;
use crate::instruction::Instruction;
use crate::ledger::Ledger;
use crate::models::{CandidateRecord, PollRecord, VoteReceipt};
use crate::validation::{validate_candidate_name, validate_poll};

/// Who may open polls and register candidates. Voting is never restricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorityPolicy {
    #[default]
    Anyone,
    Only(Vec<CallerIdentity>),
}

impl AuthorityPolicy {
    pub fn permits(&self, caller: &CallerIdentity) -> bool {
        match self {
            AuthorityPolicy::Anyone => true,
            AuthorityPolicy::Only(allowed) => allowed.contains(caller),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramConfig {
    pub authority: AuthorityPolicy,
    pub one_vote_per_voter: bool,
}

/// What the host knows about the invocation: the verified signer and the
/// ledger time the transition executes at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationContext {
    pub signer: CallerIdentity,
    pub unix_timestamp: i64,
}

impl InvocationContext {
    pub fn new(signer: CallerIdentity, unix_timestamp: i64) -> Self {
        Self { signer, unix_timestamp }
    }

    pub fn now(signer: CallerIdentity, clock: &impl Clock) -> Self {
        Self::new(signer, clock.unix_timestamp())
    }
}

#[derive(Debug, Clone, Default)]
pub struct PollProcessor {
    config: ProgramConfig,
}

impl PollProcessor {
    pub fn new(config: ProgramConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgramConfig {
        &self.config
    }

    /// Runs `instruction` through `ledger` as one all-or-nothing transition.
    pub fn execute<L: Ledger + ?Sized>(&self, ledger: &L, ctx: &InvocationContext, instruction: &Instruction) -> Result<()> {
        let metas = instruction.accounts(&ctx.signer, &self.config)?;
        ledger.apply(&metas, &mut |accounts: &mut Accounts| self.process(accounts, ctx, instruction))
    }

    pub fn open_poll<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        ctx: &InvocationContext,
        poll_id: u64,
        description: impl Into<String>,
        poll_start: i64,
        poll_end: i64,
    ) -> Result<()> {
        let instruction = Instruction::OpenPoll {
            poll_id,
            description: description.into(),
            poll_start,
            poll_end,
        };
        self.execute(ledger, ctx, &instruction)
    }

    pub fn register_candidate<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        ctx: &InvocationContext,
        poll_id: u64,
        candidate_name: impl Into<String>,
    ) -> Result<()> {
        let instruction = Instruction::RegisterCandidate {
            poll_id,
            candidate_name: candidate_name.into(),
        };
        self.execute(ledger, ctx, &instruction)
    }

    pub fn cast_vote<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        ctx: &InvocationContext,
        poll_id: u64,
        candidate_name: impl Into<String>,
    ) -> Result<()> {
        let instruction = Instruction::CastVote {
            poll_id,
            candidate_name: candidate_name.into(),
        };
        self.execute(ledger, ctx, &instruction)
    }

    #[instrument(skip_all, fields(method = instruction.name(), poll_id = instruction.poll_id(), signer = %ctx.signer))]
    pub fn process(&self, accounts: &mut Accounts, ctx: &InvocationContext, instruction: &Instruction) -> Result<()> {
        let result = match instruction {
            Instruction::OpenPoll { poll_id, description, poll_start, poll_end } => {
                self.process_open_poll(accounts, ctx, *poll_id, description, *poll_start, *poll_end)
            }
            Instruction::RegisterCandidate { poll_id, candidate_name } => {
                self.process_register_candidate(accounts, ctx, *poll_id, candidate_name)
            }
            Instruction::CastVote { poll_id, candidate_name } => {
                self.process_cast_vote(accounts, ctx, *poll_id, candidate_name)
            }
        };

        match &result {
            Ok(()) => info!("Transition applied"),
            Err(e) if e.code == ErrorCode::SystemError => error!("Transition failed: {}", e),
            Err(e) => warn!("Transition rejected: {}", e),
        }
        result
    }

    fn authorize(&self, ctx: &InvocationContext) -> Result<()> {
        if self.config.authority.permits(&ctx.signer) {
            Ok(())
        } else {
            Err(Error::with_details(
                ErrorCode::Unauthorized,
                "Signer may not manage polls",
                ctx.signer.to_string(),
            ))
        }
    }

    fn load_poll(accounts: &Accounts, poll_id: u64, poll_key: &Key) -> Result<PollRecord> {
        accounts.get::<PollRecord>(poll_key)?.ok_or_else(|| {
            Error::with_details(ErrorCode::NotFound, format!("Poll {poll_id} not found"), poll_key.to_string())
        })
    }

    fn process_open_poll(
        &self,
        accounts: &mut Accounts,
        ctx: &InvocationContext,
        poll_id: u64,
        description: &str,
        poll_start: i64,
        poll_end: i64,
    ) -> Result<()> {
        self.authorize(ctx)?;
        validate_poll(description, poll_start, poll_end)?;

        let poll_key = derive_poll_key(poll_id);
        if accounts.exists(&poll_key)? {
            return Err(Error::with_details(
                ErrorCode::AlreadyExists,
                format!("Poll {poll_id} already exists"),
                poll_key.to_string(),
            ));
        }

        debug!(%poll_key, poll_start, poll_end, "Creating poll");
        accounts.create(&poll_key, &PollRecord {
            poll_id,
            description: description.to_owned(),
            poll_start,
            poll_end,
        })
    }

    fn process_register_candidate(
        &self,
        accounts: &mut Accounts,
        ctx: &InvocationContext,
        poll_id: u64,
        candidate_name: &str,
    ) -> Result<()> {
        self.authorize(ctx)?;
        validate_candidate_name(candidate_name)?;

        let poll_key = derive_poll_key(poll_id);
        let candidate_key = derive_candidate_key(poll_id, candidate_name)?;
        Self::load_poll(accounts, poll_id, &poll_key)?;

        if accounts.exists(&candidate_key)? {
            return Err(Error::with_details(
                ErrorCode::AlreadyExists,
                format!("Candidate {candidate_name} already exists in poll {poll_id}"),
                candidate_key.to_string(),
            ));
        }

        debug!(%candidate_key, candidate_name, "Registering candidate");
        accounts.create(&candidate_key, &CandidateRecord::new(poll_id, candidate_name))
    }

    fn process_cast_vote(
        &self,
        accounts: &mut Accounts,
        ctx: &InvocationContext,
        poll_id: u64,
        candidate_name: &str,
    ) -> Result<()> {
        validate_candidate_name(candidate_name)?;

        let poll_key = derive_poll_key(poll_id);
        let candidate_key = derive_candidate_key(poll_id, candidate_name)?;
        let poll = Self::load_poll(accounts, poll_id, &poll_key)?;

        if !poll.is_open_at(ctx.unix_timestamp) {
            return Err(Error::with_details(
                ErrorCode::NotOpen,
                format!("Poll {poll_id} is not open"),
                format!("now {} outside [{}, {})", ctx.unix_timestamp, poll.poll_start, poll.poll_end),
            ));
        }

        if !accounts.exists(&candidate_key)? {
            return Err(Error::with_details(
                ErrorCode::NotFound,
                format!("Candidate {candidate_name} not found in poll {poll_id}"),
                candidate_key.to_string(),
            ));
        }

        if self.config.one_vote_per_voter {
            let receipt_key = derive_receipt_key(poll_id, &ctx.signer);
            let receipt = VoteReceipt {
                poll_id,
                voter: ctx.signer,
                candidate_name: candidate_name.to_owned(),
            };
            accounts.create(&receipt_key, &receipt).map_err(|e| match e.code {
                ErrorCode::AlreadyExists => Error::with_details(
                    ErrorCode::AlreadyExists,
                    format!("Signer already voted in poll {poll_id}"),
                    receipt_key.to_string(),
                ),
                _ => e,
            })?;
        }

        let candidate = accounts.update(&candidate_key, |candidate: &mut CandidateRecord| {
            candidate.candidate_votes = candidate
                .candidate_votes
                .checked_add(1)
                .ok_or_else(|| Error::system("Vote counter overflow"))?;
            Ok(())
        })?;

        debug!(%candidate_key, votes = candidate.candidate_votes, "Vote counted");
        Ok(())
    }
}
