use serde::{Serialize, Deserialize};

use crate::error::{Error, ErrorCode, Result};
use crate::identity::CallerIdentity;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PollRecord {
    pub poll_id: u64,
    pub description: String,
    pub poll_start: i64,
    pub poll_end: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub poll_id: u64,
    pub candidate_name: String,
    pub candidate_votes: u64,
}

/// Marks that `voter` already voted in `poll_id`. Only written when
/// [`crate::processor::ProgramConfig::one_vote_per_voter`] is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VoteReceipt {
    pub poll_id: u64,
    pub voter: CallerIdentity,
    pub candidate_name: String,
}

/// On-store representation of every record kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Account {
    Poll(PollRecord),
    Candidate(CandidateRecord),
    VoteReceipt(VoteReceipt),
}

impl Account {
    pub fn kind(&self) -> &'static str {
        match self {
            Account::Poll(_) => PollRecord::KIND,
            Account::Candidate(_) => CandidateRecord::KIND,
            Account::VoteReceipt(_) => VoteReceipt::KIND,
        }
    }
}

pub trait AccountData: Sized + Clone {
    const KIND: &'static str;

    fn into_account(self) -> Account;
    fn from_account(account: Account) -> Option<Self>;

    fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.clone().into_account())?)
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let account: Account = serde_json::from_slice(bytes)?;
        let found = account.kind();
        Self::from_account(account).ok_or_else(|| Error::with_details(
            ErrorCode::SystemError,
            "Record type mismatch",
            format!("expected {}, found {}", Self::KIND, found),
        ))
    }
}

impl AccountData for PollRecord {
    const KIND: &'static str = "poll";

    fn into_account(self) -> Account { Account::Poll(self) }

    fn from_account(account: Account) -> Option<Self> {
        match account {
            Account::Poll(poll) => Some(poll),
            _ => None,
        }
    }
}

impl AccountData for CandidateRecord {
    const KIND: &'static str = "candidate";

    fn into_account(self) -> Account { Account::Candidate(self) }

    fn from_account(account: Account) -> Option<Self> {
        match account {
            Account::Candidate(candidate) => Some(candidate),
            _ => None,
        }
    }
}

impl AccountData for VoteReceipt {
    const KIND: &'static str = "vote_receipt";

    fn into_account(self) -> Account { Account::VoteReceipt(self) }

    fn from_account(account: Account) -> Option<Self> {
        match account {
            Account::VoteReceipt(receipt) => Some(receipt),
            _ => None,
        }
    }
}

impl PollRecord {
    /// Open on `[poll_start, poll_end)`.
    pub fn is_open_at(&self, unix_timestamp: i64) -> bool {
        self.poll_start <= unix_timestamp && unix_timestamp < self.poll_end
    }
}

impl CandidateRecord {
    pub fn new(poll_id: u64, candidate_name: impl Into<String>) -> Self {
        Self {
            poll_id,
            candidate_name: candidate_name.into(),
            candidate_votes: 0,
        }
    }
}
