pub mod accounts;
pub mod address;
pub mod clock;
pub mod error;
pub mod identity;
pub mod instruction;
pub mod ledger;
pub mod models;
pub mod processor;
pub mod validation;

pub use accounts::{AccountMeta, Accounts};
pub use address::{derive_candidate_key, derive_poll_key, derive_receipt_key, AddressError, Key};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{Error, ErrorCode, Result};
pub use identity::CallerIdentity;
pub use instruction::Instruction;
pub use ledger::{get_candidate, get_poll, Ledger, MemoryLedger};
pub use models::*;
pub use processor::{AuthorityPolicy, InvocationContext, PollProcessor, ProgramConfig};
pub use validation::*;

#[cfg(test)]
mod tests;
