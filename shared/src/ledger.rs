use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use tracing::error;

use crate::accounts::{AccountMeta, Accounts};
use crate::address::{derive_candidate_key, derive_poll_key, Key};
use crate::error::{Error, Result};
use crate::models::{AccountData, CandidateRecord, PollRecord};
use crate::validation::validate_candidate_name;

/// A key-addressed store that applies transitions atomically.
///
/// `apply` must hold every declared key exclusively for the duration of
/// `transition` and persist the working set's writes only on `Ok`.
pub trait Ledger {
    fn read(&self, key: &Key) -> Result<Option<Vec<u8>>>;

    fn apply(&self, metas: &[AccountMeta], transition: &mut dyn FnMut(&mut Accounts) -> Result<()>) -> Result<()>;
}

pub fn get_poll<L: Ledger + ?Sized>(ledger: &L, poll_id: u64) -> Result<Option<PollRecord>> {
    ledger
        .read(&derive_poll_key(poll_id))?
        .as_deref()
        .map(PollRecord::decode)
        .transpose()
}

pub fn get_candidate<L: Ledger + ?Sized>(ledger: &L, poll_id: u64, candidate_name: &str) -> Result<Option<CandidateRecord>> {
    validate_candidate_name(candidate_name)?;
    ledger
        .read(&derive_candidate_key(poll_id, candidate_name)?)?
        .as_deref()
        .map(CandidateRecord::decode)
        .transpose()
}

fn lock_error(what: &str) -> Error {
    error!("Failed to acquire {} lock", what);
    Error::system(format!("Failed to acquire {what} lock"))
}

/// In-process ledger. Transitions touching disjoint keys run in parallel;
/// transitions sharing a key are serialized on that key's lock.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    records: RwLock<HashMap<Key, Vec<u8>>>,
    locks: Mutex<HashMap<Key, Arc<Mutex<()>>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Result<HashMap<Key, Vec<u8>>> {
        let records = self.records.read().map_err(|_| lock_error("ledger"))?;
        Ok(records.clone())
    }

    fn record_locks(&self, keys: &[Key]) -> Result<Vec<Arc<Mutex<()>>>> {
        let mut table = self.locks.lock().map_err(|_| lock_error("lock table"))?;
        Ok(keys.iter().map(|key| Arc::clone(table.entry(*key).or_default())).collect())
    }
}

impl Ledger for MemoryLedger {
    fn read(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        let records = self.records.read().map_err(|_| lock_error("ledger"))?;
        Ok(records.get(key).cloned())
    }

    fn apply(&self, metas: &[AccountMeta], transition: &mut dyn FnMut(&mut Accounts) -> Result<()>) -> Result<()> {
        // Sorted acquisition keeps overlapping transitions from deadlocking.
        let mut keys: Vec<Key> = metas.iter().map(|meta| meta.key).collect();
        keys.sort();
        keys.dedup();

        let locks = self.record_locks(&keys)?;
        let _guards = locks
            .iter()
            .map(|lock| lock.lock().map_err(|_| lock_error("record")))
            .collect::<Result<Vec<_>>>()?;

        let loaded = {
            let records = self.records.read().map_err(|_| lock_error("ledger"))?;
            keys.iter()
                .filter_map(|key| records.get(key).map(|data| (*key, data.clone())))
                .collect()
        };

        let mut accounts = Accounts::from_snapshot(metas, loaded);
        transition(&mut accounts)?;

        let writes = accounts.into_writes();
        if !writes.is_empty() {
            let mut records = self.records.write().map_err(|_| lock_error("ledger"))?;
            records.extend(writes);
        }
        Ok(())
    }
}
