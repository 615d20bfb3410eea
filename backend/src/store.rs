use std::collections::HashMap;

use poll_core::{
    derive_candidate_key, derive_poll_key, validate_candidate_name, AccountData, Accounts, CandidateRecord, Error,
    ErrorCode, Instruction, InvocationContext, Key, Ledger, MemoryLedger, PollProcessor, PollRecord, Result,
};
use sqlx::PgPool;
use tracing::{error, instrument};

/// Read-only view of the hosting store.
#[rocket::async_trait]
pub trait AccountReader: Send + Sync {
    async fn read(&self, key: &Key) -> Result<Option<Vec<u8>>>;
}

/// A store that can also apply transitions.
#[rocket::async_trait]
pub trait TransitionHost: AccountReader {
    async fn execute(&self, ctx: &InvocationContext, instruction: &Instruction) -> Result<()>;
}

pub async fn fetch_poll(reader: &dyn AccountReader, poll_id: u64) -> Result<Option<PollRecord>> {
    reader
        .read(&derive_poll_key(poll_id))
        .await?
        .as_deref()
        .map(PollRecord::decode)
        .transpose()
}

pub async fn fetch_candidate(reader: &dyn AccountReader, poll_id: u64, candidate_name: &str) -> Result<Option<CandidateRecord>> {
    validate_candidate_name(candidate_name)?;
    reader
        .read(&derive_candidate_key(poll_id, candidate_name)?)
        .await?
        .as_deref()
        .map(CandidateRecord::decode)
        .transpose()
}

fn db_error(e: sqlx::Error) -> Error {
    error!("Database error: {}", e);
    Error::with_details(ErrorCode::SystemError, "Database error", e.to_string())
}

fn advisory_lock_id(key: &Key) -> i64 {
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&key.as_bytes()[..8]);
    i64::from_le_bytes(prefix)
}

/// Ledger persisted in `ledger.accounts`. Each transition runs in one
/// database transaction holding an advisory lock per declared key, so absent
/// keys are serialized as well as existing rows.
pub struct PgLedger {
    pool: PgPool,
    processor: PollProcessor,
}

impl PgLedger {
    pub fn new(pool: PgPool, processor: PollProcessor) -> Self {
        Self { pool, processor }
    }
}

#[rocket::async_trait]
impl AccountReader for PgLedger {
    async fn read(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        sqlx::query_scalar::<_, Vec<u8>>("SELECT data FROM ledger.accounts WHERE key = $1")
            .bind(key.as_bytes().to_vec())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)
    }
}

#[rocket::async_trait]
impl TransitionHost for PgLedger {
    #[instrument(skip_all, fields(method = instruction.name(), poll_id = instruction.poll_id()))]
    async fn execute(&self, ctx: &InvocationContext, instruction: &Instruction) -> Result<()> {
        let metas = instruction.accounts(&ctx.signer, self.processor.config())?;
        let mut keys: Vec<Key> = metas.iter().map(|meta| meta.key).collect();
        keys.sort();
        keys.dedup();

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        for key in &keys {
            sqlx::query("SELECT pg_advisory_xact_lock($1)")
                .bind(advisory_lock_id(key))
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
        }

        let mut loaded = HashMap::with_capacity(keys.len());
        for key in &keys {
            let data = sqlx::query_scalar::<_, Vec<u8>>("SELECT data FROM ledger.accounts WHERE key = $1")
                .bind(key.as_bytes().to_vec())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
            if let Some(data) = data {
                loaded.insert(*key, data);
            }
        }

        // Dropping `tx` on an early return rolls everything back.
        let mut accounts = Accounts::from_snapshot(&metas, loaded);
        self.processor.process(&mut accounts, ctx, instruction)?;

        for (key, data) in accounts.into_writes() {
            sqlx::query(
                "INSERT INTO ledger.accounts (key, data) VALUES ($1, $2)
                 ON CONFLICT (key) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()",
            )
            .bind(key.as_bytes().to_vec())
            .bind(data)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)
    }
}

/// In-process host over [`MemoryLedger`].
#[derive(Debug, Default)]
pub struct LocalLedger {
    ledger: MemoryLedger,
    processor: PollProcessor,
}

impl LocalLedger {
    pub fn new(processor: PollProcessor) -> Self {
        Self {
            ledger: MemoryLedger::new(),
            processor,
        }
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }
}

#[rocket::async_trait]
impl AccountReader for LocalLedger {
    async fn read(&self, key: &Key) -> Result<Option<Vec<u8>>> {
        self.ledger.read(key)
    }
}

#[rocket::async_trait]
impl TransitionHost for LocalLedger {
    async fn execute(&self, ctx: &InvocationContext, instruction: &Instruction) -> Result<()> {
        self.processor.execute(&self.ledger, ctx, instruction)
    }
}
