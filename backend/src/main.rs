use std::sync::Arc;

use poll_actions::{
    bootstrap::ensure_poll,
    build_rocket,
    config::ActionsConfig,
    routes::AppState,
    store::PgLedger,
};
use poll_core::PollProcessor;
use shuttle_runtime::CustomError;
use sqlx::PgPool;
use tracing::{info, warn};

#[shuttle_runtime::main]
async fn rocket(
    #[shuttle_shared_db::Postgres] pool: PgPool,
    #[shuttle_runtime::Secrets] secret_store: shuttle_runtime::SecretStore,
) -> shuttle_rocket::ShuttleRocket {
    info!("🚀 Starting poll action server");

    let config = ActionsConfig::from_secrets(&secret_store).map_err(CustomError::new)?;
    info!("Serving poll {} on {:?} with {} candidates", config.poll_id, config.cluster, config.candidates.len());

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(CustomError::new)?;

    info!("📋 Migrations complete");

    let ledger = Arc::new(PgLedger::new(pool, PollProcessor::new(config.program.clone())));

    match &config.bootstrap {
        Some(seed) => ensure_poll(&*ledger, &config, seed)
            .await
            .map_err(CustomError::new)?,
        None => warn!("BOOTSTRAP_POLL not set - poll {} must be opened externally", config.poll_id),
    }

    let rocket = build_rocket(AppState::new(config, ledger));

    Ok(rocket.into())
}
