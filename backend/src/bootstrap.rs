use poll_core::{ErrorCode, Instruction, InvocationContext, Result, SystemClock};
use tracing::{info, instrument};

use crate::config::{ActionsConfig, PollSeed};
use crate::store::TransitionHost;

fn tolerate_existing(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.code == ErrorCode::AlreadyExists => {
            info!("{}", e.message);
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Makes sure the configured poll and every configured candidate exist.
/// Safe to run on every start.
#[instrument(skip_all, fields(poll_id = config.poll_id))]
pub async fn ensure_poll(host: &dyn TransitionHost, config: &ActionsConfig, seed: &PollSeed) -> Result<()> {
    let ctx = InvocationContext::now(seed.authority, &SystemClock);

    let open = Instruction::OpenPoll {
        poll_id: config.poll_id,
        description: seed.description.clone(),
        poll_start: seed.poll_start,
        poll_end: seed.poll_end,
    };
    if tolerate_existing(host.execute(&ctx, &open).await)? {
        info!("🗳️ Opened poll {}", config.poll_id);
    }

    let mut registered = 0;
    for name in &config.candidates {
        let register = Instruction::RegisterCandidate {
            poll_id: config.poll_id,
            candidate_name: name.clone(),
        };
        if tolerate_existing(host.execute(&ctx, &register).await)? {
            registered += 1;
        }
    }

    info!("✓ Poll {} ready ({} of {} candidates newly registered)", config.poll_id, registered, config.candidates.len());
    Ok(())
}
