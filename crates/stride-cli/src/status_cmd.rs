//! Poll a plan's generation status from the command line.

use std::time::Duration;

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use stride_db::queries::plans;

/// Print a plan's status once, or poll until it reaches a terminal state.
///
/// The poll loop is bounded: after `attempts` polls it gives up and reports
/// whatever status was last observed -- which may be `pending` indefinitely
/// if no worker ever runs.
pub async fn run_status(
    pool: &PgPool,
    plan_id: &str,
    wait: bool,
    attempts: u32,
    interval_secs: u64,
) -> Result<()> {
    let plan_id: Uuid = plan_id.parse().context("invalid plan id")?;

    // At least one poll always runs, so `--attempts 0` cannot underflow the
    // countdown below.
    let mut remaining = if wait { attempts.max(1) } else { 1 };
    loop {
        let plan = plans::get_plan(pool, plan_id)
            .await?
            .with_context(|| format!("plan {plan_id} not found"))?;

        println!("{} {}", plan.id, plan.status);

        remaining -= 1;
        if !wait || plan.status.is_terminal() || remaining == 0 {
            if wait && !plan.status.is_terminal() {
                eprintln!("gave up after {attempts} polls; last observed status: {}", plan.status);
            }
            return Ok(());
        }

        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
