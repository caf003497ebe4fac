//! Generation job queue, backed by the `generation_jobs` table.
//!
//! Job identity is the plan id: a second enqueue for the same plan while a
//! job row exists is absorbed by the primary key and reported as a
//! duplicate. Once a job completes its row is deleted, so a later enqueue
//! with the same plan id starts a genuinely new execution -- the guarantee
//! is deliberately weak idempotency, not exactly-once, and the outcome tag
//! makes the distinction observable instead of hiding it.

use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use stride_db::queries::{jobs, plans};

use crate::engine::PlanRequest;
use crate::error::GenerationError;

/// What happened to an enqueue call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnqueueOutcome {
    /// A new job was queued for a plan with no prior completed execution.
    Accepted,
    /// A job for this plan id is already queued, active, or retained as
    /// failed; this call did not create new work.
    DuplicateInFlight,
    /// A new job was queued although a prior job for this plan id already
    /// ran to a terminal state and was removed from the queue. A second
    /// independent execution will occur.
    AcceptedAfterCompletion,
}

/// Enqueue a generation job for a plan.
///
/// The pending plan record must already exist; enqueueing never touches the
/// plan row itself.
pub async fn enqueue(
    pool: &PgPool,
    plan_id: Uuid,
    user_id: Uuid,
    request: &PlanRequest,
) -> Result<EnqueueOutcome, GenerationError> {
    let request_json = serde_json::to_value(request).map_err(GenerationError::queue)?;

    // Observed before the insert: whether a prior execution already drove
    // this plan to a terminal state. Only used to tag the outcome.
    let prior_terminal = plans::get_plan(pool, plan_id)
        .await
        .map_err(GenerationError::queue)?
        .map(|p| p.status.is_terminal())
        .unwrap_or(false);

    let inserted = jobs::insert_job(pool, plan_id, user_id, &request_json)
        .await
        .map_err(GenerationError::queue)?;

    if !inserted {
        tracing::debug!(plan_id = %plan_id, "enqueue deduplicated against in-flight job");
        return Ok(EnqueueOutcome::DuplicateInFlight);
    }

    if prior_terminal {
        tracing::warn!(
            plan_id = %plan_id,
            "enqueued new job for a plan that already reached a terminal state"
        );
        Ok(EnqueueOutcome::AcceptedAfterCompletion)
    } else {
        tracing::info!(plan_id = %plan_id, user_id = %user_id, "generation job enqueued");
        Ok(EnqueueOutcome::Accepted)
    }
}
