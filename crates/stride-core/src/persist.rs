//! Plan persistence writer.
//!
//! Materializes a generated plan (weeks, then sessions, then the plan row
//! update) inside a single database transaction. If any step fails the
//! transaction rolls back on drop, so readers polling status or listing
//! plans never observe a partially-written week/session set.

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::engine::GeneratedPlan;
use crate::error::GenerationError;

/// Persist a generated plan for an existing `pending` plan record.
///
/// Steps, in order: bulk-insert the weeks capturing their assigned ids,
/// insert every session against its week's id, then flip the plan row to
/// `generated` with the engine-derived name and description. Sessions
/// depend on week ids, so the sequencing is a hard ordering requirement,
/// not a style choice.
pub async fn save_generated_plan(
    pool: &PgPool,
    plan_id: Uuid,
    plan: &GeneratedPlan,
) -> Result<(), GenerationError> {
    let mut tx = pool.begin().await.map_err(GenerationError::persistence)?;

    // 1. Insert weeks, capturing the server-assigned id for each week number.
    let mut week_ids: HashMap<i32, Uuid> = HashMap::with_capacity(plan.weeks.len());

    for week in &plan.weeks {
        let (week_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO planned_weeks (plan_id, week_number, phase, volume_distance, volume_duration) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(plan_id)
        .bind(week.week_number)
        .bind(week.phase)
        .bind(week.volume_distance)
        .bind(week.volume_duration)
        .fetch_one(&mut *tx)
        .await
        .map_err(GenerationError::persistence)?;

        week_ids.insert(week.week_number, week_id);
    }

    // 2. Insert sessions, joined to their week's assigned id.
    for week in &plan.weeks {
        let week_id = week_ids[&week.week_number];
        for session in &week.sessions {
            sqlx::query(
                "INSERT INTO planned_sessions \
                 (week_id, day_of_week, session_type, target_distance, target_duration, description) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(week_id)
            .bind(session.day_of_week)
            .bind(session.session_type)
            .bind(session.target_distance)
            .bind(session.target_duration)
            .bind(&session.description)
            .execute(&mut *tx)
            .await
            .map_err(GenerationError::persistence)?;
        }
    }

    // 3. Final step: flip the plan to `generated`, refreshing name and
    // description from the engine output. Guarded on `pending` so a plan
    // can never leave a terminal state.
    let result = sqlx::query(
        "UPDATE plans \
         SET status = 'generated', name = $1, description = $2, updated_at = now() \
         WHERE id = $3 AND status = 'pending'",
    )
    .bind(&plan.name)
    .bind(&plan.description)
    .bind(plan_id)
    .execute(&mut *tx)
    .await
    .map_err(GenerationError::persistence)?;

    if result.rows_affected() == 0 {
        // Missing plan or one already in a terminal state. No commit: the
        // inserted weeks and sessions roll back with the transaction.
        return Err(GenerationError::persistence(anyhow::anyhow!(
            "plan {plan_id} not found or not in pending status"
        )));
    }

    tx.commit().await.map_err(GenerationError::persistence)?;

    tracing::info!(plan_id = %plan_id, weeks = plan.weeks.len(), "generated plan persisted");
    Ok(())
}
