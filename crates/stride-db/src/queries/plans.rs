//! Database query functions for the `plans` table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Plan, PlanStatus};

/// Insert a new plan row in `pending` status. Returns the inserted plan with
/// server-generated defaults (id, status, timestamps).
///
/// This is the only write the submission path performs; every later status
/// change belongs to the worker.
pub async fn insert_pending_plan(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    start_date: NaiveDate,
    duration_weeks: i32,
) -> Result<Plan> {
    let plan = sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (user_id, name, start_date, duration_weeks) \
         VALUES ($1, $2, $3, $4) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(name)
    .bind(start_date)
    .bind(duration_weeks)
    .fetch_one(pool)
    .await
    .context("failed to insert plan")?;

    Ok(plan)
}

/// Fetch a plan by its ID.
pub async fn get_plan(pool: &PgPool, id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// Fetch a plan by ID, scoped to an owner. Returns `None` when the plan does
/// not exist or belongs to someone else -- callers cannot tell the two cases
/// apart, which is intentional.
pub async fn get_plan_for_user(pool: &PgPool, id: Uuid, user_id: Uuid) -> Result<Option<Plan>> {
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch plan")?;

    Ok(plan)
}

/// List all plans for a user, ordered by creation time (newest first).
pub async fn list_plans_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Plan>> {
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list plans")?;

    Ok(plans)
}

/// Mark a pending plan as `failed`, embedding a short diagnostic in the
/// description field.
///
/// Guarded on the current status being `pending` so a plan can never leave
/// a terminal state. Returns the number of rows updated (0 when the plan is
/// missing or already terminal).
pub async fn mark_plan_failed(pool: &PgPool, id: Uuid, diagnostic: &str) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE plans \
         SET status = $1, description = $2, updated_at = now() \
         WHERE id = $3 AND status = $4",
    )
    .bind(PlanStatus::Failed)
    .bind(format!("Error: {diagnostic}"))
    .bind(id)
    .bind(PlanStatus::Pending)
    .execute(pool)
    .await
    .context("failed to mark plan as failed")?;

    Ok(result.rows_affected())
}

/// Delete a plan (cascades to weeks and sessions).
pub async fn delete_plan(pool: &PgPool, id: Uuid) -> Result<()> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete plan")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("plan {id} not found");
    }

    Ok(())
}
