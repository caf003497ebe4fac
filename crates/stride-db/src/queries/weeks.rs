//! Database query functions for the `planned_weeks` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlannedWeek;

/// List all weeks for a plan, ordered by week number.
pub async fn list_weeks_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlannedWeek>> {
    let weeks = sqlx::query_as::<_, PlannedWeek>(
        "SELECT * FROM planned_weeks WHERE plan_id = $1 ORDER BY week_number ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list weeks for plan")?;

    Ok(weeks)
}

/// Count the weeks persisted for a plan.
pub async fn count_weeks_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM planned_weeks WHERE plan_id = $1")
        .bind(plan_id)
        .fetch_one(pool)
        .await
        .context("failed to count weeks for plan")?;

    Ok(row.0)
}
