//! Database query functions for the `planned_sessions` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlannedSession;

/// List all sessions for a week, ordered by day of week.
pub async fn list_sessions_for_week(pool: &PgPool, week_id: Uuid) -> Result<Vec<PlannedSession>> {
    let sessions = sqlx::query_as::<_, PlannedSession>(
        "SELECT * FROM planned_sessions WHERE week_id = $1 ORDER BY day_of_week ASC",
    )
    .bind(week_id)
    .fetch_all(pool)
    .await
    .context("failed to list sessions for week")?;

    Ok(sessions)
}

/// List all sessions for a plan (resolving through the weeks table), ordered
/// by week number then day of week.
pub async fn list_sessions_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<Vec<PlannedSession>> {
    let sessions = sqlx::query_as::<_, PlannedSession>(
        "SELECT s.* FROM planned_sessions s \
         JOIN planned_weeks w ON w.id = s.week_id \
         WHERE w.plan_id = $1 \
         ORDER BY w.week_number ASC, s.day_of_week ASC",
    )
    .bind(plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list sessions for plan")?;

    Ok(sessions)
}

/// Count the sessions persisted for a plan.
pub async fn count_sessions_for_plan(pool: &PgPool, plan_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM planned_sessions s \
         JOIN planned_weeks w ON w.id = s.week_id \
         WHERE w.plan_id = $1",
    )
    .bind(plan_id)
    .fetch_one(pool)
    .await
    .context("failed to count sessions for plan")?;

    Ok(row.0)
}
