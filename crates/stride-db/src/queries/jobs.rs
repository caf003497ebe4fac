//! Database query functions for the `generation_jobs` table -- the queue's
//! own storage.
//!
//! Claiming uses `FOR UPDATE SKIP LOCKED` so concurrent workers never hand
//! the same job to two executors at once. Delivery is still at-least-once:
//! a worker that dies mid-job leaves an `active` row behind, which
//! [`reset_stale_active_jobs`] returns to `queued` on the next worker start.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::GenerationJob;

/// Insert a new queued job. Returns `false` when a row for this plan id
/// already exists (the queue's deduplication: the second enqueue is the same
/// logical unit of work).
pub async fn insert_job(
    pool: &PgPool,
    plan_id: Uuid,
    user_id: Uuid,
    request: &serde_json::Value,
) -> Result<bool> {
    let result = sqlx::query(
        "INSERT INTO generation_jobs (plan_id, user_id, request) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (plan_id) DO NOTHING",
    )
    .bind(plan_id)
    .bind(user_id)
    .bind(request)
    .execute(pool)
    .await
    .context("failed to insert generation job")?;

    Ok(result.rows_affected() == 1)
}

/// Fetch a job by plan id.
pub async fn get_job(pool: &PgPool, plan_id: Uuid) -> Result<Option<GenerationJob>> {
    let job = sqlx::query_as::<_, GenerationJob>(
        "SELECT * FROM generation_jobs WHERE plan_id = $1",
    )
    .bind(plan_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch generation job")?;

    Ok(job)
}

/// Atomically claim up to `limit` queued jobs, oldest first.
///
/// Claimed rows move to `active` with `started_at` set and the attempt
/// counter incremented. `SKIP LOCKED` lets concurrent claimers pass over
/// rows another transaction is already taking.
pub async fn claim_jobs(pool: &PgPool, limit: i64) -> Result<Vec<GenerationJob>> {
    let jobs = sqlx::query_as::<_, GenerationJob>(
        "UPDATE generation_jobs \
         SET state = 'active', started_at = now(), attempt = attempt + 1 \
         WHERE plan_id IN ( \
             SELECT plan_id FROM generation_jobs \
             WHERE state = 'queued' \
             ORDER BY enqueued_at ASC \
             LIMIT $1 \
             FOR UPDATE SKIP LOCKED \
         ) \
         RETURNING *",
    )
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to claim generation jobs")?;

    Ok(jobs)
}

/// Remove a completed job. Successful work leaves no trace in the queue.
pub async fn complete_job(pool: &PgPool, plan_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM generation_jobs WHERE plan_id = $1")
        .bind(plan_id)
        .execute(pool)
        .await
        .context("failed to delete completed job")?;

    Ok(())
}

/// Record a job failure. The row stays in `failed` state until the retention
/// sweep removes it.
pub async fn fail_job(pool: &PgPool, plan_id: Uuid, error: &str) -> Result<()> {
    sqlx::query(
        "UPDATE generation_jobs \
         SET state = 'failed', failed_at = now(), last_error = $1 \
         WHERE plan_id = $2",
    )
    .bind(error)
    .bind(plan_id)
    .execute(pool)
    .await
    .context("failed to record job failure")?;

    Ok(())
}

/// Return an active job to `queued` for another attempt.
pub async fn requeue_job(pool: &PgPool, plan_id: Uuid) -> Result<()> {
    sqlx::query(
        "UPDATE generation_jobs \
         SET state = 'queued', started_at = NULL \
         WHERE plan_id = $1 AND state = 'active'",
    )
    .bind(plan_id)
    .execute(pool)
    .await
    .context("failed to requeue job")?;

    Ok(())
}

/// Delete failed jobs older than the retention window. Returns the number of
/// rows swept.
pub async fn sweep_failed_jobs(pool: &PgPool, retention: Duration) -> Result<u64> {
    let cutoff = Utc::now() - retention;
    let result = sqlx::query(
        "DELETE FROM generation_jobs WHERE state = 'failed' AND failed_at < $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await
    .context("failed to sweep failed jobs")?;

    Ok(result.rows_affected())
}

/// Reset `active` jobs that have been held longer than `stale_after` back to
/// `queued`. Restart recovery for workers that died mid-job.
pub async fn reset_stale_active_jobs(pool: &PgPool, stale_after: Duration) -> Result<u64> {
    let cutoff = Utc::now() - stale_after;
    let result = sqlx::query(
        "UPDATE generation_jobs \
         SET state = 'queued', started_at = NULL \
         WHERE state = 'active' AND started_at < $1",
    )
    .bind(cutoff)
    .execute(pool)
    .await
    .context("failed to reset stale active jobs")?;

    Ok(result.rows_affected())
}

/// Count jobs currently in the queue, by any state.
pub async fn count_jobs(pool: &PgPool) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM generation_jobs")
        .fetch_one(pool)
        .await
        .context("failed to count generation jobs")?;

    Ok(row.0)
}
