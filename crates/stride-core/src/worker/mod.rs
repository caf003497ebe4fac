//! Generation worker: pulls jobs from the queue, runs the periodization
//! engine, persists results, and updates plan status. Bounded concurrency
//! via a semaphore and a fixed-window rate limit on dispatch.

mod limiter;
mod retry;

pub use limiter::RateLimiter;
pub use retry::{NeverRetry, RetryClassifier};

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::PgPool;
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use stride_db::models::GenerationJob;
use stride_db::queries::{jobs, plans};

use crate::engine::{self, PlanRequest};
use crate::error::GenerationError;
use crate::persist;

/// Configuration for the generation worker.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum number of jobs processed simultaneously.
    pub concurrency: usize,
    /// Maximum job dispatches per rate window.
    pub rate_limit: u32,
    /// Length of the rate window.
    pub rate_window: Duration,
    /// How long to sleep when the queue is empty.
    pub poll_interval: Duration,
    /// How long failed jobs are retained before the sweep removes them.
    pub failed_job_retention: chrono::Duration,
    /// How often the retention sweep runs.
    pub sweep_interval: Duration,
    /// Age past which an `active` job is considered orphaned by a dead
    /// worker and returned to the queue on startup.
    pub stale_active_after: chrono::Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 5,
            rate_limit: 10,
            rate_window: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            failed_job_retention: chrono::Duration::minutes(5),
            sweep_interval: Duration::from_secs(30),
            stale_active_after: chrono::Duration::minutes(10),
        }
    }
}

/// Message sent from spawned job tasks back to the worker loop.
struct JobDone {
    plan_id: Uuid,
    result: Result<(), GenerationError>,
}

/// The generation worker. Holds injected handles only; no global state.
pub struct Worker {
    pool: PgPool,
    config: WorkerConfig,
    classifier: Arc<dyn RetryClassifier>,
}

impl Worker {
    /// Build a worker with the default single-attempt retry policy.
    pub fn new(pool: PgPool, config: WorkerConfig) -> Self {
        Self {
            pool,
            config,
            classifier: Arc::new(NeverRetry),
        }
    }

    /// Replace the retry classifier.
    pub fn with_classifier(mut self, classifier: Arc<dyn RetryClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    /// Run the worker loop until cancelled.
    ///
    /// On cancellation, stops claiming new jobs and drains in-flight ones
    /// with a bounded deadline.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        // Restart recovery: jobs a dead worker left in `active`.
        let reset = jobs::reset_stale_active_jobs(&self.pool, self.config.stale_active_after).await?;
        if reset > 0 {
            tracing::warn!(count = reset, "returned stale active jobs to the queue");
        }

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let (tx, mut rx) = mpsc::channel::<JobDone>(self.config.concurrency * 2);
        let mut limiter = RateLimiter::new(self.config.rate_limit, self.config.rate_window);
        let mut in_flight: usize = 0;
        let mut last_sweep = tokio::time::Instant::now();

        tracing::info!(
            concurrency = self.config.concurrency,
            rate_limit = self.config.rate_limit,
            "generation worker started"
        );

        loop {
            if cancel.is_cancelled() {
                tracing::info!(in_flight, "worker cancelled, draining in-flight jobs");
                let drain_deadline = tokio::time::Instant::now() + Duration::from_secs(10);
                while in_flight > 0 {
                    match tokio::time::timeout_at(drain_deadline, rx.recv()).await {
                        Ok(Some(done)) => {
                            in_flight -= 1;
                            log_job_done(&done);
                        }
                        _ => break,
                    }
                }
                if in_flight > 0 {
                    tracing::warn!(remaining = in_flight, "drain timeout expired");
                }
                return Ok(());
            }

            // Drain completed results (non-blocking).
            while let Ok(done) = rx.try_recv() {
                in_flight -= 1;
                log_job_done(&done);
            }

            // Periodic retention sweep for failed jobs.
            if last_sweep.elapsed() >= self.config.sweep_interval {
                let swept =
                    jobs::sweep_failed_jobs(&self.pool, self.config.failed_job_retention).await?;
                if swept > 0 {
                    tracing::debug!(count = swept, "swept expired failed jobs");
                }
                last_sweep = tokio::time::Instant::now();
            }

            // Claim up to the free concurrency slots.
            let free = semaphore.available_permits();
            let claimed = if free > 0 {
                jobs::claim_jobs(&self.pool, free as i64).await?
            } else {
                Vec::new()
            };
            let claimed_any = !claimed.is_empty();

            for job in claimed {
                limiter.acquire().await;
                let permit = semaphore.clone().acquire_owned().await?;

                let pool = self.pool.clone();
                let classifier = Arc::clone(&self.classifier);
                let tx = tx.clone();
                in_flight += 1;

                tokio::spawn(async move {
                    let plan_id = job.plan_id;
                    let result = execute_job(&pool, &job, classifier.as_ref()).await;
                    drop(permit);
                    let _ = tx.send(JobDone { plan_id, result }).await;
                });
            }

            // Nothing claimed: wait for a result, the poll interval, or
            // cancellation instead of busy-looping.
            if !claimed_any {
                if in_flight > 0 {
                    tokio::select! {
                        done = rx.recv() => {
                            if let Some(done) = done {
                                in_flight -= 1;
                                log_job_done(&done);
                            }
                        }
                        _ = cancel.cancelled() => continue,
                    }
                } else {
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.poll_interval) => {}
                        _ = cancel.cancelled() => continue,
                    }
                }
            }
        }
    }

    /// Claim and process everything currently queued, sequentially, up to
    /// the concurrency limit per claim batch. Returns the number of jobs
    /// processed. Used by tests and one-shot draining.
    pub async fn process_next_batch(&self) -> Result<usize> {
        let claimed = jobs::claim_jobs(&self.pool, self.config.concurrency as i64).await?;
        let mut processed = 0;

        for job in claimed {
            let result = execute_job(&self.pool, &job, self.classifier.as_ref()).await;
            log_job_done(&JobDone {
                plan_id: job.plan_id,
                result,
            });
            processed += 1;
        }

        Ok(processed)
    }
}

/// Run one claimed job end to end: decode, generate, persist, settle the
/// queue row. Returns the pipeline outcome (already settled against the
/// database by the time this returns).
async fn execute_job(
    pool: &PgPool,
    job: &GenerationJob,
    classifier: &dyn RetryClassifier,
) -> Result<(), GenerationError> {
    tracing::info!(plan_id = %job.plan_id, user_id = %job.user_id, attempt = job.attempt, "processing generation job");

    let result = run_pipeline(pool, job).await;

    match &result {
        Ok(()) => {
            // The queue forgets successful work entirely.
            jobs::complete_job(pool, job.plan_id)
                .await
                .map_err(GenerationError::queue)?;
        }
        Err(err) => {
            if classifier.is_retriable(err) {
                tracing::warn!(plan_id = %job.plan_id, error = %err, "job failed, requeueing");
                jobs::requeue_job(pool, job.plan_id)
                    .await
                    .map_err(GenerationError::queue)?;
            } else {
                tracing::error!(plan_id = %job.plan_id, error = %err, "job failed, marking plan failed");
                let rows = plans::mark_plan_failed(pool, job.plan_id, &err.diagnostic())
                    .await
                    .map_err(GenerationError::persistence)?;
                if rows == 0 {
                    tracing::warn!(
                        plan_id = %job.plan_id,
                        "plan missing or already terminal, status not changed"
                    );
                }
                jobs::fail_job(pool, job.plan_id, &err.to_string())
                    .await
                    .map_err(GenerationError::queue)?;
            }
        }
    }

    result
}

/// The job's actual unit of work: map the payload into the engine's input,
/// generate, persist.
async fn run_pipeline(pool: &PgPool, job: &GenerationJob) -> Result<(), GenerationError> {
    // Upstream validation is trusted; a payload that fails to decode here
    // is treated like any other terminal failure.
    let request: PlanRequest = serde_json::from_value(job.request.clone())
        .map_err(|e| GenerationError::Validation(format!("malformed job payload: {e}")))?;

    let generated = engine::generate(&request)?;
    persist::save_generated_plan(pool, job.plan_id, &generated).await?;

    Ok(())
}

fn log_job_done(done: &JobDone) {
    match &done.result {
        Ok(()) => {
            tracing::info!(plan_id = %done.plan_id, "generation job completed");
        }
        Err(err) => {
            tracing::warn!(plan_id = %done.plan_id, error = %err, "generation job failed");
        }
    }
}
