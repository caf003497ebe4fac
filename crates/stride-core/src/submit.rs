//! Submission and status facade.
//!
//! The thin entry points the HTTP layer and CLI call into: validate a
//! request, create the pending plan record, enqueue the job, and answer
//! status polls and full-plan reads. Authentication is an external
//! collaborator; callers hand in an already-verified user id.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use stride_db::models::{Plan, PlanStatus, PlannedSession, PlannedWeek};
use stride_db::queries::{plans, sessions, weeks};

use crate::engine::PlanRequest;
use crate::error::GenerationError;
use crate::queue::{self, EnqueueOutcome};

/// Accepted range for plan duration, in weeks.
pub const DURATION_WEEKS_RANGE: std::ops::RangeInclusive<i32> = 4..=52;

/// Accepted range for sessions per week.
pub const SESSIONS_PER_WEEK_RANGE: std::ops::RangeInclusive<i32> = 2..=7;

/// Result of an accepted submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub plan: Plan,
    pub outcome: EnqueueOutcome,
}

/// Validate a request against the accepted ranges.
///
/// Runs synchronously at submission time; a rejected request never creates
/// a plan record and never reaches the queue.
pub fn validate_request(request: &PlanRequest) -> Result<(), GenerationError> {
    if !DURATION_WEEKS_RANGE.contains(&request.duration_weeks) {
        return Err(GenerationError::Validation(format!(
            "durationWeeks must be between 4 and 52 (got {})",
            request.duration_weeks
        )));
    }
    if !SESSIONS_PER_WEEK_RANGE.contains(&request.sessions_per_week) {
        return Err(GenerationError::Validation(format!(
            "sessionsPerWeek must be between 2 and 7 (got {})",
            request.sessions_per_week
        )));
    }
    Ok(())
}

/// Accept a generation request: validate, create the pending record, and
/// enqueue the job.
///
/// The submission path only ever creates the plan row; every later status
/// change belongs to the worker, so there is no write-write race on status.
/// If enqueueing fails after the record was created, the pending record is
/// left in place (a poller sees `pending` indefinitely) and the queue error
/// propagates.
pub async fn submit_plan(
    pool: &PgPool,
    user_id: Uuid,
    request: &PlanRequest,
) -> Result<Submission, GenerationError> {
    validate_request(request)?;

    // Placeholder name; replaced by the engine-derived name on success.
    let name = format!("Pending {} plan", request.objective);
    let plan = plans::insert_pending_plan(
        pool,
        user_id,
        &name,
        request.start_date,
        request.duration_weeks,
    )
    .await
    .map_err(GenerationError::persistence)?;

    let outcome = queue::enqueue(pool, plan.id, user_id, request).await?;

    Ok(Submission { plan, outcome })
}

/// Answer a status poll for a plan owned by `user_id`.
///
/// Returns `None` when the plan does not exist or is owned by someone else.
pub async fn plan_status(
    pool: &PgPool,
    plan_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PlanStatus>> {
    let plan = plans::get_plan_for_user(pool, plan_id, user_id).await?;
    Ok(plan.map(|p| p.status))
}

/// A week joined with its ordered sessions.
#[derive(Debug, Clone, Serialize)]
pub struct WeekDetail {
    #[serde(flatten)]
    pub week: PlannedWeek,
    pub sessions: Vec<PlannedSession>,
}

/// The canonical read model: a plan joined with its ordered weeks, each
/// joined with its ordered sessions.
#[derive(Debug, Clone, Serialize)]
pub struct PlanDetail {
    #[serde(flatten)]
    pub plan: Plan,
    pub weeks: Vec<WeekDetail>,
}

/// Fetch the full plan read model for a plan owned by `user_id`.
///
/// A plan has weeks and sessions if and only if its status is `generated`;
/// for pending or failed plans the `weeks` list is empty.
pub async fn get_plan_detail(
    pool: &PgPool,
    plan_id: Uuid,
    user_id: Uuid,
) -> Result<Option<PlanDetail>> {
    let Some(plan) = plans::get_plan_for_user(pool, plan_id, user_id).await? else {
        return Ok(None);
    };

    let plan_weeks = weeks::list_weeks_for_plan(pool, plan_id).await?;
    let mut detail_weeks = Vec::with_capacity(plan_weeks.len());
    for week in plan_weeks {
        let week_sessions = sessions::list_sessions_for_week(pool, week.id).await?;
        detail_weeks.push(WeekDetail {
            week,
            sessions: week_sessions,
        });
    }

    Ok(Some(PlanDetail {
        plan,
        weeks: detail_weeks,
    }))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::engine::{Level, Objective};

    fn request(duration_weeks: i32, sessions_per_week: i32) -> PlanRequest {
        PlanRequest {
            objective: Objective::Marathon,
            level: Level::Intermediate,
            duration_weeks,
            sessions_per_week,
            start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
        }
    }

    #[test]
    fn accepts_in_range_requests() {
        assert!(validate_request(&request(4, 2)).is_ok());
        assert!(validate_request(&request(52, 7)).is_ok());
        assert!(validate_request(&request(12, 4)).is_ok());
    }

    #[test]
    fn rejects_out_of_range_duration() {
        let err = validate_request(&request(3, 4)).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
        let err = validate_request(&request(53, 4)).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }

    #[test]
    fn rejects_out_of_range_session_count() {
        let err = validate_request(&request(12, 1)).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
        let err = validate_request(&request(12, 8)).unwrap_err();
        assert!(matches!(err, GenerationError::Validation(_)));
    }
}
