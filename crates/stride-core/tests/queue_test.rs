//! Integration tests for enqueue outcome tagging and deduplication.

use chrono::NaiveDate;
use uuid::Uuid;

use stride_core::engine::{Level, Objective, PlanRequest};
use stride_core::queue::{self, EnqueueOutcome};
use stride_core::submit;
use stride_core::worker::{Worker, WorkerConfig};
use stride_db::models::PlanStatus;
use stride_db::queries::{jobs, plans, weeks};
use stride_test_utils::{create_test_db, drop_test_db};

fn request() -> PlanRequest {
    PlanRequest {
        objective: Objective::HalfMarathon,
        level: Level::Beginner,
        duration_weeks: 8,
        sessions_per_week: 3,
        start_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
    }
}

#[tokio::test]
async fn first_enqueue_is_accepted() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    let submission = submit::submit_plan(&pool, user_id, &request()).await.unwrap();
    assert_eq!(submission.outcome, EnqueueOutcome::Accepted);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn enqueue_while_in_flight_is_a_duplicate() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    let submission = submit::submit_plan(&pool, user_id, &request()).await.unwrap();
    let plan_id = submission.plan.id;

    // Same plan id, job row still present.
    let outcome = queue::enqueue(&pool, plan_id, user_id, &request()).await.unwrap();
    assert_eq!(outcome, EnqueueOutcome::DuplicateInFlight);
    assert_eq!(jobs::count_jobs(&pool).await.unwrap(), 1);

    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn enqueue_after_completion_is_tagged_and_runs_again() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    let submission = submit::submit_plan(&pool, user_id, &request()).await.unwrap();
    let plan_id = submission.plan.id;

    let worker = Worker::new(pool.clone(), WorkerConfig::default());
    assert_eq!(worker.process_next_batch().await.unwrap(), 1);
    assert!(jobs::get_job(&pool, plan_id).await.unwrap().is_none());

    // The queue has forgotten the first execution, so this creates real
    // new work and says so.
    let outcome = queue::enqueue(&pool, plan_id, user_id, &request()).await.unwrap();
    assert_eq!(outcome, EnqueueOutcome::AcceptedAfterCompletion);

    // The second execution runs, fails against the terminal-state guard,
    // and leaves the first result untouched.
    assert_eq!(worker.process_next_batch().await.unwrap(), 1);

    let plan = plans::get_plan(&pool, plan_id).await.unwrap().unwrap();
    assert_eq!(plan.status, PlanStatus::Generated);
    assert_eq!(weeks::count_weeks_for_plan(&pool, plan_id).await.unwrap(), 8);

    drop_test_db(&db_name).await;
}
