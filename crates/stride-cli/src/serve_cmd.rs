//! The HTTP façade: plan submission, status polling, and plan reads.

use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use stride_core::engine::PlanRequest;
use stride_core::error::GenerationError;
use stride_core::queue::EnqueueOutcome;
use stride_core::submit;
use stride_db::models::{Plan, PlanStatus};
use stride_db::queries::plans as plan_db;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl From<GenerationError> for AppError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Validation(msg) => Self::bad_request(msg),
            other => Self::internal(other.into()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub plan_id: Uuid,
    pub status: PlanStatus,
    pub outcome: EnqueueOutcome,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub plan_id: Uuid,
    pub status: PlanStatus,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(pool: PgPool) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/generate", post(submit_plan))
        .route("/api/plans/{id}", get(get_plan_detail))
        .route("/api/plans/{id}/status", get(get_plan_status))
        .layer(CorsLayer::permissive())
        .with_state(pool)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pool: PgPool, bind: &str, port: u16) -> Result<()> {
    let app = build_router(pool);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("stride serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("stride serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Session verification is an upstream collaborator's concern; this façade
/// trusts the `X-User-Id` header the authenticating proxy sets.
fn user_id_from_headers(headers: &HeaderMap) -> Result<Uuid, AppError> {
    let raw = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing X-User-Id header"))?;
    raw.parse()
        .map_err(|_| AppError::unauthorized("invalid X-User-Id header"))
}

async fn index() -> impl IntoResponse {
    Json(serde_json::json!({ "service": "stride" }))
}

async fn submit_plan(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Json(request): Json<PlanRequest>,
) -> Result<axum::response::Response, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let submission = submit::submit_plan(&pool, user_id, &request).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            success: true,
            plan_id: submission.plan.id,
            status: submission.plan.status,
            outcome: submission.outcome,
            message: "Plan generation started".to_owned(),
        }),
    )
        .into_response())
}

async fn get_plan_status(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let status = submit::plan_status(&pool, id, user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    Ok(Json(StatusResponse {
        plan_id: id,
        status,
    })
    .into_response())
}

async fn get_plan_detail(
    State(pool): State<PgPool>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let detail = submit::get_plan_detail(&pool, id, user_id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;

    Ok(Json(detail).into_response())
}

async fn list_plans(
    State(pool): State<PgPool>,
    headers: HeaderMap,
) -> Result<axum::response::Response, AppError> {
    let user_id = user_id_from_headers(&headers)?;

    let plans: Vec<Plan> = plan_db::list_plans_for_user(&pool, user_id)
        .await
        .map_err(AppError::internal)?;

    Ok(Json(plans).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use tower::ServiceExt;
    use uuid::Uuid;

    use stride_core::worker::{Worker, WorkerConfig};
    use stride_db::queries::{jobs, plans};
    use stride_test_utils::{create_test_db, drop_test_db};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    async fn send_get(pool: PgPool, uri: &str, user_id: Option<Uuid>) -> axum::response::Response {
        let app = super::build_router(pool);
        let mut builder = Request::builder().uri(uri);
        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id.to_string());
        }
        app.oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn send_submit(
        pool: PgPool,
        user_id: Option<Uuid>,
        body: serde_json::Value,
    ) -> axum::response::Response {
        let app = super::build_router(pool);
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/plans/generate")
            .header("content-type", "application/json");
        if let Some(user_id) = user_id {
            builder = builder.header("x-user-id", user_id.to_string());
        }
        app.oneshot(builder.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn marathon_body() -> serde_json::Value {
        serde_json::json!({
            "objective": "marathon",
            "level": "intermediate",
            "durationWeeks": 12,
            "sessionsPerWeek": 4,
            "startDate": "2025-06-01"
        })
    }

    // -----------------------------------------------------------------------
    // Tests
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_index_returns_service_name() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["service"], "stride");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_missing_user_header_is_unauthorized() {
        let (pool, db_name) = create_test_db().await;

        let resp = send_get(pool.clone(), "/api/plans", None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = send_submit(pool.clone(), None, marathon_body()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_submit_accepts_and_creates_pending_plan() {
        let (pool, db_name) = create_test_db().await;
        let user_id = Uuid::new_v4();

        let resp = send_submit(pool.clone(), Some(user_id), marathon_body()).await;
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], true);
        assert_eq!(json["status"], "pending");
        assert_eq!(json["outcome"], "accepted");

        let plan_id: Uuid = json["planId"].as_str().unwrap().parse().unwrap();
        let plan = plans::get_plan(&pool, plan_id).await.unwrap().unwrap();
        assert_eq!(plan.user_id, user_id);
        assert_eq!(jobs::count_jobs(&pool).await.unwrap(), 1);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_submit_rejects_out_of_range_duration() {
        let (pool, db_name) = create_test_db().await;
        let user_id = Uuid::new_v4();

        let mut body = marathon_body();
        body["durationWeeks"] = serde_json::json!(3);
        let resp = send_submit(pool.clone(), Some(user_id), body).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert!(json["error"].as_str().unwrap().contains("durationWeeks"));

        // Rejected before anything was created.
        let listed = plans::list_plans_for_user(&pool, user_id).await.unwrap();
        assert!(listed.is_empty());
        assert_eq!(jobs::count_jobs(&pool).await.unwrap(), 0);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_status_poll_and_ownership() {
        let (pool, db_name) = create_test_db().await;
        let user_id = Uuid::new_v4();

        let resp = send_submit(pool.clone(), Some(user_id), marathon_body()).await;
        let json = body_json(resp).await;
        let plan_id = json["planId"].as_str().unwrap().to_string();

        let uri = format!("/api/plans/{plan_id}/status");
        let resp = send_get(pool.clone(), &uri, Some(user_id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "pending");

        // A stranger polling the same plan sees a 404, not someone else's plan.
        let resp = send_get(pool.clone(), &uri, Some(Uuid::new_v4())).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        // Unknown plan id.
        let uri = format!("/api/plans/{}/status", Uuid::new_v4());
        let resp = send_get(pool.clone(), &uri, Some(user_id)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_full_plan_read_after_generation() {
        let (pool, db_name) = create_test_db().await;
        let user_id = Uuid::new_v4();

        let resp = send_submit(pool.clone(), Some(user_id), marathon_body()).await;
        let json = body_json(resp).await;
        let plan_id = json["planId"].as_str().unwrap().to_string();

        let worker = Worker::new(pool.clone(), WorkerConfig::default());
        worker.process_next_batch().await.unwrap();

        let uri = format!("/api/plans/{plan_id}");
        let resp = send_get(pool.clone(), &uri, Some(user_id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["status"], "generated");
        assert_eq!(json["name"], "MARATHON Plan (intermediate)");
        // The read model is camelCase end to end, flattened rows included.
        assert_eq!(json["userId"], user_id.to_string());
        assert_eq!(json["durationWeeks"], 12);
        let weeks = json["weeks"].as_array().unwrap();
        assert_eq!(weeks.len(), 12);
        assert_eq!(weeks[0]["weekNumber"], 1);
        assert!(weeks[0]["volumeDistance"].is_number());
        let sessions = weeks[0]["sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 4);
        assert!(sessions[0]["dayOfWeek"].is_number());
        assert_eq!(sessions[0]["sessionType"], "run");

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn test_list_plans_scoped_to_user() {
        let (pool, db_name) = create_test_db().await;
        let user_id = Uuid::new_v4();

        let resp = send_get(pool.clone(), "/api/plans", Some(user_id)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!([]));

        send_submit(pool.clone(), Some(user_id), marathon_body()).await;
        send_submit(pool.clone(), Some(Uuid::new_v4()), marathon_body()).await;

        let resp = send_get(pool.clone(), "/api/plans", Some(user_id)).await;
        let json = body_json(resp).await;
        let arr = json.as_array().unwrap();
        assert_eq!(arr.len(), 1);
        assert_eq!(arr[0]["userId"], user_id.to_string());

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
