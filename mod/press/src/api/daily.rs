use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use plyworks_core::Actor;

use crate::api::PressState;
use crate::error::PressError;
use crate::model::{
    ApproveRequest, CreateProductionEntryRequest, DailyLog, DailyLogDetail, DailyLogListQuery,
    DayView, DayViewQuery, ProductionEntry, RejectRequest, SubmitDailyLogRequest,
};
use crate::service::PressService;

pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .route(
            "/production-entries",
            post(add_production_entry).get(day_view),
        )
        .route("/production-entries/{id}", delete(delete_production_entry))
        .route("/daily-logs", get(list_daily_logs))
        .route("/daily-logs/@submit", post(submit_daily_log))
        .route("/daily-logs/{id}", get(daily_log_detail))
        .route(
            "/daily-logs/{id}/@supervisor-approve",
            post(supervisor_approve),
        )
        .route("/daily-logs/{id}/@manager-approve", post(manager_approve))
        .route("/daily-logs/{id}/@reject", post(reject_daily))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /production-entries
// ---------------------------------------------------------------------------

async fn add_production_entry(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateProductionEntryRequest>,
) -> Result<Json<ProductionEntry>, PressError> {
    Ok(Json(svc.add_production_entry(&actor, &req)?))
}

// ---------------------------------------------------------------------------
// GET /production-entries
// ---------------------------------------------------------------------------

async fn day_view(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<DayViewQuery>,
) -> Result<Json<DayView>, PressError> {
    Ok(Json(svc.day_view(&actor, &query)?))
}

// ---------------------------------------------------------------------------
// DELETE /production-entries/:id
// ---------------------------------------------------------------------------

async fn delete_production_entry(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, PressError> {
    svc.delete_production_entry(&actor, &id)?;
    Ok(Json(serde_json::json!({ "deleted": id })))
}

// ---------------------------------------------------------------------------
// POST /daily-logs/@submit
// ---------------------------------------------------------------------------

async fn submit_daily_log(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    body: Option<Json<SubmitDailyLogRequest>>,
) -> Result<Json<DailyLogDetail>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.submit_daily_log(&actor, &req)?))
}

// ---------------------------------------------------------------------------
// GET /daily-logs
// ---------------------------------------------------------------------------

async fn list_daily_logs(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<DailyLogListQuery>,
) -> Result<Json<serde_json::Value>, PressError> {
    let result = svc.list_daily_logs(&actor, &query)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

// ---------------------------------------------------------------------------
// GET /daily-logs/:id
// ---------------------------------------------------------------------------

async fn daily_log_detail(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<DailyLogDetail>, PressError> {
    Ok(Json(svc.daily_log_detail(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// POST /daily-logs/:id/@supervisor-approve and @manager-approve
// ---------------------------------------------------------------------------

async fn supervisor_approve(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<DailyLog>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.supervisor_approve_daily(&actor, &id, &req)?))
}

async fn manager_approve(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<DailyLog>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.manager_approve_daily(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /daily-logs/:id/@reject
// ---------------------------------------------------------------------------

async fn reject_daily(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<DailyLog>, PressError> {
    Ok(Json(svc.reject_daily(&actor, &id, &req)?))
}
