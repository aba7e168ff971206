use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use plyworks_core::Actor;

use crate::api::PressState;
use crate::error::PressError;
use crate::model::{
    ApproveRequest, GlueEvent, GlueRequest, LoadRequest, OperatorBoard, PauseKind, PauseRequest,
    PressEntry, PressSession, RejectRequest, SelectProductRequest, SessionDetail,
    SessionHistoryQuery, SessionReport, SetDaylightsRequest, StartSessionRequest,
};
use crate::service::PressService;

pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .route("/sessions", post(start_session).get(session_history))
        .route("/sessions/{id}", get(session_detail))
        .route("/sessions/{id}/@report", get(session_report))
        .route("/sessions/{id}/@product", post(select_product))
        .route("/sessions/{id}/@daylights", post(set_daylights))
        .route("/sessions/{id}/@load", post(load))
        .route("/sessions/{id}/@glue", post(add_glue))
        .route("/sessions/{id}/@pause", post(pause_session))
        .route("/sessions/{id}/@maintenance", post(maintenance_session))
        .route("/sessions/{id}/@resume", post(resume_session))
        .route("/sessions/{id}/@stop", post(stop_session))
        .route("/sessions/{id}/@submit", post(submit_session))
        .route(
            "/sessions/{id}/@supervisor-approve",
            post(supervisor_approve),
        )
        .route("/sessions/{id}/@manager-approve", post(manager_approve))
        .route("/sessions/{id}/@reject", post(reject_session))
        .route("/board", get(operator_board))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /sessions
// ---------------------------------------------------------------------------

async fn start_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    body: Option<Json<StartSessionRequest>>,
) -> Result<Json<PressSession>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.start_session(&actor, &req)?))
}

// ---------------------------------------------------------------------------
// GET /sessions
// ---------------------------------------------------------------------------

async fn session_history(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<SessionHistoryQuery>,
) -> Result<Json<serde_json::Value>, PressError> {
    let result = svc.session_history(&actor, &query)?;
    Ok(Json(serde_json::json!({
        "items": result.items,
        "total": result.total,
    })))
}

// ---------------------------------------------------------------------------
// GET /sessions/:id
// ---------------------------------------------------------------------------

async fn session_detail(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, PressError> {
    Ok(Json(svc.session_detail(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// GET /sessions/:id/@report
// ---------------------------------------------------------------------------

async fn session_report(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<SessionReport>, PressError> {
    Ok(Json(svc.session_report(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@product
// ---------------------------------------------------------------------------

async fn select_product(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<SelectProductRequest>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.select_product(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@daylights
// ---------------------------------------------------------------------------

async fn set_daylights(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<SetDaylightsRequest>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.set_daylights(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@load
// ---------------------------------------------------------------------------

async fn load(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<LoadRequest>>,
) -> Result<Json<PressEntry>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.load(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@glue
// ---------------------------------------------------------------------------

async fn add_glue(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<GlueRequest>>,
) -> Result<Json<GlueEvent>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.add_glue(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@pause and @maintenance
// ---------------------------------------------------------------------------

async fn pause_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<PauseRequest>>,
) -> Result<Json<PressSession>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.pause_session(&actor, &id, PauseKind::Pause, &req)?))
}

async fn maintenance_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<PauseRequest>>,
) -> Result<Json<PressSession>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.pause_session(
        &actor,
        &id,
        PauseKind::Maintenance,
        &req,
    )?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@resume
// ---------------------------------------------------------------------------

async fn resume_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.resume_session(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@stop
// ---------------------------------------------------------------------------

async fn stop_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.stop_session(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@submit
// ---------------------------------------------------------------------------

async fn submit_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.submit_session(&actor, &id)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@supervisor-approve and @manager-approve
// ---------------------------------------------------------------------------

async fn supervisor_approve(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<PressSession>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.supervisor_approve_session(&actor, &id, &req)?))
}

async fn manager_approve(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<PressSession>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.manager_approve_session(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /sessions/:id/@reject
// ---------------------------------------------------------------------------

async fn reject_session(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<RejectRequest>,
) -> Result<Json<PressSession>, PressError> {
    Ok(Json(svc.reject_session(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// GET /board
// ---------------------------------------------------------------------------

async fn operator_board(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<OperatorBoard>, PressError> {
    Ok(Json(svc.operator_board(&actor)?))
}
