use std::sync::Arc;

use axum::extract::{Extension, State};
use axum::routing::get;
use axum::{Json, Router};

use plyworks_core::Actor;

use crate::api::PressState;
use crate::error::PressError;
use crate::model::{DailyLog, PressSession};
use crate::service::PressService;

pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .route("/approvals/sessions", get(pending_sessions))
        .route("/approvals/daily-logs", get(pending_daily_logs))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// GET /approvals/sessions
// ---------------------------------------------------------------------------

async fn pending_sessions(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<PressSession>>, PressError> {
    Ok(Json(svc.pending_sessions(&actor)?))
}

// ---------------------------------------------------------------------------
// GET /approvals/daily-logs
// ---------------------------------------------------------------------------

async fn pending_daily_logs(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
) -> Result<Json<Vec<DailyLog>>, PressError> {
    Ok(Json(svc.pending_daily_logs(&actor)?))
}
