use std::sync::Arc;

use axum::extract::{Extension, Path, State};
use axum::routing::post;
use axum::{Json, Router};

use plyworks_core::Actor;

use crate::api::PressState;
use crate::error::PressError;
use crate::model::{CorrectEntryRequest, PressEntry, UnloadRequest};
use crate::service::PressService;

pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .route("/entries/{id}/@unload", post(unload))
        .route("/entries/{id}/@correct", post(correct_entry))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// POST /entries/:id/@unload
// ---------------------------------------------------------------------------

async fn unload(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    body: Option<Json<UnloadRequest>>,
) -> Result<Json<PressEntry>, PressError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    Ok(Json(svc.unload(&actor, &id, &req)?))
}

// ---------------------------------------------------------------------------
// POST /entries/:id/@correct
// ---------------------------------------------------------------------------

async fn correct_entry(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
    Json(req): Json<CorrectEntryRequest>,
) -> Result<Json<PressEntry>, PressError> {
    Ok(Json(svc.correct_entry(&actor, &id, &req)?))
}
