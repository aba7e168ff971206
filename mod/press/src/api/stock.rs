use std::sync::Arc;

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};

use plyworks_core::Actor;

use crate::api::PressState;
use crate::error::PressError;
use crate::model::{CreateStockRecordRequest, StockListQuery, StockRecord};
use crate::service::PressService;

pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .route("/stock", get(list_stock).post(create_stock_record))
        .route("/stock/{id}/@activate", post(activate))
        .route("/stock/{id}/@deactivate", post(deactivate))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// GET /stock
// ---------------------------------------------------------------------------

async fn list_stock(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Query(query): Query<StockListQuery>,
) -> Result<Json<Vec<StockRecord>>, PressError> {
    Ok(Json(svc.list_stock(&actor, &query)?))
}

// ---------------------------------------------------------------------------
// POST /stock
// ---------------------------------------------------------------------------

async fn create_stock_record(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Json(req): Json<CreateStockRecordRequest>,
) -> Result<Json<StockRecord>, PressError> {
    Ok(Json(svc.create_stock_record(&actor, &req)?))
}

// ---------------------------------------------------------------------------
// POST /stock/:id/@activate and @deactivate
// ---------------------------------------------------------------------------

async fn activate(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<StockRecord>, PressError> {
    Ok(Json(svc.set_stock_active(&actor, &id, true)?))
}

async fn deactivate(
    State(svc): State<PressState>,
    Extension(actor): Extension<Actor>,
    Path(id): Path<String>,
) -> Result<Json<StockRecord>, PressError> {
    Ok(Json(svc.set_stock_active(&actor, &id, false)?))
}
