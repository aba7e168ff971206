//! HTTP-level tests for the press API.
//!
//! Drives the module router exactly as the daemon mounts it, with the
//! caller injected as a request extension the way the daemon's actor
//! middleware does it. Asserts both payloads and the error envelope
//! (`{"code", "message"}`) clients match on.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::{Extension, Router};
use tower::ServiceExt;

use plyworks_core::{Actor, FixedClock, Role};
use plyworks_sql::SqliteStore;

use press::notify::MemoryNotifier;
use press::service::PressService;

const SCOPE: &str = "plant1";

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

fn press_router() -> (Router, Arc<FixedClock>) {
    let db = Arc::new(SqliteStore::open_in_memory().unwrap());
    let clock = Arc::new(FixedClock::at("2026-03-01T08:00:00+00:00"));
    let notifier = Arc::new(MemoryNotifier::new());
    let svc = Arc::new(PressService::new(db, clock.clone(), notifier).unwrap());
    (press::api::router(svc), clock)
}

fn operator(id: &str) -> Actor {
    Actor::new(id, Role::Operator, SCOPE)
}

fn supervisor(id: &str) -> Actor {
    Actor::new(id, Role::Supervisor, SCOPE)
}

fn manager(id: &str) -> Actor {
    Actor::new(id, Role::Manager, SCOPE)
}

async fn api_call(
    router: &Router,
    actor: &Actor,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header("content-type", "application/json");
    }
    let body = match body {
        Some(v) => Body::from(serde_json::to_string(&v).unwrap()),
        None => Body::empty(),
    };
    let req = builder.body(body).unwrap();
    let resp = router
        .clone()
        .layer(Extension(actor.clone()))
        .oneshot(req)
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::json!(null))
    };
    (status, json)
}

async fn seed_packing(router: &Router, opening: i64) {
    let (status, _) = api_call(
        router,
        &manager("mgr1"),
        "POST",
        "/stock",
        Some(serde_json::json!({
            "categoryId": "packing",
            "thicknessId": "4mm",
            "sizeId": "8x4",
            "openingQty": opening,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Full shift over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shift_over_http() {
    let (router, clock) = press_router();
    let op = operator("op1");
    seed_packing(&router, 100).await;

    // Empty body: defaults apply.
    let (status, session) = api_call(&router, &op, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "RUNNING");
    assert_eq!(session["daylights"], 10);
    let sid = session["id"].as_str().unwrap().to_string();

    let (status, session) = api_call(
        &router,
        &op,
        "POST",
        &format!("/sessions/{sid}/@product"),
        Some(serde_json::json!({
            "categoryId": "packing", "thicknessId": "4mm", "sizeId": "8x4",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["product"]["categoryId"], "packing");

    let (status, entry) =
        api_call(&router, &op, "POST", &format!("/sessions/{sid}/@load"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["kind"], "COOK");
    assert_eq!(entry["quantity"], 10);
    let eid = entry["id"].as_str().unwrap().to_string();

    clock.advance_secs(1800);
    let (status, entry) = api_call(
        &router,
        &op,
        "POST",
        &format!("/entries/{eid}/@unload"),
        Some(serde_json::json!({"quantity": 8})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entry["quantity"], 8);
    assert!(entry["unloadTime"].is_string());

    // The board shows the in-flight session to its operator.
    let (status, board) = api_call(&router, &op, "GET", "/board", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(board["active"]["session"]["id"], sid.as_str());
    assert_eq!(board["products"].as_array().unwrap().len(), 1);

    let (status, session) =
        api_call(&router, &op, "POST", &format!("/sessions/{sid}/@stop"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "STOPPED");

    let (status, report) = api_call(
        &router,
        &op,
        "GET",
        &format!("/sessions/{sid}/@report"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["totals"][0]["quantity"], 8);
    assert_eq!(report["cookCount"], 1);
    assert_eq!(report["entries"][0]["cookSecs"], 1800);

    // Review chain over the action routes.
    let (status, _) = api_call(&router, &op, "POST", &format!("/sessions/{sid}/@submit"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = api_call(
        &router,
        &supervisor("sup1"),
        "POST",
        &format!("/sessions/{sid}/@supervisor-approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, session) = api_call(
        &router,
        &manager("mgr1"),
        "POST",
        &format!("/sessions/{sid}/@manager-approve"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["approval"]["status"], "MANAGER_APPROVED");

    // Stock reflects the approved output.
    let (status, records) = api_call(&router, &manager("mgr1"), "GET", "/stock", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(records[0]["currentQty"], 108);

    // History lists the finished session.
    let (status, page) = api_call(&router, &op, "GET", "/sessions?approval=MANAGER_APPROVED", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 1);
    assert_eq!(page["items"][0]["id"], sid.as_str());
}

// ---------------------------------------------------------------------------
// Role walls and the error envelope
// ---------------------------------------------------------------------------

#[tokio::test]
async fn role_walls_and_error_envelope() {
    let (router, _clock) = press_router();
    let op = operator("op1");
    seed_packing(&router, 100).await;

    // Operators cannot touch the stock ledger.
    let (status, err) = api_call(
        &router,
        &op,
        "POST",
        "/stock",
        Some(serde_json::json!({
            "categoryId": "x", "thicknessId": "y", "sizeId": "z",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["code"], "PERMISSION_DENIED");

    // One open session per operator.
    let (status, session) = api_call(&router, &op, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::OK);
    let sid = session["id"].as_str().unwrap().to_string();
    let (status, err) = api_call(&router, &op, "POST", "/sessions", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "ALREADY_RUNNING");

    // The board is an operator surface.
    let (status, err) = api_call(&router, &supervisor("sup1"), "GET", "/board", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(err["code"], "PERMISSION_DENIED");

    // A session in another scope does not exist as far as the caller
    // can tell.
    let foreign = Actor::new("sup9", Role::Supervisor, "plant9");
    let (status, err) = api_call(&router, &foreign, "GET", &format!("/sessions/{sid}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "NOT_FOUND");
}

// ---------------------------------------------------------------------------
// Validation and conflict codes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn validation_and_conflict_codes() {
    let (router, _clock) = press_router();
    let op = operator("op1");
    seed_packing(&router, 100).await;

    let (status, err) = api_call(
        &router,
        &op,
        "POST",
        "/sessions",
        Some(serde_json::json!({"daylights": 0})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_FAILED");

    let (_, session) = api_call(&router, &op, "POST", "/sessions", None).await;
    let sid = session["id"].as_str().unwrap().to_string();

    // Loading before a product is selected.
    let (status, err) =
        api_call(&router, &op, "POST", &format!("/sessions/{sid}/@load"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "PRODUCT_NOT_SELECTED");

    api_call(
        &router,
        &op,
        "POST",
        &format!("/sessions/{sid}/@product"),
        Some(serde_json::json!({
            "categoryId": "packing", "thicknessId": "4mm", "sizeId": "8x4",
        })),
    )
    .await;

    // Only one entry in the press at a time.
    let (status, _) = api_call(&router, &op, "POST", &format!("/sessions/{sid}/@load"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, err) =
        api_call(&router, &op, "POST", &format!("/sessions/{sid}/@load"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "ENTRY_ALREADY_OPEN");

    // Rejection without a note is refused before any state changes.
    let (status, err) = api_call(
        &router,
        &supervisor("sup1"),
        "POST",
        &format!("/sessions/{sid}/@reject"),
        Some(serde_json::json!({"note": "  "})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION_FAILED");
}
