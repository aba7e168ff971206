mod approvals;
mod daily;
mod entries;
mod sessions;
mod stock;

use std::sync::Arc;

use axum::Router;

use crate::service::PressService;

/// Shared handler state.
pub(crate) type PressState = Arc<PressService>;

/// Build the complete press module router.
///
/// All handlers expect an `Actor` request extension; the daemon's actor
/// middleware inserts it.
///
/// Routes:
/// - `POST   /sessions`                           — start session
/// - `GET    /sessions`                           — session history
/// - `GET    /sessions/{id}`                      — session with ledgers
/// - `GET    /sessions/{id}/@report`              — derived report
/// - `POST   /sessions/{id}/@product`             — select product
/// - `POST   /sessions/{id}/@daylights`           — set batch size
/// - `POST   /sessions/{id}/@load`                — load material
/// - `POST   /sessions/{id}/@glue`                — record glue barrels
/// - `POST   /sessions/{id}/@pause`               — open a pause
/// - `POST   /sessions/{id}/@maintenance`         — open maintenance
/// - `POST   /sessions/{id}/@resume`              — close the interval
/// - `POST   /sessions/{id}/@stop`                — stop session
/// - `POST   /sessions/{id}/@submit`              — submit for review
/// - `POST   /sessions/{id}/@supervisor-approve`  — first approval
/// - `POST   /sessions/{id}/@manager-approve`     — final approval + stock
/// - `POST   /sessions/{id}/@reject`              — reject with note
/// - `GET    /board`                              — operator board
/// - `POST   /entries/{id}/@unload`               — unload material
/// - `POST   /entries/{id}/@correct`              — correct an entry
/// - `POST   /production-entries`                 — record a day entry
/// - `GET    /production-entries`                 — day view
/// - `DELETE /production-entries/{id}`            — remove a day entry
/// - `POST   /daily-logs/@submit`                 — submit the day
/// - `GET    /daily-logs`                         — list daily logs
/// - `GET    /daily-logs/{id}`                    — log with entries
/// - `POST   /daily-logs/{id}/@supervisor-approve`— first approval
/// - `POST   /daily-logs/{id}/@manager-approve`   — final approval + stock
/// - `POST   /daily-logs/{id}/@reject`            — reject with note
/// - `GET    /approvals/sessions`                 — caller's session queue
/// - `GET    /approvals/daily-logs`               — caller's daily-log queue
/// - `GET    /stock`                              — list stock records
/// - `POST   /stock`                              — create stock record
/// - `POST   /stock/{id}/@activate`               — reactivate a record
/// - `POST   /stock/{id}/@deactivate`             — retire a record
pub fn router(service: Arc<PressService>) -> Router {
    Router::new()
        .merge(sessions::router(Arc::clone(&service)))
        .merge(entries::router(Arc::clone(&service)))
        .merge(daily::router(Arc::clone(&service)))
        .merge(approvals::router(Arc::clone(&service)))
        .merge(stock::router(service))
}
