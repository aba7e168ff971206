pub mod api;
pub mod error;
pub mod model;
pub mod notify;
pub mod service;

use std::sync::Arc;

use axum::Router;

use plyworks_core::{Clock, Module};
use plyworks_sql::SQLStore;

use notify::Notifier;
use service::PressService;

/// The Press module — hot-press floor tracking.
///
/// Covers the session state machine, the entry/pause/glue ledgers, daily
/// production logs, the three-stage review chain, and the stock ledger
/// the final approval feeds.
pub struct PressModule {
    service: Arc<PressService>,
}

impl PressModule {
    /// Create the press module and initialise its tables.
    pub fn new(
        db: Arc<dyn SQLStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, error::PressError> {
        let service = Arc::new(PressService::new(db, clock, notifier)?);
        Ok(Self { service })
    }

    /// Get a reference to the service for programmatic use.
    pub fn service(&self) -> &Arc<PressService> {
        &self.service
    }
}

impl Module for PressModule {
    fn name(&self) -> &str {
        "press"
    }

    fn routes(&self) -> Router {
        api::router(Arc::clone(&self.service))
    }
}
