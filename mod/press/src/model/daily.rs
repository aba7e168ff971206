use serde::{Deserialize, Serialize};

use crate::model::approval::ApprovalState;
use crate::model::product::ProductKey;

// ---------------------------------------------------------------------------
// DailyLog
// ---------------------------------------------------------------------------

/// The per-day aggregation unit used where production is tracked as
/// discrete product entries rather than timed sessions.
///
/// One log per (scope, operator, date); the same row is reused across
/// rejection and re-submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: String,
    pub scope_id: String,
    pub operator_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub log_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub approval: ApprovalState,
    pub created_at: String,
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// ProductionEntry
// ---------------------------------------------------------------------------

/// One product/quantity line recorded by an operator during the day.
///
/// Unlinked (`daily_log_id = None`) until the day is submitted, at which
/// point all of the day's unlinked entries are linked to the log in the
/// same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionEntry {
    pub id: String,
    pub scope_id: String,
    pub operator_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub entry_date: String,
    pub product: ProductKey,
    pub quantity: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_log_id: Option<String>,
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// API request / query types
// ---------------------------------------------------------------------------

/// Body for `POST /production-entries`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductionEntryRequest {
    pub category_id: String,
    pub thickness_id: String,
    pub size_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
    /// Defaults to today.
    #[serde(default)]
    pub entry_date: Option<String>,
}

impl CreateProductionEntryRequest {
    pub fn key(&self) -> ProductKey {
        ProductKey::new(&self.category_id, &self.thickness_id, &self.size_id)
    }
}

/// Body for `POST /daily-logs/@submit`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitDailyLogRequest {
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Query parameters for `GET /production-entries`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayViewQuery {
    /// Defaults to today.
    #[serde(default)]
    pub date: Option<String>,
}

/// Query parameters for `GET /daily-logs`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogListQuery {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub approval: Option<String>,
    #[serde(default)]
    pub operator_id: Option<String>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

// ---------------------------------------------------------------------------
// View types
// ---------------------------------------------------------------------------

/// One operator-day: the log (if any) and its entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayView {
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log: Option<DailyLog>,
    pub entries: Vec<ProductionEntry>,
}

/// A daily log with its linked entries.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogDetail {
    pub log: DailyLog,
    pub entries: Vec<ProductionEntry>,
}
