use serde::{Deserialize, Serialize};

use crate::model::approval::ApprovalState;
use crate::model::entry::{GlueEvent, PressEntry};
use crate::model::pause::PauseEvent;
use crate::model::product::{ProductKey, StockRecord};

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// Lifecycle state of a press session.
///
/// ```text
/// RUNNING → PAUSED      → RUNNING (resume)
///         → MAINTENANCE → RUNNING (resume)
///         → STOPPED     (terminal)
/// ```
///
/// There is no OFF row: an operator with no session in an open status is
/// off the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Running,
    Paused,
    Maintenance,
    Stopped,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "RUNNING",
            Self::Paused => "PAUSED",
            Self::Maintenance => "MAINTENANCE",
            Self::Stopped => "STOPPED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(Self::Running),
            "PAUSED" => Some(Self::Paused),
            "MAINTENANCE" => Some(Self::Maintenance),
            "STOPPED" => Some(Self::Stopped),
            _ => None,
        }
    }

    /// Whether the session still occupies the machine.
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PressSession
// ---------------------------------------------------------------------------

/// One continuous operating run of the press by one operator.
///
/// Never deleted; stopped sessions are retained for audit and flow into
/// the review chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressSession {
    pub id: String,
    pub scope_id: String,
    pub operator_id: String,
    /// Calendar date of the shift, `YYYY-MM-DD`.
    pub shift_date: String,
    pub status: SessionStatus,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<String>,
    /// Configured batch size per load.
    pub daylights: i64,
    /// Currently selected product; copied onto each entry at load time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<ProductKey>,
    /// The entry currently in the press, if any. Updated in the same
    /// transaction as entry creation/closure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_entry_id: Option<String>,
    /// The pause/maintenance interval currently open, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_pause_id: Option<String>,
    #[serde(default)]
    pub approval: ApprovalState,
    pub created_at: String,
    pub updated_at: String,
}

// ---------------------------------------------------------------------------
// API request / query types
// ---------------------------------------------------------------------------

/// Body for `POST /sessions` — start a session.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    /// Batch size; defaults to 10 when omitted.
    #[serde(default)]
    pub daylights: Option<i64>,
}

/// Body for `POST /sessions/{id}/@product`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectProductRequest {
    pub category_id: String,
    pub thickness_id: String,
    pub size_id: String,
}

impl SelectProductRequest {
    pub fn key(&self) -> ProductKey {
        ProductKey::new(&self.category_id, &self.thickness_id, &self.size_id)
    }
}

/// Body for `POST /sessions/{id}/@daylights`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDaylightsRequest {
    pub daylights: i64,
}

/// Body for `POST /sessions/{id}/@pause` and `@maintenance`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Query parameters for `GET /sessions` (history).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHistoryQuery {
    /// Inclusive shift-date lower bound, `YYYY-MM-DD`.
    #[serde(default)]
    pub from: Option<String>,
    /// Inclusive shift-date upper bound, `YYYY-MM-DD`.
    #[serde(default)]
    pub to: Option<String>,
    /// Filter by review-chain status.
    #[serde(default)]
    pub approval: Option<String>,
    /// Filter by operator. Operators are always pinned to themselves.
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

/// A session with its full ledgers, as shown on the operator board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    pub session: PressSession,
    pub entries: Vec<PressEntry>,
    pub glue_events: Vec<GlueEvent>,
    pub pauses: Vec<PauseEvent>,
}

/// Everything the operator screen needs in one call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorBoard {
    /// The caller's open session, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<SessionDetail>,
    /// The caller's sessions stopped today.
    pub stopped_today: Vec<PressSession>,
    /// Active products available for selection.
    pub products: Vec<StockRecord>,
}

/// One entry with its derived timings, in load order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryReport {
    pub entry: PressEntry,
    /// unload − load, seconds. None while the entry is open.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cook_secs: Option<i64>,
    /// this.load − previous.unload, seconds. None for the first entry or
    /// when the previous entry never unloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooling_gap_secs: Option<i64>,
    /// Cumulative completed COOK quantity for this entry's
    /// (thickness, size) up to and including this entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub running_total: Option<i64>,
}

/// Completed COOK production for one (thickness, size).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductTotal {
    pub thickness_id: String,
    pub size_id: String,
    pub quantity: i64,
}

/// Derived-value summary for one session. Computed, never stored.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub session: PressSession,
    pub entries: Vec<EntryReport>,
    /// Completed COOK totals per (thickness, size).
    pub totals: Vec<ProductTotal>,
    pub glue_barrels: i64,
    pub pause_secs: i64,
    pub maintenance_secs: i64,
    pub cook_count: i64,
    pub repress_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in &[
            SessionStatus::Running,
            SessionStatus::Paused,
            SessionStatus::Maintenance,
            SessionStatus::Stopped,
        ] {
            let json = serde_json::to_string(s).unwrap();
            let back: SessionStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(*s, back);
            assert_eq!(SessionStatus::from_str(s.as_str()), Some(*s));
        }
    }

    #[test]
    fn open_statuses() {
        assert!(SessionStatus::Running.is_open());
        assert!(SessionStatus::Paused.is_open());
        assert!(SessionStatus::Maintenance.is_open());
        assert!(!SessionStatus::Stopped.is_open());
    }

    #[test]
    fn session_json_roundtrip() {
        let session = PressSession {
            id: "s1".into(),
            scope_id: "plant1".into(),
            operator_id: "op1".into(),
            shift_date: "2026-03-01".into(),
            status: SessionStatus::Running,
            start_time: "2026-03-01T08:00:00+00:00".into(),
            stop_time: None,
            daylights: 10,
            product: Some(ProductKey::new("c1", "t1", "s1")),
            open_entry_id: Some("e1".into()),
            open_pause_id: None,
            approval: ApprovalState::default(),
            created_at: "2026-03-01T08:00:00+00:00".into(),
            updated_at: "2026-03-01T08:00:00+00:00".into(),
        };
        let json = serde_json::to_string(&session).unwrap();
        let back: PressSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, "s1");
        assert_eq!(back.status, SessionStatus::Running);
        assert_eq!(back.open_entry_id.as_deref(), Some("e1"));
        // Absent options stay out of the JSON.
        assert!(!json.contains("\"stopTime\""));
        assert!(!json.contains("\"openPauseId\""));
    }

    #[test]
    fn start_request_defaults() {
        let req: StartSessionRequest = serde_json::from_str("{}").unwrap();
        assert!(req.daylights.is_none());
    }

    #[test]
    fn history_query_deserialize() {
        let q: SessionHistoryQuery = serde_json::from_str(
            r#"{"from":"2026-03-01","approval":"SUBMITTED","pageSize":20}"#,
        )
        .unwrap();
        assert_eq!(q.from.as_deref(), Some("2026-03-01"));
        assert_eq!(q.approval.as_deref(), Some("SUBMITTED"));
        assert_eq!(q.page_size, Some(20));
        assert!(q.page.is_none());
    }
}
