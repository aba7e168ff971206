use serde::{Deserialize, Serialize};

use crate::model::session::SessionStatus;

/// Why the press is not producing: a short break or scheduled maintenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PauseKind {
    Pause,
    Maintenance,
}

impl PauseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pause => "PAUSE",
            Self::Maintenance => "MAINTENANCE",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PAUSE" => Some(Self::Pause),
            "MAINTENANCE" => Some(Self::Maintenance),
            _ => None,
        }
    }

    /// Session status while an interval of this kind is open.
    pub fn session_status(&self) -> SessionStatus {
        match self {
            Self::Pause => SessionStatus::Paused,
            Self::Maintenance => SessionStatus::Maintenance,
        }
    }
}

impl std::fmt::Display for PauseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One interval of non-production time within a session.
///
/// `end_time = None` means the interval is still open; at most one open
/// interval exists per session (the session's `open_pause_id`). Stop
/// force-closes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseEvent {
    pub id: String,
    pub session_id: String,
    pub kind: PauseKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub start_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

impl PauseEvent {
    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }
}
