use serde::{Deserialize, Serialize};

use crate::model::product::ProductKey;

// ---------------------------------------------------------------------------
// EntryKind
// ---------------------------------------------------------------------------

/// COOK is a first pass and counts toward production totals; REPRESS is a
/// rework pass, tracked but never applied to stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    #[default]
    Cook,
    Repress,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cook => "COOK",
            Self::Repress => "REPRESS",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "COOK" => Some(Self::Cook),
            "REPRESS" => Some(Self::Repress),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// PressEntry
// ---------------------------------------------------------------------------

/// One load→unload cycle of material through the press.
///
/// `unload_time = None` means the material is still in the press. At most
/// one such entry exists per session; the session's `open_entry_id` is the
/// structural handle to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressEntry {
    pub id: String,
    pub session_id: String,
    pub kind: EntryKind,
    /// Product descriptor, copied from the session at load time.
    pub product: ProductKey,
    pub quantity: i64,
    pub load_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unload_time: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl PressEntry {
    pub fn is_open(&self) -> bool {
        self.unload_time.is_none()
    }
}

// ---------------------------------------------------------------------------
// GlueEvent
// ---------------------------------------------------------------------------

/// Append-only record of glue barrels added during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlueEvent {
    pub id: String,
    pub session_id: String,
    pub time: String,
    pub barrels: i64,
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Body for `POST /sessions/{id}/@load`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    /// Defaults to COOK.
    #[serde(default)]
    pub kind: EntryKind,
}

/// Body for `POST /entries/{id}/@unload`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnloadRequest {
    /// Overrides the entry's quantity when the physical output differs
    /// from the configured batch size.
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Body for `POST /entries/{id}/@correct` — post-hoc correction, allowed
/// until the owning session is manager-approved.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectEntryRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub product: Option<ProductKey>,
}

/// Body for `POST /sessions/{id}/@glue`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlueRequest {
    /// Defaults to one barrel.
    #[serde(default = "default_barrels")]
    pub barrels: i64,
}

fn default_barrels() -> i64 {
    1
}

impl Default for GlueRequest {
    fn default() -> Self {
        Self {
            barrels: default_barrels(),
        }
    }
}
