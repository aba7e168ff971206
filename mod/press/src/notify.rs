//! Outbound notification contract.
//!
//! The module emits events describing who should be told what; storing or
//! delivering them is an external concern. The daemon installs a
//! tracing-backed sink, tests install a recording one.

use std::sync::Mutex;

use serde::Serialize;

use plyworks_core::Role;

/// What happened to the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Submitted,
    SupervisorApproved,
    ManagerApproved,
    Rejected,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::SupervisorApproved => "SUPERVISOR_APPROVED",
            Self::ManagerApproved => "MANAGER_APPROVED",
            Self::Rejected => "REJECTED",
        }
    }
}

/// Who should see the event: everyone holding a role in the scope, or one
/// specific user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Audience {
    Role(Role),
    User(String),
}

/// The unit the event is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitRef {
    Session(String),
    DailyLog(String),
}

/// One outbound event.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub scope_id: String,
    pub audience: Audience,
    pub unit: UnitRef,
    pub title: String,
    pub body: String,
}

/// Sink for outbound events. Fire-and-forget; delivery failures are the
/// sink's problem, not the workflow's.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: Notification);
}

/// Sink that logs each event. The daemon default.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, event: Notification) {
        tracing::info!(
            kind = event.kind.as_str(),
            scope = %event.scope_id,
            audience = ?event.audience,
            unit = ?event.unit,
            title = %event.title,
            "notification"
        );
    }
}

/// Sink that records events in memory. Used for testing.
#[derive(Default)]
pub struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain all recorded events.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for MemoryNotifier {
    fn notify(&self, event: Notification) {
        self.events.lock().unwrap().push(event);
    }
}
