use serde::{Deserialize, Serialize};

use plyworks_core::Role;

// ---------------------------------------------------------------------------
// ApprovalStatus
// ---------------------------------------------------------------------------

/// Stage of the three-step review chain.
///
/// ```text
/// DRAFT → SUBMITTED → SUPERVISOR_APPROVED → MANAGER_APPROVED
///              ↓              ↓
///           REJECTED ←────────┘
///              ↓ (re-submit)
///           SUBMITTED
/// ```
///
/// MANAGER_APPROVED is terminal. REJECTED is terminal until the owner
/// re-submits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Draft,
    Submitted,
    SupervisorApproved,
    ManagerApproved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Submitted => "SUBMITTED",
            Self::SupervisorApproved => "SUPERVISOR_APPROVED",
            Self::ManagerApproved => "MANAGER_APPROVED",
            Self::Rejected => "REJECTED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "DRAFT" => Some(Self::Draft),
            "SUBMITTED" => Some(Self::Submitted),
            "SUPERVISOR_APPROVED" => Some(Self::SupervisorApproved),
            "MANAGER_APPROVED" => Some(Self::ManagerApproved),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Whether a transition from `self` to `to` is in the closed table of
    /// legal moves. Everything not listed here is rejected.
    pub fn can_transition(&self, to: ApprovalStatus) -> bool {
        matches!(
            (self, to),
            (Self::Draft, Self::Submitted)
                | (Self::Submitted, Self::SupervisorApproved)
                | (Self::SupervisorApproved, Self::ManagerApproved)
                | (Self::Submitted, Self::Rejected)
                | (Self::SupervisorApproved, Self::Rejected)
                | (Self::Rejected, Self::Submitted)
        )
    }

    /// Whether the owning unit may still be edited (entries added, removed,
    /// quantities corrected).
    pub fn is_editable(&self) -> bool {
        matches!(self, Self::Draft | Self::Rejected)
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ApprovalAction: the capability table
// ---------------------------------------------------------------------------

/// One action against the review chain, with the roles allowed to take it.
///
/// Checked once at the workflow boundary; handlers never re-check roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Submit,
    SupervisorApprove,
    ManagerApprove,
    Reject,
}

impl ApprovalAction {
    /// Roles permitted to take this action.
    pub fn allowed_roles(&self) -> &'static [Role] {
        match self {
            Self::Submit => &[Role::Operator],
            Self::SupervisorApprove => &[Role::Supervisor, Role::Manager, Role::Owner],
            Self::ManagerApprove => &[Role::Manager, Role::Owner],
            Self::Reject => &[Role::Supervisor, Role::Manager, Role::Owner],
        }
    }

    pub fn allows(&self, role: Role) -> bool {
        self.allowed_roles().contains(&role)
    }

    /// The status this action moves the unit to.
    pub fn target_status(&self) -> ApprovalStatus {
        match self {
            Self::Submit => ApprovalStatus::Submitted,
            Self::SupervisorApprove => ApprovalStatus::SupervisorApproved,
            Self::ManagerApprove => ApprovalStatus::ManagerApproved,
            Self::Reject => ApprovalStatus::Rejected,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::SupervisorApprove => "supervisorApprove",
            Self::ManagerApprove => "managerApprove",
            Self::Reject => "reject",
        }
    }
}

// ---------------------------------------------------------------------------
// ApprovalState: embedded in sessions and daily logs
// ---------------------------------------------------------------------------

/// One actor's decision: who, when, and an optional note.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Signoff {
    pub actor_id: String,
    pub at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Full review-chain state embedded in the unit's JSON document.
///
/// The status is mirrored into an indexed SQL column for queue queries
/// and conditional updates; this struct is the source of truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalState {
    pub status: ApprovalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor: Option<Signoff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<Signoff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Signoff>,
}

impl Default for ApprovalState {
    fn default() -> Self {
        Self {
            status: ApprovalStatus::Draft,
            submitted_at: None,
            supervisor: None,
            manager: None,
            rejection: None,
        }
    }
}

// ---------------------------------------------------------------------------
// API request types
// ---------------------------------------------------------------------------

/// Body for `@supervisor-approve` and `@manager-approve`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveRequest {
    #[serde(default)]
    pub note: Option<String>,
}

/// Body for `@reject`. The note is mandatory so the operator knows what
/// to fix.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectRequest {
    pub note: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_roundtrip() {
        for s in &[
            ApprovalStatus::Draft,
            ApprovalStatus::Submitted,
            ApprovalStatus::SupervisorApproved,
            ApprovalStatus::ManagerApproved,
            ApprovalStatus::Rejected,
        ] {
            let json = serde_json::to_string(s).unwrap();
            let back: ApprovalStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(*s, back);
            assert_eq!(ApprovalStatus::from_str(s.as_str()), Some(*s));
        }
    }

    #[test]
    fn transition_table_is_closed() {
        use ApprovalStatus::*;
        let all = [Draft, Submitted, SupervisorApproved, ManagerApproved, Rejected];
        let legal = [
            (Draft, Submitted),
            (Submitted, SupervisorApproved),
            (SupervisorApproved, ManagerApproved),
            (Submitted, Rejected),
            (SupervisorApproved, Rejected),
            (Rejected, Submitted),
        ];
        for from in all {
            for to in all {
                let expect = legal.contains(&(from, to));
                assert_eq!(
                    from.can_transition(to),
                    expect,
                    "transition {from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn manager_approved_is_terminal() {
        use ApprovalStatus::*;
        for to in [Draft, Submitted, SupervisorApproved, ManagerApproved, Rejected] {
            assert!(!ManagerApproved.can_transition(to));
        }
    }

    #[test]
    fn capability_table() {
        use plyworks_core::Role::*;
        assert!(ApprovalAction::Submit.allows(Operator));
        assert!(!ApprovalAction::Submit.allows(Supervisor));

        assert!(ApprovalAction::SupervisorApprove.allows(Supervisor));
        assert!(ApprovalAction::SupervisorApprove.allows(Owner));
        assert!(!ApprovalAction::SupervisorApprove.allows(Operator));

        assert!(!ApprovalAction::ManagerApprove.allows(Supervisor));
        assert!(ApprovalAction::ManagerApprove.allows(Manager));
        assert!(ApprovalAction::ManagerApprove.allows(Owner));

        assert!(ApprovalAction::Reject.allows(Supervisor));
        assert!(!ApprovalAction::Reject.allows(Operator));
    }

    #[test]
    fn editable_states() {
        assert!(ApprovalStatus::Draft.is_editable());
        assert!(ApprovalStatus::Rejected.is_editable());
        assert!(!ApprovalStatus::Submitted.is_editable());
        assert!(!ApprovalStatus::SupervisorApproved.is_editable());
        assert!(!ApprovalStatus::ManagerApproved.is_editable());
    }

    #[test]
    fn approval_state_default_json() {
        let state = ApprovalState::default();
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"status":"DRAFT"}"#);
    }
}
