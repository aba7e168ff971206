//! Review chain: submit, supervisor approval, manager approval, reject.
//!
//! One engine drives both sessions and daily logs. Role capability and
//! status transition are checked here, at the workflow boundary; the
//! HTTP handlers never re-check roles. Every status move is a
//! conditional UPDATE on the mirrored `approval_status` column, and
//! manager approval combines the CAS with the stock increments in one
//! transaction.

use std::collections::BTreeMap;

use tracing::info;

use plyworks_core::{Actor, Role};
use plyworks_sql::Value;

use crate::error::PressError;
use crate::model::{
    ApprovalAction, ApprovalState, ApprovalStatus, ApproveRequest, DailyLog, PressEntry,
    PressSession, ProductKey, ProductionEntry, RejectRequest, SessionStatus, Signoff,
};
use crate::notify::{Audience, Notification, NotificationKind, UnitRef};
use crate::service::{
    ensure_scope, get_doc_tx, parse_rows, session_indexes, update_doc_if_approval_tx,
    PressService,
};

/// Compute the review state after `action`, or the error that forbids it.
pub(crate) fn next_approval_state(
    current: &ApprovalState,
    action: ApprovalAction,
    actor: &Actor,
    note: Option<String>,
    now: &str,
) -> Result<ApprovalState, PressError> {
    if !action.allows(actor.role) {
        return Err(PressError::Unauthorized(format!(
            "role {} cannot {}",
            actor.role.as_str(),
            action.as_str()
        )));
    }
    let target = action.target_status();
    if !current.status.can_transition(target) {
        return Err(PressError::InvalidApprovalState {
            action: action.as_str(),
            status: current.status.to_string(),
        });
    }

    let mut next = current.clone();
    next.status = target;
    let signoff = Signoff {
        actor_id: actor.id.clone(),
        at: now.to_string(),
        note,
    };
    match action {
        ApprovalAction::Submit => {
            // re-submission starts the chain over
            next.submitted_at = Some(now.to_string());
            next.supervisor = None;
            next.manager = None;
            next.rejection = None;
        }
        ApprovalAction::SupervisorApprove => next.supervisor = Some(signoff),
        ApprovalAction::ManagerApprove => next.manager = Some(signoff),
        ApprovalAction::Reject => next.rejection = Some(signoff),
    }
    Ok(next)
}

/// The approval status feeding a reviewer's queue.
fn review_queue_status(role: Role) -> Result<ApprovalStatus, PressError> {
    match role {
        Role::Supervisor => Ok(ApprovalStatus::Submitted),
        Role::Manager | Role::Owner => Ok(ApprovalStatus::SupervisorApproved),
        Role::Operator => Err(PressError::Unauthorized(
            "operators have no review queue".into(),
        )),
    }
}

impl PressService {
    // -----------------------------------------------------------------------
    // Session review chain
    // -----------------------------------------------------------------------

    /// Submit a stopped session for review. Owning operator only.
    pub fn submit_session(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> Result<PressSession, PressError> {
        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_scope(actor, &s.scope_id, &format!("press_sessions/{session_id}"))?;
            if s.operator_id != actor.id {
                return Err(PressError::Unauthorized(
                    "only the owning operator may submit".into(),
                ));
            }
            if s.status != SessionStatus::Stopped {
                return Err(PressError::InvalidTransition {
                    action: "submit",
                    status: s.status.to_string(),
                });
            }
            let prev = s.approval.status;
            s.approval = next_approval_state(&s.approval, ApprovalAction::Submit, actor, None, &now)?;
            s.updated_at = now.clone();
            if !update_doc_if_approval_tx(
                tx,
                "press_sessions",
                &s.id,
                &s,
                &session_indexes(&s),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: "submit",
                    status: prev.to_string(),
                });
            }
            Ok(s)
        })?;

        self.notifier.notify(Notification {
            kind: NotificationKind::Submitted,
            scope_id: updated.scope_id.clone(),
            audience: Audience::Role(Role::Supervisor),
            unit: UnitRef::Session(updated.id.clone()),
            title: "press session submitted".into(),
            body: format!(
                "session {} by {} awaits supervisor review",
                updated.id, updated.operator_id
            ),
        });
        info!(session = %updated.id, "session submitted for review");
        Ok(updated)
    }

    /// First-stage approval.
    pub fn supervisor_approve_session(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &ApproveRequest,
    ) -> Result<PressSession, PressError> {
        let updated = self.advance_session_review(
            actor,
            session_id,
            ApprovalAction::SupervisorApprove,
            req.note.clone(),
        )?;
        self.notifier.notify(Notification {
            kind: NotificationKind::SupervisorApproved,
            scope_id: updated.scope_id.clone(),
            audience: Audience::Role(Role::Manager),
            unit: UnitRef::Session(updated.id.clone()),
            title: "press session supervisor-approved".into(),
            body: format!("session {} awaits manager review", updated.id),
        });
        Ok(updated)
    }

    /// Send a session back to its operator. The note is mandatory.
    pub fn reject_session(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &RejectRequest,
    ) -> Result<PressSession, PressError> {
        if req.note.trim().is_empty() {
            return Err(PressError::Validation("rejection note required".into()));
        }
        let updated = self.advance_session_review(
            actor,
            session_id,
            ApprovalAction::Reject,
            Some(req.note.clone()),
        )?;
        self.notifier.notify(Notification {
            kind: NotificationKind::Rejected,
            scope_id: updated.scope_id.clone(),
            audience: Audience::User(updated.operator_id.clone()),
            unit: UnitRef::Session(updated.id.clone()),
            title: "press session rejected".into(),
            body: req.note.clone(),
        });
        Ok(updated)
    }

    /// Final approval. Reads the session's completed COOK entries,
    /// aggregates them per product, and applies the stock increments in
    /// the same transaction that moves the status. A lost status race
    /// or a missing stock row rolls everything back.
    pub fn manager_approve_session(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &ApproveRequest,
    ) -> Result<PressSession, PressError> {
        let now = self.clock.now_rfc3339();
        let mut applied: BTreeMap<ProductKey, i64> = BTreeMap::new();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_scope(actor, &s.scope_id, &format!("press_sessions/{session_id}"))?;
            let prev = s.approval.status;
            s.approval = next_approval_state(
                &s.approval,
                ApprovalAction::ManagerApprove,
                actor,
                req.note.clone(),
                &now,
            )?;

            let entries: Vec<PressEntry> = parse_rows(&tx.query(
                "SELECT data FROM press_entries WHERE session_id = ?1 \
                 AND kind = 'COOK' AND unload_time IS NOT NULL",
                &[Value::Text(s.id.clone())],
            )?)?;
            applied = BTreeMap::new();
            for entry in &entries {
                *applied.entry(entry.product.clone()).or_insert(0) += entry.quantity;
            }
            super::stock::apply_production_tx(tx, &s.scope_id, &applied, &now)?;

            s.updated_at = now.clone();
            if !update_doc_if_approval_tx(
                tx,
                "press_sessions",
                &s.id,
                &s,
                &session_indexes(&s),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: "managerApprove",
                    status: prev.to_string(),
                });
            }
            Ok(s)
        })?;

        self.notifier.notify(Notification {
            kind: NotificationKind::ManagerApproved,
            scope_id: updated.scope_id.clone(),
            audience: Audience::User(updated.operator_id.clone()),
            unit: UnitRef::Session(updated.id.clone()),
            title: "press session approved".into(),
            body: format!("session {} is fully approved", updated.id),
        });
        info!(
            session = %updated.id,
            products = applied.len(),
            "session manager-approved, stock applied"
        );
        Ok(updated)
    }

    /// Shared move for the single-document review steps.
    fn advance_session_review(
        &self,
        actor: &Actor,
        session_id: &str,
        action: ApprovalAction,
        note: Option<String>,
    ) -> Result<PressSession, PressError> {
        let now = self.clock.now_rfc3339();
        self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_scope(actor, &s.scope_id, &format!("press_sessions/{session_id}"))?;
            let prev = s.approval.status;
            s.approval = next_approval_state(&s.approval, action, actor, note.clone(), &now)?;
            s.updated_at = now.clone();
            if !update_doc_if_approval_tx(
                tx,
                "press_sessions",
                &s.id,
                &s,
                &session_indexes(&s),
                prev,
            )? {
                return Err(PressError::InvalidApprovalState {
                    action: action.as_str(),
                    status: prev.to_string(),
                });
            }
            Ok(s)
        })
    }

    // -----------------------------------------------------------------------
    // Review queues
    // -----------------------------------------------------------------------

    /// Stopped sessions waiting at the caller's review stage, oldest first.
    pub fn pending_sessions(&self, actor: &Actor) -> Result<Vec<PressSession>, PressError> {
        let status = review_queue_status(actor.role)?;
        parse_rows(&self.db.query(
            "SELECT data FROM press_sessions WHERE scope_id = ?1 \
             AND status = 'STOPPED' AND approval_status = ?2 \
             ORDER BY created_at ASC",
            &[
                Value::Text(actor.scope_id.clone()),
                Value::Text(status.as_str().to_string()),
            ],
        )?)
    }

    /// Daily logs waiting at the caller's review stage, oldest first.
    pub fn pending_daily_logs(&self, actor: &Actor) -> Result<Vec<DailyLog>, PressError> {
        let status = review_queue_status(actor.role)?;
        parse_rows(&self.db.query(
            "SELECT data FROM daily_logs WHERE scope_id = ?1 \
             AND approval_status = ?2 ORDER BY created_at ASC",
            &[
                Value::Text(actor.scope_id.clone()),
                Value::Text(status.as_str().to_string()),
            ],
        )?)
    }
}

/// Aggregate production entries per product for the stock increment.
pub(crate) fn aggregate_entries(entries: &[ProductionEntry]) -> BTreeMap<ProductKey, i64> {
    let mut totals = BTreeMap::new();
    for entry in entries {
        *totals.entry(entry.product.clone()).or_insert(0) += entry.quantity;
    }
    totals
}
