//! Session lifecycle: start, product/batch configuration, pause,
//! maintenance, resume, stop, glue, and the session query surfaces.

use tracing::info;

use plyworks_core::{new_id, Actor, ListResult, Role};
use plyworks_sql::Value;

use crate::error::PressError;
use crate::model::{
    ApprovalState, ApprovalStatus, GlueEvent, GlueRequest, OperatorBoard, PauseEvent, PauseKind,
    PauseRequest, PressSession, SelectProductRequest, SessionDetail, SessionHistoryQuery,
    SessionStatus, SetDaylightsRequest, StartSessionRequest,
};
use crate::service::{
    corrupted, ensure_session_owner, get_doc_tx, glue_indexes, insert_doc_tx, parse_data,
    parse_rows, pause_indexes, session_indexes, update_doc_tx, validate_date, PressService,
};

/// Batch size used when a session is started without one.
pub const DEFAULT_DAYLIGHTS: i64 = 10;

const DEFAULT_PAGE_SIZE: usize = 20;
const MAX_PAGE_SIZE: usize = 100;

impl PressService {
    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a session for the acting operator.
    ///
    /// Fails with `AlreadyRunning` if the operator already has a session
    /// in an open status; the partial unique index backstops the check.
    pub fn start_session(
        &self,
        actor: &Actor,
        req: &StartSessionRequest,
    ) -> Result<PressSession, PressError> {
        if actor.role != Role::Operator {
            return Err(PressError::Unauthorized(format!(
                "role {} cannot operate the press",
                actor.role.as_str()
            )));
        }
        let daylights = req.daylights.unwrap_or(DEFAULT_DAYLIGHTS);
        if daylights <= 0 {
            return Err(PressError::Validation("daylights must be positive".into()));
        }

        let now = self.clock.now_rfc3339();
        let session = PressSession {
            id: new_id(),
            scope_id: actor.scope_id.clone(),
            operator_id: actor.id.clone(),
            shift_date: self.clock.today(),
            status: SessionStatus::Running,
            start_time: now.clone(),
            stop_time: None,
            daylights,
            product: None,
            open_entry_id: None,
            open_pause_id: None,
            approval: ApprovalState::default(),
            created_at: now.clone(),
            updated_at: now,
        };

        let created = self.run_tx(|tx| {
            let open = tx.query(
                "SELECT id FROM press_sessions WHERE scope_id = ?1 AND operator_id = ?2 \
                 AND status IN ('RUNNING','PAUSED','MAINTENANCE')",
                &[
                    Value::Text(actor.scope_id.clone()),
                    Value::Text(actor.id.clone()),
                ],
            )?;
            if !open.is_empty() {
                return Err(PressError::AlreadyRunning(actor.id.clone()));
            }
            match insert_doc_tx(
                tx,
                "press_sessions",
                &session.id,
                &session,
                &session_indexes(&session),
            ) {
                Ok(()) => Ok(session.clone()),
                Err(PressError::Conflict(_)) => Err(PressError::AlreadyRunning(actor.id.clone())),
                Err(e) => Err(e),
            }
        })?;

        info!(
            session = %created.id,
            operator = %created.operator_id,
            daylights = created.daylights,
            "press session started"
        );
        Ok(created)
    }

    /// Select the product for subsequent loads. Allowed in any open
    /// status; does not touch an already-open entry.
    pub fn select_product(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &SelectProductRequest,
    ) -> Result<PressSession, PressError> {
        let key = req.key();
        if key.category_id.is_empty() || key.thickness_id.is_empty() || key.size_id.is_empty() {
            return Err(PressError::Validation(
                "product descriptor must be fully specified".into(),
            ));
        }

        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if !s.status.is_open() {
                return Err(PressError::InvalidTransition {
                    action: "selectProduct",
                    status: s.status.to_string(),
                });
            }
            if !self.product_is_active_tx(tx, &s.scope_id, &key)? {
                return Err(PressError::UnknownProduct(key.label()));
            }
            s.product = Some(key.clone());
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(s)
        })?;

        info!(session = %updated.id, product = %key.label(), "product selected");
        Ok(updated)
    }

    /// Set the configured batch size. Allowed in any open status.
    pub fn set_daylights(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &SetDaylightsRequest,
    ) -> Result<PressSession, PressError> {
        if req.daylights <= 0 {
            return Err(PressError::Validation("daylights must be positive".into()));
        }
        let now = self.clock.now_rfc3339();
        self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if !s.status.is_open() {
                return Err(PressError::InvalidTransition {
                    action: "setDaylights",
                    status: s.status.to_string(),
                });
            }
            s.daylights = req.daylights;
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(s)
        })
    }

    /// Open a pause or maintenance interval. Requires RUNNING.
    pub fn pause_session(
        &self,
        actor: &Actor,
        session_id: &str,
        kind: PauseKind,
        req: &PauseRequest,
    ) -> Result<PressSession, PressError> {
        let action = match kind {
            PauseKind::Pause => "pause",
            PauseKind::Maintenance => "maintenance",
        };
        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if s.status != SessionStatus::Running {
                return Err(PressError::InvalidTransition {
                    action,
                    status: s.status.to_string(),
                });
            }
            if s.open_pause_id.is_some() {
                return Err(corrupted(format!(
                    "session {} is RUNNING with an open pause",
                    s.id
                )));
            }
            let pause = PauseEvent {
                id: new_id(),
                session_id: s.id.clone(),
                kind,
                note: req.note.clone(),
                start_time: now.clone(),
                end_time: None,
            };
            insert_doc_tx(tx, "pause_events", &pause.id, &pause, &pause_indexes(&pause))?;
            s.status = kind.session_status();
            s.open_pause_id = Some(pause.id.clone());
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(s)
        })?;

        info!(session = %updated.id, kind = kind.as_str(), "press paused");
        Ok(updated)
    }

    /// Close the open interval and return to RUNNING.
    pub fn resume_session(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> Result<PressSession, PressError> {
        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if !matches!(
                s.status,
                SessionStatus::Paused | SessionStatus::Maintenance
            ) {
                return Err(PressError::InvalidTransition {
                    action: "resume",
                    status: s.status.to_string(),
                });
            }
            let pause_id = s.open_pause_id.clone().ok_or_else(|| {
                corrupted(format!(
                    "session {} is {} with no open pause",
                    s.id, s.status
                ))
            })?;
            close_pause_tx(tx, &pause_id, &now)?;
            s.status = SessionStatus::Running;
            s.open_pause_id = None;
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(s)
        })?;

        info!(session = %updated.id, "press resumed");
        Ok(updated)
    }

    /// Stop the session. Force-closes an open pause; a dangling open
    /// entry is left as-is and excluded from completed totals.
    pub fn stop_session(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> Result<PressSession, PressError> {
        let now = self.clock.now_rfc3339();
        let updated = self.run_tx(|tx| {
            let mut s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            if !s.status.is_open() {
                return Err(PressError::InvalidTransition {
                    action: "stop",
                    status: s.status.to_string(),
                });
            }
            if let Some(pause_id) = s.open_pause_id.take() {
                close_pause_tx(tx, &pause_id, &now)?;
            }
            s.status = SessionStatus::Stopped;
            s.stop_time = Some(now.clone());
            s.updated_at = now.clone();
            update_doc_tx(tx, "press_sessions", &s.id, &s, &session_indexes(&s))?;
            Ok(s)
        })?;

        info!(
            session = %updated.id,
            operator = %updated.operator_id,
            "press session stopped"
        );
        Ok(updated)
    }

    /// Append a glue event. No lifecycle precondition beyond the session
    /// existing and belonging to the actor.
    pub fn add_glue(
        &self,
        actor: &Actor,
        session_id: &str,
        req: &GlueRequest,
    ) -> Result<GlueEvent, PressError> {
        if req.barrels <= 0 {
            return Err(PressError::Validation("barrels must be positive".into()));
        }
        let now = self.clock.now_rfc3339();
        self.run_tx(|tx| {
            let s: PressSession = get_doc_tx(tx, "press_sessions", session_id)?;
            ensure_session_owner(actor, &s)?;
            let glue = GlueEvent {
                id: new_id(),
                session_id: s.id.clone(),
                time: now.clone(),
                barrels: req.barrels,
            };
            insert_doc_tx(tx, "glue_events", &glue.id, &glue, &glue_indexes(&glue))?;
            Ok(glue)
        })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// The operator's session in an open status, if any.
    pub fn active_session(
        &self,
        scope_id: &str,
        operator_id: &str,
    ) -> Result<Option<PressSession>, PressError> {
        let rows = self.db.query(
            "SELECT data FROM press_sessions WHERE scope_id = ?1 AND operator_id = ?2 \
             AND status IN ('RUNNING','PAUSED','MAINTENANCE')",
            &[
                Value::Text(scope_id.to_string()),
                Value::Text(operator_id.to_string()),
            ],
        )?;
        match rows.first() {
            Some(row) => Ok(Some(parse_data(row)?)),
            None => Ok(None),
        }
    }

    /// A session with its full ledgers.
    pub fn session_detail(
        &self,
        actor: &Actor,
        session_id: &str,
    ) -> Result<SessionDetail, PressError> {
        let session: PressSession = self.fetch_doc("press_sessions", session_id)?;
        if session.scope_id != actor.scope_id {
            return Err(PressError::NotFound(format!("press_sessions/{session_id}")));
        }
        if actor.role == Role::Operator && session.operator_id != actor.id {
            return Err(PressError::Unauthorized(format!(
                "session {session_id} belongs to another operator"
            )));
        }
        self.assemble_detail(session)
    }

    pub(crate) fn assemble_detail(
        &self,
        session: PressSession,
    ) -> Result<SessionDetail, PressError> {
        let sid = Value::Text(session.id.clone());
        let entries = parse_rows(&self.db.query(
            "SELECT data FROM press_entries WHERE session_id = ?1 \
             ORDER BY load_time ASC, created_at ASC",
            &[sid.clone()],
        )?)?;
        let glue_events = parse_rows(&self.db.query(
            "SELECT data FROM glue_events WHERE session_id = ?1 ORDER BY time ASC",
            &[sid.clone()],
        )?)?;
        let pauses = parse_rows(&self.db.query(
            "SELECT data FROM pause_events WHERE session_id = ?1 ORDER BY start_time ASC",
            &[sid],
        )?)?;
        Ok(SessionDetail {
            session,
            entries,
            glue_events,
            pauses,
        })
    }

    /// Everything the operator screen needs in one call.
    pub fn operator_board(&self, actor: &Actor) -> Result<OperatorBoard, PressError> {
        if actor.role != Role::Operator {
            return Err(PressError::Unauthorized(format!(
                "role {} has no operator board",
                actor.role.as_str()
            )));
        }
        let active = match self.active_session(&actor.scope_id, &actor.id)? {
            Some(s) => Some(self.assemble_detail(s)?),
            None => None,
        };
        let stopped_today = parse_rows(&self.db.query(
            "SELECT data FROM press_sessions WHERE scope_id = ?1 AND operator_id = ?2 \
             AND status = 'STOPPED' AND shift_date = ?3 ORDER BY created_at DESC",
            &[
                Value::Text(actor.scope_id.clone()),
                Value::Text(actor.id.clone()),
                Value::Text(self.clock.today()),
            ],
        )?)?;
        let products = self.list_active_products(&actor.scope_id)?;
        Ok(OperatorBoard {
            active,
            stopped_today,
            products,
        })
    }

    /// Stopped sessions of the scope, filtered and paginated. Operators
    /// are pinned to their own history.
    pub fn session_history(
        &self,
        actor: &Actor,
        query: &SessionHistoryQuery,
    ) -> Result<ListResult<PressSession>, PressError> {
        let mut where_clauses = vec![
            "scope_id = ?1".to_string(),
            "status = 'STOPPED'".to_string(),
        ];
        let mut params = vec![Value::Text(actor.scope_id.clone())];
        let mut idx = 2;

        let operator_filter = if actor.role == Role::Operator {
            Some(actor.id.clone())
        } else {
            query.operator_id.clone()
        };
        if let Some(op) = operator_filter {
            where_clauses.push(format!("operator_id = ?{idx}"));
            params.push(Value::Text(op));
            idx += 1;
        }
        if let Some(ref from) = query.from {
            validate_date(from)?;
            where_clauses.push(format!("shift_date >= ?{idx}"));
            params.push(Value::Text(from.clone()));
            idx += 1;
        }
        if let Some(ref to) = query.to {
            validate_date(to)?;
            where_clauses.push(format!("shift_date <= ?{idx}"));
            params.push(Value::Text(to.clone()));
            idx += 1;
        }
        if let Some(ref approval) = query.approval {
            let status = ApprovalStatus::from_str(approval).ok_or_else(|| {
                PressError::Validation(format!("unknown approval status: {approval}"))
            })?;
            where_clauses.push(format!("approval_status = ?{idx}"));
            params.push(Value::Text(status.as_str().to_string()));
            idx += 1;
        }

        let where_sql = where_clauses.join(" AND ");

        let count_rows = self.db.query(
            &format!("SELECT COUNT(*) as cnt FROM press_sessions WHERE {where_sql}"),
            &params,
        )?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let page_size = query
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let page = query.page.unwrap_or(1).max(1);
        let mut select_params = params;
        select_params.push(Value::Integer(page_size as i64));
        select_params.push(Value::Integer(((page - 1) * page_size) as i64));

        let rows = self.db.query(
            &format!(
                "SELECT data FROM press_sessions WHERE {where_sql} \
                 ORDER BY shift_date DESC, created_at DESC LIMIT ?{idx} OFFSET ?{}",
                idx + 1
            ),
            &select_params,
        )?;

        Ok(ListResult {
            items: parse_rows(&rows)?,
            total,
        })
    }
}

/// Close a pause interval inside the enclosing transaction.
fn close_pause_tx(
    tx: &dyn plyworks_sql::SqlTx,
    pause_id: &str,
    now: &str,
) -> Result<(), PressError> {
    let mut pause: PauseEvent = get_doc_tx(tx, "pause_events", pause_id)?;
    if pause.end_time.is_some() {
        return Err(corrupted(format!(
            "pause {pause_id} is referenced as open but already closed"
        )));
    }
    pause.end_time = Some(now.to_string());
    update_doc_tx(tx, "pause_events", &pause.id, &pause, &pause_indexes(&pause))?;
    Ok(())
}
